//! OAuth 2.0 client implementation with PKCE support
//!
//! Handles the browser-based authorization-code flow:
//! - authorization URL building (PKCE S256 + state)
//! - authorization code exchange
//! - refresh-token grant
//! - end-session (logout) URL building

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use super::pkce::{validate_state, PKCEChallenge};
use super::traits::OAuthClientTrait;
use super::types::{OAuthConfig, OAuthError, TokenResponse, TokenSet};

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Error type for OAuth client operations
#[derive(Debug, Error)]
pub enum OAuthClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// OAuth server returned an error response
    #[error("OAuth error: {0}")]
    OAuthError(OAuthError),

    /// State parameter mismatch (CSRF attack detected)
    #[error("State mismatch (CSRF): expected {expected}, received {received}")]
    StateMismatch { expected: String, received: String },

    /// Failed to parse a response or token
    #[error("Parse error: {0}")]
    ParseError(String),

    /// No refresh token available
    #[error("No refresh token available")]
    NoRefreshToken,

    /// Invalid configuration or call order
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl OAuthClientError {
    /// RFC 6749 `error` code when the server answered with an error body.
    #[must_use]
    pub fn oauth_error_code(&self) -> Option<&str> {
        match self {
            Self::OAuthError(err) => Some(err.error.as_str()),
            _ => None,
        }
    }
}

/// Authorization started by [`OAuthClient::generate_authorization_url`] and
/// awaiting its redirect.
#[derive(Debug, Clone)]
struct PendingAuthorization {
    challenge: PKCEChallenge,
    redirect_uri: String,
}

/// OAuth 2.0 public client with PKCE support (RFC 6749 + RFC 7636).
#[derive(Debug, Clone)]
pub struct OAuthClient {
    config: OAuthConfig,
    client: Client,
    pending: Arc<Mutex<Option<PendingAuthorization>>>,
}

impl OAuthClient {
    #[must_use]
    pub fn new(config: OAuthConfig) -> Self {
        let client =
            Client::builder().timeout(HTTP_TIMEOUT).build().unwrap_or_else(|_| Client::new());
        Self::with_http_client(config, client)
    }

    /// Use a preconfigured `reqwest::Client` (proxy, TLS roots, timeouts).
    #[must_use]
    pub fn with_http_client(config: OAuthConfig, client: Client) -> Self {
        Self { config, client, pending: Arc::new(Mutex::new(None)) }
    }

    /// Build the authorization URL for a new interactive flow.
    ///
    /// `redirect_uri` is the URI the loopback listener actually bound, which
    /// may differ from the configured one in its port. `prompt` is forwarded
    /// verbatim (`select_account`, `login`, ...). A previous pending flow is
    /// discarded.
    ///
    /// # Returns
    /// Tuple of (authorization_url, state)
    ///
    /// # Errors
    /// Returns `ConfigError` if the redirect URI is empty.
    pub async fn generate_authorization_url(
        &self,
        scopes: &[String],
        redirect_uri: &str,
        prompt: Option<&str>,
    ) -> Result<(String, String), OAuthClientError> {
        if redirect_uri.is_empty() {
            return Err(OAuthClientError::ConfigError("redirect URI is empty".to_string()));
        }

        let challenge = PKCEChallenge::generate();
        let state = challenge.state.clone();

        let mut params = vec![
            ("response_type", "code".to_string()),
            ("client_id", self.config.client_id.clone()),
            ("redirect_uri", redirect_uri.to_string()),
            ("response_mode", "query".to_string()),
            ("scope", OAuthConfig::scope_string(scopes)),
            ("state", state.clone()),
            ("code_challenge", challenge.code_challenge.clone()),
            ("code_challenge_method", challenge.challenge_method().to_string()),
        ];
        if let Some(prompt) = prompt {
            params.push(("prompt", prompt.to_string()));
        }

        *self.pending.lock().await =
            Some(PendingAuthorization { challenge, redirect_uri: redirect_uri.to_string() });

        let url = format!("{}?{}", self.config.authorization_url(), encode_query(&params));
        debug!(endpoint = %self.config.authorization_url(), "authorization URL generated");
        Ok((url, state))
    }

    /// Exchange the authorization code delivered to the redirect URI.
    ///
    /// Consumes the pending flow; a second call without a new authorization
    /// URL fails.
    ///
    /// # Errors
    /// Returns error if:
    /// - No flow is pending
    /// - State mismatch (CSRF)
    /// - The token endpoint rejects the code or answers garbage
    #[instrument(skip(self, code, state))]
    pub async fn exchange_code_for_tokens(
        &self,
        code: &str,
        state: &str,
    ) -> Result<TokenSet, OAuthClientError> {
        let pending = self.pending.lock().await.take().ok_or_else(|| {
            OAuthClientError::ConfigError("No pending authorization found".to_string())
        })?;

        if !validate_state(&pending.challenge.state, state) {
            return Err(OAuthClientError::StateMismatch {
                expected: pending.challenge.state,
                received: state.to_string(),
            });
        }

        let form = vec![
            ("grant_type", "authorization_code".to_string()),
            ("client_id", self.config.client_id.clone()),
            ("code", code.to_string()),
            ("redirect_uri", pending.redirect_uri),
            ("code_verifier", pending.challenge.code_verifier),
        ];

        self.token_request(&form).await
    }

    /// Obtain a new access token without user interaction.
    ///
    /// # Errors
    /// Returns `NoRefreshToken` for an empty token, `OAuthError` when the
    /// provider rejects the grant (e.g. `invalid_grant`), or transport and
    /// parse errors.
    #[instrument(skip(self, refresh_token))]
    pub async fn refresh_access_token(
        &self,
        refresh_token: &str,
        scopes: &[String],
    ) -> Result<TokenSet, OAuthClientError> {
        if refresh_token.is_empty() {
            return Err(OAuthClientError::NoRefreshToken);
        }

        let form = vec![
            ("grant_type", "refresh_token".to_string()),
            ("client_id", self.config.client_id.clone()),
            ("refresh_token", refresh_token.to_string()),
            ("scope", OAuthConfig::scope_string(scopes)),
        ];

        self.token_request(&form).await
    }

    /// Provider sign-out URL that returns the browser to
    /// `post_logout_redirect_uri`.
    #[must_use]
    pub fn end_session_url(
        &self,
        post_logout_redirect_uri: Option<&str>,
        logout_hint: Option<&str>,
    ) -> String {
        let mut params = vec![("client_id", self.config.client_id.clone())];
        if let Some(uri) = post_logout_redirect_uri {
            params.push(("post_logout_redirect_uri", uri.to_string()));
        }
        if let Some(hint) = logout_hint {
            params.push(("logout_hint", hint.to_string()));
        }
        format!("{}?{}", self.config.end_session_url(), encode_query(&params))
    }

    /// Forget a pending flow (popup closed, timed out).
    pub async fn cancel_pending(&self) {
        self.pending.lock().await.take();
    }

    #[must_use]
    pub fn redirect_uri(&self) -> &str {
        &self.config.redirect_uri
    }

    #[must_use]
    pub const fn config(&self) -> &OAuthConfig {
        &self.config
    }

    async fn token_request(
        &self,
        form: &[(&str, String)],
    ) -> Result<TokenSet, OAuthClientError> {
        let response = self.client.post(self.config.token_url()).form(form).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await?;
            let error: OAuthError = serde_json::from_str(&body).map_err(|_| {
                OAuthClientError::ParseError(format!("token endpoint returned {status}: {body}"))
            })?;
            debug!(status = %status, error = %error.error, "token endpoint rejected request");
            return Err(OAuthClientError::OAuthError(error));
        }

        let token_response: TokenResponse =
            response.json().await.map_err(|e| OAuthClientError::ParseError(e.to_string()))?;

        Ok(token_response.into())
    }
}

fn encode_query(params: &[(&str, String)]) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

#[async_trait]
impl OAuthClientTrait for OAuthClient {
    async fn generate_authorization_url(
        &self,
        scopes: &[String],
        redirect_uri: &str,
        prompt: Option<&str>,
    ) -> Result<(String, String), OAuthClientError> {
        self.generate_authorization_url(scopes, redirect_uri, prompt).await
    }

    async fn exchange_code_for_tokens(
        &self,
        code: &str,
        state: &str,
    ) -> Result<TokenSet, OAuthClientError> {
        self.exchange_code_for_tokens(code, state).await
    }

    async fn refresh_access_token(
        &self,
        refresh_token: &str,
        scopes: &[String],
    ) -> Result<TokenSet, OAuthClientError> {
        self.refresh_access_token(refresh_token, scopes).await
    }

    fn end_session_url(
        &self,
        post_logout_redirect_uri: Option<&str>,
        logout_hint: Option<&str>,
    ) -> String {
        self.end_session_url(post_logout_redirect_uri, logout_hint)
    }

    async fn cancel_pending(&self) {
        self.cancel_pending().await;
    }

    fn redirect_uri(&self) -> &str {
        self.redirect_uri()
    }
}
