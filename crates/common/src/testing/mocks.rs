//! Mock OAuth client that simulates flows without network calls.

use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use parking_lot::Mutex;

use crate::auth::{OAuthClientError, OAuthClientTrait, OAuthError, TokenSet};

/// Unsigned JWT carrying the given account claims.
#[must_use]
pub fn id_token_for(oid: &str, username: &str, name: Option<&str>) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
    let mut claims = serde_json::json!({ "oid": oid, "preferred_username": username });
    if let Some(name) = name {
        claims["name"] = serde_json::Value::String(name.to_string());
    }
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.")
}

#[derive(Debug, Default)]
struct MockState {
    exchange_response: Option<TokenSet>,
    refresh_response: Option<TokenSet>,
    refresh_error: Option<String>,
    pending_state: Option<String>,
    authorize_calls: usize,
    exchange_calls: usize,
    refresh_calls: usize,
    cancel_calls: usize,
}

/// Scriptable [`OAuthClientTrait`] implementation.
///
/// Authorization URLs point at `https://mock.idp/authorize` and carry the
/// redirect URI and a fresh `state`, so a test launcher can answer them.
#[derive(Clone, Debug)]
pub struct MockOAuthClient {
    state: Arc<Mutex<MockState>>,
    redirect_uri: String,
}

impl Default for MockOAuthClient {
    fn default() -> Self {
        Self { state: Arc::default(), redirect_uri: "http://localhost:3000".to_string() }
    }
}

impl MockOAuthClient {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Report `uri` as the configured redirect URI, e.g. an ephemeral
    /// loopback address such as `http://127.0.0.1:0/callback`.
    #[must_use]
    pub fn with_redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.redirect_uri = uri.into();
        self
    }

    /// Tokens returned by the next code exchanges.
    pub fn set_exchange_response(&self, tokens: TokenSet) {
        self.state.lock().exchange_response = Some(tokens);
    }

    /// Tokens returned by refresh calls.
    pub fn set_refresh_response(&self, tokens: TokenSet) {
        let mut state = self.state.lock();
        state.refresh_response = Some(tokens);
        state.refresh_error = None;
    }

    /// Make refresh calls fail with the given RFC 6749 error code.
    pub fn set_refresh_error(&self, code: impl Into<String>) {
        self.state.lock().refresh_error = Some(code.into());
    }

    #[must_use]
    pub fn authorize_calls(&self) -> usize {
        self.state.lock().authorize_calls
    }

    #[must_use]
    pub fn exchange_calls(&self) -> usize {
        self.state.lock().exchange_calls
    }

    #[must_use]
    pub fn refresh_calls(&self) -> usize {
        self.state.lock().refresh_calls
    }

    #[must_use]
    pub fn cancel_calls(&self) -> usize {
        self.state.lock().cancel_calls
    }
}

#[async_trait]
impl OAuthClientTrait for MockOAuthClient {
    async fn generate_authorization_url(
        &self,
        _scopes: &[String],
        redirect_uri: &str,
        _prompt: Option<&str>,
    ) -> Result<(String, String), OAuthClientError> {
        let mut state = self.state.lock();
        state.authorize_calls += 1;
        let csrf = format!("mock_state_{}", state.authorize_calls);
        state.pending_state = Some(csrf.clone());
        let url = format!(
            "https://mock.idp/authorize?redirect_uri={}&state={csrf}",
            urlencoding::encode(redirect_uri)
        );
        Ok((url, csrf))
    }

    async fn exchange_code_for_tokens(
        &self,
        _code: &str,
        state: &str,
    ) -> Result<TokenSet, OAuthClientError> {
        let mut guard = self.state.lock();
        guard.exchange_calls += 1;
        let expected = guard.pending_state.take().unwrap_or_default();
        if expected != state {
            return Err(OAuthClientError::StateMismatch { expected, received: state.to_string() });
        }
        Ok(guard.exchange_response.clone().unwrap_or_else(|| {
            TokenSet::new(
                "mock_access_token".to_string(),
                Some("mock_refresh_token".to_string()),
                Some(id_token_for("mock-oid", "mock.user@example.com", Some("Mock User"))),
                3600,
                None,
            )
        }))
    }

    async fn refresh_access_token(
        &self,
        refresh_token: &str,
        _scopes: &[String],
    ) -> Result<TokenSet, OAuthClientError> {
        let mut state = self.state.lock();
        state.refresh_calls += 1;
        if refresh_token.is_empty() {
            return Err(OAuthClientError::NoRefreshToken);
        }
        if let Some(code) = state.refresh_error.clone() {
            return Err(OAuthClientError::OAuthError(OAuthError {
                error: code,
                error_description: None,
            }));
        }
        Ok(state.refresh_response.clone().unwrap_or_else(|| {
            TokenSet::new(
                "refreshed_access_token".to_string(),
                Some("refreshed_refresh_token".to_string()),
                None,
                3600,
                None,
            )
        }))
    }

    fn end_session_url(
        &self,
        post_logout_redirect_uri: Option<&str>,
        _logout_hint: Option<&str>,
    ) -> String {
        format!(
            "https://mock.idp/logout?post_logout_redirect_uri={}",
            urlencoding::encode(post_logout_redirect_uri.unwrap_or_default())
        )
    }

    async fn cancel_pending(&self) {
        let mut state = self.state.lock();
        state.cancel_calls += 1;
        state.pending_state = None;
    }

    fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }
}
