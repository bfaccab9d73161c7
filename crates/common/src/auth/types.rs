//! OAuth 2.0 types and structures
//!
//! Token sets, raw token/error responses and endpoint configuration for an
//! OpenID Connect authority.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Scopes requested on every authorization so the provider issues an ID
/// token (account info) and a refresh token (silent acquisition).
pub const OIDC_SCOPES: [&str; 3] = ["openid", "profile", "offline_access"];

/// OAuth 2.0 access and refresh tokens with metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSet {
    /// Bearer token for API calls
    pub access_token: String,

    /// Optional because some grants don't rotate or issue one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// ID token (JWT) with the signed-in account's claims
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,

    /// Token type (always "Bearer" for OAuth 2.0)
    pub token_type: String,

    /// Access token lifetime in seconds at issue time
    pub expires_in: i64,

    /// Absolute expiration timestamp (UTC), computed when the set is built
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,

    /// Granted scopes (space-separated)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl TokenSet {
    /// Create a new `TokenSet`; `expires_at` is derived from `expires_in`.
    #[must_use]
    pub fn new(
        access_token: String,
        refresh_token: Option<String>,
        id_token: Option<String>,
        expires_in: i64,
        scope: Option<String>,
    ) -> Self {
        let expires_at = if expires_in > 0 {
            Some(Utc::now() + chrono::Duration::seconds(expires_in))
        } else {
            None
        };

        Self {
            access_token,
            refresh_token,
            id_token,
            token_type: "Bearer".to_string(),
            expires_in,
            expires_at,
            scope,
        }
    }

    /// `true` if the access token is expired or expires within
    /// `threshold_seconds`. A set without expiry never counts as expired.
    #[must_use]
    pub fn is_expired(&self, threshold_seconds: i64) -> bool {
        self.expires_at.is_some_and(|expires_at| {
            Utc::now() + chrono::Duration::seconds(threshold_seconds) >= expires_at
        })
    }

    /// Seconds until expiry, if an expiry is known.
    #[must_use]
    pub fn seconds_until_expiry(&self) -> Option<i64> {
        self.expires_at.map(|expires_at| (expires_at - Utc::now()).num_seconds())
    }

    /// Merge a refresh response into this set.
    ///
    /// Providers may omit the refresh or ID token on refresh; the previous
    /// values are kept in that case.
    #[must_use]
    pub fn merge_refreshed(self, refreshed: Self) -> Self {
        Self {
            refresh_token: refreshed.refresh_token.or(self.refresh_token),
            id_token: refreshed.id_token.or(self.id_token),
            scope: refreshed.scope.or(self.scope),
            ..refreshed
        }
    }
}

/// Raw token endpoint response (RFC 6749 §5.1)
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub id_token: Option<String>,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: i64,
    pub scope: Option<String>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl From<TokenResponse> for TokenSet {
    fn from(response: TokenResponse) -> Self {
        let mut set = Self::new(
            response.access_token,
            response.refresh_token,
            response.id_token,
            response.expires_in,
            response.scope,
        );
        set.token_type = response.token_type;
        set
    }
}

/// Endpoints and client registration for an OpenID Connect authority.
///
/// Endpoint paths default to the Microsoft identity platform v2 layout under
/// `authority` (`/oauth2/v2.0/{authorize,token,logout}`); each can be
/// overridden for other providers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthConfig {
    /// Authority base URL, e.g. `https://login.microsoftonline.com/common`
    pub authority: String,

    /// Application (client) ID
    pub client_id: String,

    /// Registered redirect URI (loopback for desktop apps)
    pub redirect_uri: String,

    /// Resource scopes; OIDC scopes are added automatically
    pub scopes: Vec<String>,

    authorization_endpoint: Option<String>,
    token_endpoint: Option<String>,
    end_session_endpoint: Option<String>,
}

impl OAuthConfig {
    #[must_use]
    pub fn new(
        authority: impl Into<String>,
        client_id: impl Into<String>,
        redirect_uri: impl Into<String>,
        scopes: Vec<String>,
    ) -> Self {
        Self {
            authority: authority.into().trim_end_matches('/').to_string(),
            client_id: client_id.into(),
            redirect_uri: redirect_uri.into(),
            scopes,
            authorization_endpoint: None,
            token_endpoint: None,
            end_session_endpoint: None,
        }
    }

    pub fn set_authorization_endpoint(&mut self, endpoint: impl Into<String>) {
        self.authorization_endpoint = Some(endpoint.into());
    }

    pub fn set_token_endpoint(&mut self, endpoint: impl Into<String>) {
        self.token_endpoint = Some(endpoint.into());
    }

    pub fn set_end_session_endpoint(&mut self, endpoint: impl Into<String>) {
        self.end_session_endpoint = Some(endpoint.into());
    }

    #[must_use]
    pub fn authorization_url(&self) -> String {
        self.authorization_endpoint
            .clone()
            .unwrap_or_else(|| format!("{}/oauth2/v2.0/authorize", self.authority))
    }

    #[must_use]
    pub fn token_url(&self) -> String {
        self.token_endpoint
            .clone()
            .unwrap_or_else(|| format!("{}/oauth2/v2.0/token", self.authority))
    }

    #[must_use]
    pub fn end_session_url(&self) -> String {
        self.end_session_endpoint
            .clone()
            .unwrap_or_else(|| format!("{}/oauth2/v2.0/logout", self.authority))
    }

    /// Space-separated scope parameter: OIDC scopes followed by `scopes`,
    /// without duplicates.
    #[must_use]
    pub fn scope_string(scopes: &[String]) -> String {
        let mut merged: Vec<&str> = OIDC_SCOPES.to_vec();
        for scope in scopes.iter().map(String::as_str) {
            if !scope.is_empty() && !merged.contains(&scope) {
                merged.push(scope);
            }
        }
        merged.join(" ")
    }
}

/// OAuth 2.0 error response (RFC 6749 §5.2)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OAuthError {
    pub error: String,
    pub error_description: Option<String>,
}

impl fmt::Display for OAuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error_description {
            Some(desc) => write!(f, "{}: {}", self.error, desc),
            None => write!(f, "{}", self.error),
        }
    }
}

impl std::error::Error for OAuthError {}
