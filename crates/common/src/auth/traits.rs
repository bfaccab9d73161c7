//! Trait seam for OAuth client operations
//!
//! Lets the identity-provider adapter be driven by a mock in tests instead
//! of a live authorization server.

use async_trait::async_trait;

use super::client::OAuthClientError;
use super::types::TokenSet;

/// OAuth client operations used by the delegated sign-in adapter.
#[async_trait]
pub trait OAuthClientTrait: Send + Sync {
    /// Start an interactive flow.
    ///
    /// # Returns
    /// Tuple of (authorization_url, state)
    ///
    /// # Errors
    /// Returns error if the request cannot be built.
    async fn generate_authorization_url(
        &self,
        scopes: &[String],
        redirect_uri: &str,
        prompt: Option<&str>,
    ) -> Result<(String, String), OAuthClientError>;

    /// Exchange the authorization code of the pending flow.
    ///
    /// # Errors
    /// Returns error on state mismatch or when the token endpoint fails.
    async fn exchange_code_for_tokens(
        &self,
        code: &str,
        state: &str,
    ) -> Result<TokenSet, OAuthClientError>;

    /// Refresh-token grant.
    ///
    /// # Errors
    /// Returns error if the grant is rejected or the request fails.
    async fn refresh_access_token(
        &self,
        refresh_token: &str,
        scopes: &[String],
    ) -> Result<TokenSet, OAuthClientError>;

    /// Provider sign-out URL.
    fn end_session_url(
        &self,
        post_logout_redirect_uri: Option<&str>,
        logout_hint: Option<&str>,
    ) -> String;

    /// Drop the pending flow, if any.
    async fn cancel_pending(&self);

    /// Configured redirect URI.
    fn redirect_uri(&self) -> &str;
}
