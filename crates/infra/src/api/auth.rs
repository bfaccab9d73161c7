//! Bearer tokens for the users API
//!
//! The REST client only needs "a token, if there is one". With the local
//! strategy there never is one and requests go out without an
//! `Authorization` header.

use async_trait::async_trait;
use userdesk_core::AuthController;

use super::errors::ApiError;

/// Trait for providing access tokens
///
/// Allows injecting the auth controller in production and fixed tokens in
/// tests.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    /// Current access token, or `None` when the session has no token.
    async fn access_token(&self) -> Result<Option<String>, ApiError>;
}

#[async_trait]
impl AccessTokenProvider for AuthController {
    async fn access_token(&self) -> Result<Option<String>, ApiError> {
        let token = self.get_access_token().await.map_err(|err| ApiError::Auth(err.user_message()))?;
        Ok(token.map(|token| token.secret().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use userdesk_core::testing::{MemoryKeyValueStore, MockIdentityProvider};
    use userdesk_core::{DelegatedOAuthStrategy, LocalCredentialStrategy};

    use super::*;

    #[tokio::test]
    async fn test_local_session_has_no_token() {
        let store = Arc::new(MemoryKeyValueStore::new());
        let controller =
            AuthController::new(Arc::new(LocalCredentialStrategy::new(store, "admin", "admin")));
        controller.initialize().await.unwrap();

        assert_eq!(controller.access_token().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delegated_token_and_missing_session() {
        let provider = Arc::new(MockIdentityProvider::new());
        let controller = AuthController::new(Arc::new(DelegatedOAuthStrategy::new(
            provider,
            vec!["User.Read".into()],
        )));
        controller.initialize().await.unwrap();

        let err = controller.access_token().await.unwrap_err();
        assert!(matches!(err, ApiError::Auth(ref msg) if msg == "No user is signed in."));

        controller.login(None).await.unwrap();
        assert_eq!(controller.access_token().await.unwrap().as_deref(), Some("silent-token"));
    }
}
