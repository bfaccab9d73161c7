//! Local credential strategy
//!
//! Demo-grade: credentials are compared with plain, case-sensitive string
//! equality against a pair that ships in client configuration, with no
//! hashing and no rate limiting. The persisted login marker is trusted on
//! restore without re-checking the password. This is not a security
//! boundary; real deployments need server-side validation.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};
use userdesk_domain::constants::LOCAL_LOGIN_MARKER_KEY;
use userdesk_domain::{AccessToken, AuthError, Credentials, Session, StrategyKind, UserDeskError};

use super::ports::{AuthStrategy, KeyValueStore};

/// Static username/password check with a persisted login marker.
pub struct LocalCredentialStrategy {
    store: Arc<dyn KeyValueStore>,
    username: String,
    password: String,
}

impl LocalCredentialStrategy {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self { store, username: username.into(), password: password.into() }
    }

    fn matches(&self, credentials: &Credentials) -> bool {
        credentials.username == self.username && credentials.password == self.password
    }
}

#[async_trait]
impl AuthStrategy for LocalCredentialStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Local
    }

    async fn restore_session(&self) -> Result<Option<String>, AuthError> {
        let marker = self.store.get(LOCAL_LOGIN_MARKER_KEY).await.map_err(storage_error)?;
        let identity = marker.filter(|username| !username.is_empty());
        debug!(found = identity.is_some(), "checked persisted login marker");
        Ok(identity)
    }

    async fn login(&self, credentials: Option<&Credentials>) -> Result<String, AuthError> {
        let credentials = credentials.ok_or(AuthError::MissingCredentials)?;
        if !self.matches(credentials) {
            info!(username = %credentials.username, "local credentials rejected");
            return Err(AuthError::InvalidCredentials);
        }

        self.store
            .set(LOCAL_LOGIN_MARKER_KEY, &credentials.username)
            .await
            .map_err(storage_error)?;
        Ok(credentials.username.clone())
    }

    async fn logout(&self, _session: &Session) -> Result<(), AuthError> {
        self.store.remove(LOCAL_LOGIN_MARKER_KEY).await.map_err(storage_error)
    }

    async fn acquire_token(
        &self,
        _session: Option<&Session>,
    ) -> Result<Option<AccessToken>, AuthError> {
        Ok(None)
    }
}

fn storage_error(err: UserDeskError) -> AuthError {
    match err {
        UserDeskError::Storage(msg) => AuthError::Storage(msg),
        other => AuthError::Storage(other.to_string()),
    }
}
