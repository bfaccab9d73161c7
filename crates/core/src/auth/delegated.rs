//! Delegated OAuth strategy
//!
//! Wraps an [`IdentityProvider`] and is the only holder of the provider
//! account backing the current session.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{debug, info, warn};
use userdesk_domain::{
    AccessToken, AuthError, Credentials, ProviderAccount, ProviderError, Session, StrategyKind,
};

use super::ports::{AuthStrategy, IdentityProvider};

/// Popup-based sign-in against an external identity provider.
pub struct DelegatedOAuthStrategy {
    provider: Arc<dyn IdentityProvider>,
    scopes: Vec<String>,
    post_logout_redirect_uri: Option<String>,
    interactive_timeout: Option<Duration>,
    account: RwLock<Option<ProviderAccount>>,
}

impl DelegatedOAuthStrategy {
    pub fn new(provider: Arc<dyn IdentityProvider>, scopes: Vec<String>) -> Self {
        Self {
            provider,
            scopes,
            post_logout_redirect_uri: None,
            interactive_timeout: None,
            account: RwLock::new(None),
        }
    }

    /// Where the provider returns the window after sign-out.
    #[must_use]
    pub fn with_post_logout_redirect_uri(mut self, uri: Option<String>) -> Self {
        self.post_logout_redirect_uri = uri;
        self
    }

    /// Bound every interactive window; unbounded when `None`.
    #[must_use]
    pub const fn with_interactive_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.interactive_timeout = timeout;
        self
    }

    /// Account behind the current session.
    pub fn account(&self) -> Option<ProviderAccount> {
        self.account.read().clone()
    }

    fn is_active(&self, account: &ProviderAccount) -> bool {
        self.account
            .read()
            .as_ref()
            .is_some_and(|active| active.home_account_id == account.home_account_id)
    }

    async fn interactive<T, F>(&self, flow: F) -> Result<T, ProviderError>
    where
        F: Future<Output = Result<T, ProviderError>> + Send,
    {
        match self.interactive_timeout {
            Some(limit) => tokio::time::timeout(limit, flow).await.unwrap_or_else(|_| {
                Err(ProviderError::Failure(format!(
                    "timed out after {}s waiting for the sign-in window",
                    limit.as_secs()
                )))
            }),
            None => flow.await,
        }
    }
}

#[async_trait]
impl AuthStrategy for DelegatedOAuthStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Delegated
    }

    async fn restore_session(&self) -> Result<Option<String>, AuthError> {
        self.provider.initialize().await?;
        let accounts = self.provider.accounts().await?;
        debug!(count = accounts.len(), "provider accounts enumerated");

        let Some(account) = accounts.into_iter().next() else {
            return Ok(None);
        };
        let identity = account.display_name().to_string();
        *self.account.write() = Some(account);
        Ok(Some(identity))
    }

    async fn login(&self, _credentials: Option<&Credentials>) -> Result<String, AuthError> {
        let account = self.interactive(self.provider.login_interactive(&self.scopes)).await?;
        let identity = account.display_name().to_string();
        info!(account = %account.username, "interactive sign-in completed");
        *self.account.write() = Some(account);
        Ok(identity)
    }

    async fn logout(&self, _session: &Session) -> Result<(), AuthError> {
        let Some(account) = self.account.write().take() else {
            debug!("no provider account to sign out");
            return Ok(());
        };

        let redirect = self.post_logout_redirect_uri.as_deref();
        self.interactive(self.provider.logout_interactive(&account, redirect))
            .await
            .map_err(AuthError::from)
    }

    async fn acquire_token(
        &self,
        session: Option<&Session>,
    ) -> Result<Option<AccessToken>, AuthError> {
        if session.is_none() {
            return Err(AuthError::NoSession);
        }
        let account = self.account().ok_or(AuthError::NoSession)?;

        match self.provider.acquire_token_silent(&self.scopes, &account).await {
            Ok(token) => Ok(Some(token)),
            Err(err) if err.is_interaction_required() => {
                info!(reason = %err, "silent acquisition needs interaction; opening window once");
                let result =
                    self.interactive(self.provider.acquire_token_interactive(&self.scopes)).await;

                // A logout may have ended the session while the window was open.
                if !self.is_active(&account) {
                    warn!(
                        account = %account.username,
                        "session ended during interactive token request"
                    );
                    return Err(AuthError::NoSession);
                }
                Ok(Some(result?))
            }
            Err(err) => {
                warn!(error = %err, "silent token acquisition failed");
                Err(err.into())
            }
        }
    }
}
