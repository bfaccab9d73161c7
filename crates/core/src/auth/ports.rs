//! Port interfaces for authentication
//!
//! These traits define the boundaries between the auth state machine and the
//! infrastructure it drives: a strategy capability set, the external
//! identity-provider client and durable key-value storage.

use async_trait::async_trait;
use userdesk_domain::{
    AccessToken, AuthError, Credentials, ProviderAccount, ProviderError, Result, Session,
    StrategyKind,
};

/// Capability set every authentication strategy provides.
///
/// Only the [`AuthController`](super::controller::AuthController) calls these.
#[async_trait]
pub trait AuthStrategy: Send + Sync {
    /// Which variant this is; fixed for the strategy's lifetime.
    fn kind(&self) -> StrategyKind;

    /// Look for a prior session without prompting the user.
    ///
    /// Returns the identity to restore, or `None` when the user must sign in.
    async fn restore_session(&self) -> std::result::Result<Option<String>, AuthError>;

    /// Authenticate and return the identity to display.
    async fn login(
        &self,
        credentials: Option<&Credentials>,
    ) -> std::result::Result<String, AuthError>;

    /// End the session with whatever the strategy talks to.
    async fn logout(&self, session: &Session) -> std::result::Result<(), AuthError>;

    /// Bearer token for the backend, or `None` when the backend needs none.
    async fn acquire_token(
        &self,
        session: Option<&Session>,
    ) -> std::result::Result<Option<AccessToken>, AuthError>;
}

/// External identity-provider client (popup-based OAuth).
///
/// Interactive calls may wait on a human indefinitely.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Prepare the client (load caches, discover endpoints).
    async fn initialize(&self) -> std::result::Result<(), ProviderError>;

    /// Accounts the provider already has a session for.
    async fn accounts(&self) -> std::result::Result<Vec<ProviderAccount>, ProviderError>;

    /// Interactive sign-in requesting `scopes`.
    async fn login_interactive(
        &self,
        scopes: &[String],
    ) -> std::result::Result<ProviderAccount, ProviderError>;

    /// Token without user interaction.
    ///
    /// Fails with [`ProviderError::InteractionRequired`] when the provider
    /// needs the user.
    async fn acquire_token_silent(
        &self,
        scopes: &[String],
        account: &ProviderAccount,
    ) -> std::result::Result<AccessToken, ProviderError>;

    /// Token through an interactive window.
    async fn acquire_token_interactive(
        &self,
        scopes: &[String],
    ) -> std::result::Result<AccessToken, ProviderError>;

    /// Interactive sign-out of `account`, returning the window to
    /// `post_logout_redirect_uri`.
    async fn logout_interactive(
        &self,
        account: &ProviderAccount,
        post_logout_redirect_uri: Option<&str>,
    ) -> std::result::Result<(), ProviderError>;
}

/// Durable client-side key-value storage.
///
/// Errors are reported as `UserDeskError::Storage`.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Value stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`; removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;
}
