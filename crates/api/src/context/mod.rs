//! Application context - dependency injection container
//!
//! The authentication strategy is chosen here, once, from the loaded
//! [`AuthConfig`]. Nothing downstream branches on the strategy kind again.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use userdesk_common::{OAuthClient, OAuthClientTrait, OAuthConfig};
use userdesk_core::{
    AuthController, AuthStrategy, DelegatedOAuthStrategy, KeyValueStore, LocalCredentialStrategy,
};
use userdesk_domain::constants::DEFAULT_INTERACTIVE_TIMEOUT_SECS;
use userdesk_domain::{AppConfig, AuthConfig, Result, UserDeskError};
use userdesk_infra::{
    AccessTokenProvider, FileKeyValueStore, OAuthIdentityProvider, SystemBrowserLauncher,
    UsersClient,
};

/// Application context - holds all services and dependencies
pub struct AppContext {
    pub config: AppConfig,
    pub store: Arc<dyn KeyValueStore>,
    pub auth: Arc<AuthController>,
    pub users: Arc<UsersClient>,
}

impl AppContext {
    /// Wire the production adapters for `config`.
    ///
    /// # Errors
    /// Returns `UserDeskError::Config` if the configuration is invalid or the
    /// HTTP client cannot be built.
    pub fn new(config: AppConfig) -> Result<Self> {
        config.validate()?;

        let store: Arc<dyn KeyValueStore> =
            Arc::new(FileKeyValueStore::new(config.storage.path.clone()));
        let strategy = build_strategy(&config.auth, Arc::clone(&store));

        info!(
            strategy = %config.auth.kind(),
            storage = %config.storage.path.display(),
            api = %config.api.users_url(),
            "Application context created"
        );

        Self::with_strategy(config, store, strategy)
    }

    /// Wire a context around an already built strategy and store.
    ///
    /// Used by tests to inject scripted providers; the users client still
    /// targets `config.api`.
    ///
    /// # Errors
    /// Returns `UserDeskError::Config` if the HTTP client cannot be built.
    pub fn with_strategy(
        config: AppConfig,
        store: Arc<dyn KeyValueStore>,
        strategy: Arc<dyn AuthStrategy>,
    ) -> Result<Self> {
        let auth = Arc::new(AuthController::new(strategy));
        let tokens: Arc<dyn AccessTokenProvider> = auth.clone();
        let users = UsersClient::new(&config.api, tokens).map_err(UserDeskError::from)?;

        Ok(Self { config, store, auth, users: Arc::new(users) })
    }
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("strategy", &self.auth.strategy_kind())
            .field("state", &self.auth.state())
            .field("api", &self.config.api.users_url())
            .finish_non_exhaustive()
    }
}

fn build_strategy(auth: &AuthConfig, store: Arc<dyn KeyValueStore>) -> Arc<dyn AuthStrategy> {
    match auth {
        AuthConfig::Local { username, password } => {
            Arc::new(LocalCredentialStrategy::new(store, username.clone(), password.clone()))
        }
        AuthConfig::Delegated { client_id, authority, redirect_uri, scopes, .. } => {
            let oauth = OAuthConfig::new(
                authority.clone(),
                client_id.clone(),
                redirect_uri.clone(),
                scopes.clone(),
            );
            let client: Arc<dyn OAuthClientTrait> = Arc::new(OAuthClient::new(oauth));
            // The provider bounds the redirect wait itself and cleans up the
            // pending authorization when it expires.
            let timeout = auth
                .interactive_timeout()
                .unwrap_or(Duration::from_secs(DEFAULT_INTERACTIVE_TIMEOUT_SECS));
            let provider =
                OAuthIdentityProvider::new(client, store, Arc::new(SystemBrowserLauncher))
                    .with_callback_timeout(timeout);

            Arc::new(
                DelegatedOAuthStrategy::new(Arc::new(provider), scopes.clone())
                    .with_post_logout_redirect_uri(auth.post_logout_redirect_uri()),
            )
        }
    }
}
