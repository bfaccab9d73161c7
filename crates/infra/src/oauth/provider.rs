//! Browser-based identity provider
//!
//! Implements the core [`IdentityProvider`] port for a desktop process:
//!
//! - Interactive flows run the authorization-code + PKCE flow in the system
//!   browser and catch the redirect on a loopback listener.
//! - Accounts and their tokens are cached through the [`KeyValueStore`] under
//!   one key, so a restart can restore the session without a window.
//! - Silent acquisition serves the cached access token until it is within
//!   five minutes of expiry, then uses the refresh token. Anything that
//!   needs the user again is reported as `InteractionRequired`.
//! - A window the user closes never calls back, so the wait for the redirect
//!   is always bounded and expiry resolves as a failure.
//! - A token window still open when the account signs out is not cached.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use userdesk_common::auth::{decode_id_token_claims, OAuthClientError, OAuthClientTrait, TokenSet};
use userdesk_core::{IdentityProvider, KeyValueStore};
use userdesk_domain::constants::{
    DEFAULT_INTERACTIVE_TIMEOUT_SECS, OAUTH_ACCOUNT_CACHE_KEY, TOKEN_REFRESH_THRESHOLD_SECS,
};
use userdesk_domain::{AccessToken, ProviderAccount, ProviderError};

use super::callback_server::{CallbackOutcome, OAuthCallbackServer};
use super::launcher::PopupLauncher;

/// Provider error codes that a new interactive sign-in can resolve.
const INTERACTION_ERROR_CODES: [&str; 4] =
    ["invalid_grant", "interaction_required", "login_required", "consent_required"];

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedAccount {
    account: ProviderAccount,
    tokens: TokenSet,
}

impl CachedAccount {
    fn access_token(&self) -> AccessToken {
        AccessToken::new(self.tokens.access_token.clone(), self.tokens.expires_at)
    }
}

/// [`IdentityProvider`] backed by an OAuth client, a popup launcher and a
/// key-value token cache.
pub struct OAuthIdentityProvider {
    client: Arc<dyn OAuthClientTrait>,
    store: Arc<dyn KeyValueStore>,
    launcher: Arc<dyn PopupLauncher>,
    callback_timeout: Duration,
    /// Bumped by every sign-out.
    sign_outs: AtomicU64,
}

impl OAuthIdentityProvider {
    pub fn new(
        client: Arc<dyn OAuthClientTrait>,
        store: Arc<dyn KeyValueStore>,
        launcher: Arc<dyn PopupLauncher>,
    ) -> Self {
        Self {
            client,
            store,
            launcher,
            callback_timeout: Duration::from_secs(DEFAULT_INTERACTIVE_TIMEOUT_SECS),
            sign_outs: AtomicU64::new(0),
        }
    }

    /// How long a sign-in window may stay open before the flow fails.
    #[must_use]
    pub const fn with_callback_timeout(mut self, timeout: Duration) -> Self {
        self.callback_timeout = timeout;
        self
    }

    async fn load_cache(&self) -> Result<Vec<CachedAccount>, ProviderError> {
        let raw = self
            .store
            .get(OAUTH_ACCOUNT_CACHE_KEY)
            .await
            .map_err(|err| ProviderError::Failure(format!("token cache unavailable: {err}")))?;

        let Some(raw) = raw else {
            return Ok(Vec::new());
        };
        match serde_json::from_str(&raw) {
            Ok(entries) => Ok(entries),
            Err(err) => {
                // Unreadable cache is equivalent to a signed-out provider.
                warn!(error = %err, "discarding unreadable token cache");
                Ok(Vec::new())
            }
        }
    }

    async fn save_cache(&self, entries: &[CachedAccount]) -> Result<(), ProviderError> {
        let result = if entries.is_empty() {
            self.store.remove(OAUTH_ACCOUNT_CACHE_KEY).await
        } else {
            let json = serde_json::to_string(entries).map_err(|err| {
                ProviderError::Failure(format!("failed to encode token cache: {err}"))
            })?;
            self.store.set(OAUTH_ACCOUNT_CACHE_KEY, &json).await
        };
        result.map_err(|err| ProviderError::Failure(format!("failed to persist token cache: {err}")))
    }

    async fn upsert(&self, entry: CachedAccount) -> Result<(), ProviderError> {
        let mut entries = self.load_cache().await?;
        entries.retain(|known| known.account.home_account_id != entry.account.home_account_id);
        entries.insert(0, entry);
        self.save_cache(&entries).await
    }

    /// Browser round trip: authorize, wait for the redirect, redeem the code.
    /// The caller decides whether the result is cached.
    async fn run_interactive(
        &self,
        scopes: &[String],
        prompt: Option<&str>,
    ) -> Result<CachedAccount, ProviderError> {
        let mut server = OAuthCallbackServer::start(self.client.redirect_uri()).await?;
        let (url, _state) = self
            .client
            .generate_authorization_url(scopes, server.redirect_uri(), prompt)
            .await
            .map_err(map_client_error)?;

        if let Err(err) = self.launcher.open(&url) {
            self.client.cancel_pending().await;
            return Err(err);
        }

        let outcome = match tokio::time::timeout(self.callback_timeout, server.wait()).await {
            Ok(outcome) => outcome,
            Err(_) => Err(ProviderError::Failure(format!(
                "sign-in window closed or abandoned: no redirect within {}s",
                self.callback_timeout.as_secs()
            ))),
        };
        server.shutdown().await;

        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(error = %err, "interactive flow ended without a redirect");
                self.client.cancel_pending().await;
                return Err(err);
            }
        };

        let tokens = match outcome {
            CallbackOutcome::Authorized { code, state } => self
                .client
                .exchange_code_for_tokens(&code, &state)
                .await
                .map_err(map_client_error)?,
            CallbackOutcome::Denied => {
                self.client.cancel_pending().await;
                return Err(ProviderError::Cancelled);
            }
            CallbackOutcome::Failed(detail) => {
                self.client.cancel_pending().await;
                return Err(ProviderError::Failure(detail));
            }
        };

        Ok(CachedAccount { account: account_from_tokens(&tokens)?, tokens })
    }
}

#[async_trait]
impl IdentityProvider for OAuthIdentityProvider {
    async fn initialize(&self) -> Result<(), ProviderError> {
        let entries = self.load_cache().await?;
        debug!(accounts = entries.len(), "token cache loaded");
        Ok(())
    }

    async fn accounts(&self) -> Result<Vec<ProviderAccount>, ProviderError> {
        Ok(self.load_cache().await?.into_iter().map(|entry| entry.account).collect())
    }

    #[instrument(skip(self, scopes))]
    async fn login_interactive(&self, scopes: &[String]) -> Result<ProviderAccount, ProviderError> {
        let entry = self.run_interactive(scopes, Some("select_account")).await?;
        self.upsert(entry.clone()).await?;
        info!(account = %entry.account.username, "interactive sign-in completed");
        Ok(entry.account)
    }

    #[instrument(skip(self, scopes, account), fields(account = %account.username))]
    async fn acquire_token_silent(
        &self,
        scopes: &[String],
        account: &ProviderAccount,
    ) -> Result<AccessToken, ProviderError> {
        let entries = self.load_cache().await?;
        let entry = entries
            .into_iter()
            .find(|entry| entry.account.home_account_id == account.home_account_id)
            .ok_or_else(|| {
                ProviderError::InteractionRequired(format!(
                    "no cached tokens for {}",
                    account.username
                ))
            })?;

        if !entry.tokens.is_expired(TOKEN_REFRESH_THRESHOLD_SECS) {
            debug!("serving cached access token");
            return Ok(entry.access_token());
        }

        let refresh_token = entry.tokens.refresh_token.clone().ok_or_else(|| {
            ProviderError::InteractionRequired("access token expired and no refresh token".into())
        })?;

        let refreshed = self
            .client
            .refresh_access_token(&refresh_token, scopes)
            .await
            .map_err(map_client_error)?;

        let entry = CachedAccount {
            account: entry.account,
            tokens: entry.tokens.merge_refreshed(refreshed),
        };
        self.upsert(entry.clone()).await?;
        info!("access token refreshed");
        Ok(entry.access_token())
    }

    #[instrument(skip(self, scopes))]
    async fn acquire_token_interactive(
        &self,
        scopes: &[String],
    ) -> Result<AccessToken, ProviderError> {
        let sign_outs = self.sign_outs.load(Ordering::SeqCst);
        let entry = self.run_interactive(scopes, None).await?;
        if self.sign_outs.load(Ordering::SeqCst) != sign_outs {
            warn!(
                account = %entry.account.username,
                "discarding token from a window that outlived sign-out"
            );
            return Err(ProviderError::Failure(
                "signed out while the sign-in window was open".to_string(),
            ));
        }
        self.upsert(entry.clone()).await?;
        Ok(entry.access_token())
    }

    #[instrument(skip(self, account), fields(account = %account.username))]
    async fn logout_interactive(
        &self,
        account: &ProviderAccount,
        post_logout_redirect_uri: Option<&str>,
    ) -> Result<(), ProviderError> {
        self.sign_outs.fetch_add(1, Ordering::SeqCst);
        let mut entries = self.load_cache().await?;
        entries.retain(|entry| entry.account.home_account_id != account.home_account_id);
        self.save_cache(&entries).await?;

        let url = self.client.end_session_url(post_logout_redirect_uri, Some(&account.username));
        self.launcher.open(&url)?;
        info!("provider sign-out opened");
        Ok(())
    }
}

fn account_from_tokens(tokens: &TokenSet) -> Result<ProviderAccount, ProviderError> {
    let id_token = tokens
        .id_token
        .as_deref()
        .ok_or_else(|| ProviderError::Failure("token response carried no ID token".into()))?;
    let claims = decode_id_token_claims(id_token).map_err(map_client_error)?;

    let home_account_id = claims
        .account_id()
        .ok_or_else(|| ProviderError::Failure("ID token has no account identifier".into()))?;
    let username = claims
        .username()
        .ok_or_else(|| ProviderError::Failure("ID token has no username claim".into()))?
        .to_string();

    Ok(ProviderAccount { home_account_id, username, name: claims.name })
}

fn map_client_error(err: OAuthClientError) -> ProviderError {
    match &err {
        OAuthClientError::NoRefreshToken => ProviderError::InteractionRequired(err.to_string()),
        OAuthClientError::OAuthError(inner) if INTERACTION_ERROR_CODES.contains(&inner.error.as_str()) => {
            ProviderError::InteractionRequired(inner.to_string())
        }
        _ => ProviderError::Failure(err.to_string()),
    }
}
