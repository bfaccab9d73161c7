//! Integration tests for the browser-based identity provider
//!
//! A scripted launcher plays the user: it reads the authorization URL and
//! calls the loopback redirect URI the way the browser would after sign-in.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use url::Url;
use userdesk_common::testing::{id_token_for, MockOAuthClient};
use userdesk_common::TokenSet;
use userdesk_core::testing::{MemoryKeyValueStore, RecordingSignals};
use userdesk_core::{AuthController, AuthSignal, DelegatedOAuthStrategy, IdentityProvider};
use userdesk_domain::constants::OAUTH_ACCOUNT_CACHE_KEY;
use userdesk_domain::{AuthError, AuthState, ProviderError};
use userdesk_infra::{OAuthIdentityProvider, PopupLauncher};

#[derive(Clone, Copy)]
enum UserAction {
    Approve,
    Deny,
    /// Opens the window and closes it without finishing.
    Abandon,
}

/// Answers authorization URLs by hitting the redirect URI.
struct ScriptedBrowser {
    action: Mutex<UserAction>,
    delay: Mutex<Duration>,
    opened: Mutex<Vec<String>>,
}

impl ScriptedBrowser {
    fn new(action: UserAction) -> Arc<Self> {
        Arc::new(Self {
            action: Mutex::new(action),
            delay: Mutex::new(Duration::ZERO),
            opened: Mutex::new(Vec::new()),
        })
    }

    fn set_action(&self, action: UserAction) {
        *self.action.lock() = action;
    }

    /// Time the user spends in the window before the redirect.
    fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = delay;
    }

    fn opened(&self) -> Vec<String> {
        self.opened.lock().clone()
    }
}

impl PopupLauncher for ScriptedBrowser {
    fn open(&self, url: &str) -> Result<(), ProviderError> {
        self.opened.lock().push(url.to_string());

        let parsed = Url::parse(url).map_err(|e| ProviderError::Failure(e.to_string()))?;
        if parsed.path() != "/authorize" {
            return Ok(());
        }
        let param = |name: &str| {
            parsed.query_pairs().find(|(key, _)| key == name).map(|(_, value)| value.into_owned())
        };
        let redirect = param("redirect_uri").unwrap_or_default();
        let state = param("state").unwrap_or_default();
        let callback = match *self.action.lock() {
            UserAction::Approve => format!("{redirect}?code=auth-code&state={state}"),
            UserAction::Deny => format!("{redirect}?error=access_denied&state={state}"),
            UserAction::Abandon => return Ok(()),
        };

        let delay = *self.delay.lock();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = reqwest::get(callback).await;
        });
        Ok(())
    }
}

struct Harness {
    client: MockOAuthClient,
    store: Arc<MemoryKeyValueStore>,
    browser: Arc<ScriptedBrowser>,
}

impl Harness {
    fn new() -> Self {
        Self {
            client: MockOAuthClient::new().with_redirect_uri("http://127.0.0.1:0/callback"),
            store: Arc::new(MemoryKeyValueStore::new()),
            browser: ScriptedBrowser::new(UserAction::Approve),
        }
    }

    fn provider(&self) -> OAuthIdentityProvider {
        OAuthIdentityProvider::new(
            Arc::new(self.client.clone()),
            self.store.clone(),
            self.browser.clone(),
        )
    }
}

fn scopes() -> Vec<String> {
    vec!["User.Read".to_string()]
}

fn short_lived_tokens() -> TokenSet {
    TokenSet::new(
        "short-lived".to_string(),
        Some("refresh-1".to_string()),
        Some(id_token_for("oid-7", "grace@example.com", Some("Grace Hopper"))),
        60,
        None,
    )
}

/// Validates an interactive sign-in through the loopback listener.
///
/// Assertions:
/// - The account comes from the ID token claims.
/// - The cache survives a new provider instance on the same store.
#[tokio::test]
async fn test_interactive_login_caches_account() {
    let harness = Harness::new();
    let provider = harness.provider();
    provider.initialize().await.unwrap();
    assert!(provider.accounts().await.unwrap().is_empty());

    let account = provider.login_interactive(&scopes()).await.unwrap();
    assert_eq!(account.username, "mock.user@example.com");
    assert_eq!(account.display_name(), "Mock User");
    assert_eq!(harness.client.exchange_calls(), 1);
    assert!(harness.store.value(OAUTH_ACCOUNT_CACHE_KEY).is_some());

    let restarted = harness.provider();
    restarted.initialize().await.unwrap();
    assert_eq!(restarted.accounts().await.unwrap(), vec![account]);
}

/// Validates a denied sign-in resolves as a cancellation.
#[tokio::test]
async fn test_denied_login_is_cancelled() {
    let harness = Harness::new();
    harness.browser.set_action(UserAction::Deny);
    let provider = harness.provider();

    let err = provider.login_interactive(&scopes()).await.unwrap_err();
    assert_eq!(err, ProviderError::Cancelled);
    assert_eq!(harness.client.cancel_calls(), 1);
    assert!(harness.store.is_empty());
}

/// Validates silent acquisition.
///
/// Assertions:
/// - A token expiring within five minutes is refreshed.
/// - A fresh cached token is served without a refresh.
/// - A rejected refresh grant requires interaction.
#[tokio::test]
async fn test_silent_acquisition_refreshes_then_requires_interaction() {
    let harness = Harness::new();
    harness.client.set_exchange_response(short_lived_tokens());
    let provider = harness.provider();
    let account = provider.login_interactive(&scopes()).await.unwrap();
    assert_eq!(account.home_account_id, "oid-7");

    let token = provider.acquire_token_silent(&scopes(), &account).await.unwrap();
    assert_eq!(token.secret(), "refreshed_access_token");
    assert_eq!(harness.client.refresh_calls(), 1);

    let token = provider.acquire_token_silent(&scopes(), &account).await.unwrap();
    assert_eq!(token.secret(), "refreshed_access_token");
    assert_eq!(harness.client.refresh_calls(), 1);

    // The refresh kept the account: the response carried no ID token.
    assert_eq!(provider.accounts().await.unwrap(), vec![account]);

    let harness = Harness::new();
    harness.client.set_exchange_response(short_lived_tokens());
    harness.client.set_refresh_error("invalid_grant");
    let provider = harness.provider();
    let account = provider.login_interactive(&scopes()).await.unwrap();

    let err = provider.acquire_token_silent(&scopes(), &account).await.unwrap_err();
    assert!(err.is_interaction_required());
}

/// Validates silent acquisition for an account the cache does not know.
#[tokio::test]
async fn test_unknown_account_requires_interaction() {
    let harness = Harness::new();
    let provider = harness.provider();
    let stranger = userdesk_domain::ProviderAccount {
        home_account_id: "nobody".into(),
        username: "nobody@example.com".into(),
        name: None,
    };

    let err = provider.acquire_token_silent(&scopes(), &stranger).await.unwrap_err();
    assert!(err.is_interaction_required());
}

/// Validates sign-out.
///
/// Assertions:
/// - The account leaves the cache.
/// - The end-session URL carries the post-logout redirect.
#[tokio::test]
async fn test_logout_clears_cache_and_opens_end_session() {
    let harness = Harness::new();
    let provider = harness.provider();
    let account = provider.login_interactive(&scopes()).await.unwrap();

    provider.logout_interactive(&account, Some("http://localhost:3000")).await.unwrap();

    assert!(provider.accounts().await.unwrap().is_empty());
    assert!(harness.store.is_empty());
    let last = harness.browser.opened().pop().unwrap();
    assert!(last.starts_with("https://mock.idp/logout"));
    assert!(last.contains("post_logout_redirect_uri=http%3A%2F%2Flocalhost%3A3000"));
}

/// Validates the delegated stack end to end through the controller.
///
/// Assertions:
/// - Login, token and logout emit the expected signals.
/// - A restarted controller restores the session without a window.
#[tokio::test]
async fn test_controller_over_browser_provider() {
    let harness = Harness::new();
    let controller = |provider: OAuthIdentityProvider| {
        AuthController::new(Arc::new(DelegatedOAuthStrategy::new(Arc::new(provider), scopes())))
    };

    let first = controller(harness.provider());
    let signals = RecordingSignals::attach(first.signals());
    first.initialize().await.unwrap();
    let session = first.login(None).await.unwrap();
    assert_eq!(session.identity, "Mock User");
    assert_eq!(first.get_access_token().await.unwrap().unwrap().secret(), "mock_access_token");

    let restarted = controller(harness.provider());
    assert_eq!(restarted.initialize().await.unwrap(), AuthState::Authenticated);
    let windows_before = harness.browser.opened().len();
    assert_eq!(harness.client.authorize_calls(), 1);

    first.logout().await.unwrap();
    assert_eq!(harness.browser.opened().len(), windows_before + 1);
    assert_eq!(
        signals.take(),
        vec![
            AuthSignal::LoginRequired,
            AuthSignal::SessionEstablished { identity: "Mock User".into() },
            AuthSignal::SessionEnded
        ]
    );
}

/// Validates a sign-in window closed without finishing.
///
/// Assertions:
/// - Login fails once the callback timeout passes, with no timeout on the
///   strategy itself.
/// - The controller settles in `Unauthenticated` and signals the failure.
/// - The pending authorization is cancelled and nothing is cached.
/// - The next login is accepted instead of `OperationInProgress`.
#[tokio::test]
async fn test_abandoned_window_fails_login() {
    let harness = Harness::new();
    harness.browser.set_action(UserAction::Abandon);
    let provider = harness.provider().with_callback_timeout(Duration::from_millis(150));
    let controller =
        AuthController::new(Arc::new(DelegatedOAuthStrategy::new(Arc::new(provider), scopes())));
    let signals = RecordingSignals::attach(controller.signals());
    controller.initialize().await.unwrap();

    let err = tokio::time::timeout(Duration::from_secs(5), controller.login(None))
        .await
        .expect("login must resolve after the callback timeout")
        .unwrap_err();
    assert!(matches!(err, AuthError::ProviderFailure(ref detail) if detail.contains("abandoned")));
    assert_eq!(controller.state(), AuthState::Unauthenticated);
    assert_eq!(harness.client.cancel_calls(), 1);
    assert!(harness.store.is_empty());
    assert!(matches!(signals.take().last(), Some(AuthSignal::AuthError { .. })));

    harness.browser.set_action(UserAction::Approve);
    let session = controller.login(None).await.unwrap();
    assert_eq!(session.identity, "Mock User");
    assert_eq!(controller.state(), AuthState::Authenticated);
}

/// Validates an interactive token window that finishes after sign-out.
///
/// Assertions:
/// - The late token is rejected rather than returned.
/// - The signed-out account is not written back to the cache.
#[tokio::test]
async fn test_token_window_after_logout_is_not_cached() {
    let harness = Harness::new();
    let provider = Arc::new(harness.provider());
    let account = provider.login_interactive(&scopes()).await.unwrap();

    harness.browser.set_delay(Duration::from_millis(300));
    let pending = tokio::spawn({
        let provider = provider.clone();
        async move { provider.acquire_token_interactive(&scopes()).await }
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    provider.logout_interactive(&account, None).await.unwrap();

    let err = pending.await.unwrap().unwrap_err();
    assert!(matches!(err, ProviderError::Failure(ref detail) if detail.contains("signed out")));
    assert!(provider.accounts().await.unwrap().is_empty());
    assert!(harness.store.is_empty());
    assert_eq!(harness.client.exchange_calls(), 2);
}
