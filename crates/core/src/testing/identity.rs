use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{Notify, Semaphore};
use userdesk_domain::{AccessToken, ProviderAccount, ProviderError};

use crate::auth::ports::IdentityProvider;

/// How often each provider operation was called.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProviderCalls {
    pub initialize: usize,
    pub accounts: usize,
    pub login: usize,
    pub silent: usize,
    pub interactive_token: usize,
    pub logout: usize,
}

#[derive(Debug)]
struct ProviderScript {
    init_result: Result<(), ProviderError>,
    accounts: Vec<ProviderAccount>,
    logins: VecDeque<Result<ProviderAccount, ProviderError>>,
    silent: VecDeque<Result<AccessToken, ProviderError>>,
    interactive: VecDeque<Result<AccessToken, ProviderError>>,
    logout_result: Result<(), ProviderError>,
    last_post_logout_redirect_uri: Option<String>,
    login_hold: Option<Arc<Semaphore>>,
    token_hold: Option<Arc<Semaphore>>,
    calls: ProviderCalls,
}

impl Default for ProviderScript {
    fn default() -> Self {
        Self {
            init_result: Ok(()),
            accounts: Vec::new(),
            logins: VecDeque::new(),
            silent: VecDeque::new(),
            interactive: VecDeque::new(),
            logout_result: Ok(()),
            last_post_logout_redirect_uri: None,
            login_hold: None,
            token_hold: None,
            calls: ProviderCalls::default(),
        }
    }
}

/// Keeps interactive windows suspended until released or dropped.
#[derive(Debug)]
pub struct LoginHold {
    gate: Arc<Semaphore>,
}

impl LoginHold {
    /// Let held and future logins complete.
    pub fn release(self) {}
}

impl Drop for LoginHold {
    fn drop(&mut self) {
        self.gate.close();
    }
}

/// Scripted [`IdentityProvider`].
///
/// Results are queued per operation; an empty queue falls back to success
/// with a default account or token. Like a real provider cache, a
/// successful login adds its account to `accounts()` and a logout removes it.
#[derive(Debug, Default)]
pub struct MockIdentityProvider {
    script: Mutex<ProviderScript>,
    login_started: Notify,
    token_started: Notify,
}

impl MockIdentityProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Account returned when no login result is queued.
    #[must_use]
    pub fn default_account() -> ProviderAccount {
        ProviderAccount {
            home_account_id: "mock-oid".into(),
            username: "mock.user@example.com".into(),
            name: Some("Mock User".into()),
        }
    }

    pub fn set_init_result(&self, result: Result<(), ProviderError>) {
        self.script.lock().init_result = result;
    }

    pub fn set_accounts(&self, accounts: Vec<ProviderAccount>) {
        self.script.lock().accounts = accounts;
    }

    pub fn push_login(&self, result: Result<ProviderAccount, ProviderError>) {
        self.script.lock().logins.push_back(result);
    }

    pub fn push_silent(&self, result: Result<AccessToken, ProviderError>) {
        self.script.lock().silent.push_back(result);
    }

    pub fn push_interactive(&self, result: Result<AccessToken, ProviderError>) {
        self.script.lock().interactive.push_back(result);
    }

    pub fn set_logout_result(&self, result: Result<(), ProviderError>) {
        self.script.lock().logout_result = result;
    }

    /// Suspend `login_interactive` calls until the returned hold goes away.
    #[must_use]
    pub fn hold_logins(&self) -> LoginHold {
        let gate = Arc::new(Semaphore::new(0));
        self.script.lock().login_hold = Some(gate.clone());
        LoginHold { gate }
    }

    /// Resolves once a `login_interactive` call has started.
    pub async fn login_started(&self) {
        self.login_started.notified().await;
    }

    /// Suspend `acquire_token_interactive` calls until the returned hold
    /// goes away.
    #[must_use]
    pub fn hold_interactive_tokens(&self) -> LoginHold {
        let gate = Arc::new(Semaphore::new(0));
        self.script.lock().token_hold = Some(gate.clone());
        LoginHold { gate }
    }

    /// Resolves once an `acquire_token_interactive` call has started.
    pub async fn interactive_token_started(&self) {
        self.token_started.notified().await;
    }

    #[must_use]
    pub fn calls(&self) -> ProviderCalls {
        self.script.lock().calls
    }

    #[must_use]
    pub fn last_post_logout_redirect_uri(&self) -> Option<String> {
        self.script.lock().last_post_logout_redirect_uri.clone()
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn initialize(&self) -> Result<(), ProviderError> {
        let mut script = self.script.lock();
        script.calls.initialize += 1;
        script.init_result.clone()
    }

    async fn accounts(&self) -> Result<Vec<ProviderAccount>, ProviderError> {
        let mut script = self.script.lock();
        script.calls.accounts += 1;
        Ok(script.accounts.clone())
    }

    async fn login_interactive(&self, _scopes: &[String]) -> Result<ProviderAccount, ProviderError> {
        let hold = {
            let mut script = self.script.lock();
            script.calls.login += 1;
            script.login_hold.clone()
        };
        self.login_started.notify_one();
        if let Some(gate) = hold {
            // Closed on release; the error only means "go ahead".
            let _ = gate.acquire().await;
        }

        let mut script = self.script.lock();
        let result = script.logins.pop_front().unwrap_or_else(|| Ok(Self::default_account()));
        if let Ok(account) = &result {
            script.accounts.retain(|known| known.home_account_id != account.home_account_id);
            script.accounts.push(account.clone());
        }
        result
    }

    async fn acquire_token_silent(
        &self,
        _scopes: &[String],
        _account: &ProviderAccount,
    ) -> Result<AccessToken, ProviderError> {
        let mut script = self.script.lock();
        script.calls.silent += 1;
        script.silent.pop_front().unwrap_or_else(|| Ok(AccessToken::new("silent-token", None)))
    }

    async fn acquire_token_interactive(
        &self,
        _scopes: &[String],
    ) -> Result<AccessToken, ProviderError> {
        let hold = {
            let mut script = self.script.lock();
            script.calls.interactive_token += 1;
            script.token_hold.clone()
        };
        self.token_started.notify_one();
        if let Some(gate) = hold {
            let _ = gate.acquire().await;
        }

        let mut script = self.script.lock();
        script
            .interactive
            .pop_front()
            .unwrap_or_else(|| Ok(AccessToken::new("interactive-token", None)))
    }

    async fn logout_interactive(
        &self,
        account: &ProviderAccount,
        post_logout_redirect_uri: Option<&str>,
    ) -> Result<(), ProviderError> {
        let mut script = self.script.lock();
        script.calls.logout += 1;
        script.last_post_logout_redirect_uri = post_logout_redirect_uri.map(str::to_string);
        script.accounts.retain(|known| known.home_account_id != account.home_account_id);
        script.logout_result.clone()
    }
}
