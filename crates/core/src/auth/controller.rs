//! Authentication controller - session state machine
//!
//! ```text
//! Uninitialized ──initialize──► Unauthenticated ──login──► Authenticating
//!       │                              ▲    ▲                  │    │
//!       └────────initialize────────────┼────┼──────────────────┘    │ ok
//!              (prior session)         │    └──── failure ──────────┘
//!                     ▼                │                            ▼
//!               Authenticated ─────────┴──────── logout ───── Authenticated
//! ```
//!
//! `initialize`, `login` and `logout` share one operation gate: a call made
//! while another is pending fails fast with
//! [`AuthError::OperationInProgress`] and changes nothing. Every operation
//! settles in `Unauthenticated` or `Authenticated`, including when its
//! future is dropped half-way.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, instrument, warn};
use userdesk_domain::{AccessToken, AuthError, AuthState, Credentials, Session, StrategyKind};

use super::ports::AuthStrategy;
use super::signals::{AuthSignal, SignalBus};

#[derive(Debug)]
struct ControllerState {
    state: AuthState,
    session: Option<Session>,
}

/// Owns the session and drives the single configured strategy.
pub struct AuthController {
    strategy: Arc<dyn AuthStrategy>,
    inner: RwLock<ControllerState>,
    gate: Mutex<()>,
    signals: SignalBus,
}

impl AuthController {
    /// Controller with its own signal bus.
    pub fn new(strategy: Arc<dyn AuthStrategy>) -> Self {
        Self::with_signal_bus(strategy, SignalBus::new())
    }

    /// Controller publishing on an existing bus.
    pub fn with_signal_bus(strategy: Arc<dyn AuthStrategy>, signals: SignalBus) -> Self {
        Self {
            strategy,
            inner: RwLock::new(ControllerState {
                state: AuthState::Uninitialized,
                session: None,
            }),
            gate: Mutex::new(()),
            signals,
        }
    }

    pub fn state(&self) -> AuthState {
        self.inner.read().state
    }

    /// Current session, if authenticated.
    pub fn session(&self) -> Option<Session> {
        self.inner.read().session.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state() == AuthState::Authenticated
    }

    pub fn strategy_kind(&self) -> StrategyKind {
        self.strategy.kind()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuthSignal> {
        self.signals.subscribe()
    }

    pub fn signals(&self) -> &SignalBus {
        &self.signals
    }

    /// Restore a prior session, or ask for a login.
    ///
    /// Runs once; later calls return the current state without doing
    /// anything. A strategy failure is reported through `AuthError` and the
    /// controller still settles in `Unauthenticated`.
    ///
    /// # Errors
    /// Only [`AuthError::OperationInProgress`].
    #[instrument(skip(self), fields(strategy = %self.strategy.kind()))]
    pub async fn initialize(&self) -> Result<AuthState, AuthError> {
        let _gate = self.enter("initialize")?;

        let current = self.state();
        if current != AuthState::Uninitialized {
            debug!(state = %current, "already initialized");
            return Ok(current);
        }

        match self.strategy.restore_session().await {
            Ok(Some(identity)) => {
                let session = Session::new(identity, self.strategy.kind());
                self.settle(AuthState::Authenticated, Some(session.clone()));
                info!(identity = %session.identity, "prior session restored");
                self.emit(AuthSignal::SessionEstablished { identity: session.identity });
            }
            Ok(None) => {
                self.settle(AuthState::Unauthenticated, None);
                debug!("no prior session");
                self.emit(AuthSignal::LoginRequired);
            }
            Err(err) => {
                self.settle(AuthState::Unauthenticated, None);
                warn!(error = %err, "session restore failed");
                self.emit(AuthSignal::AuthError { message: err.user_message() });
                self.emit(AuthSignal::LoginRequired);
            }
        }

        Ok(self.state())
    }

    /// Sign in through the strategy. Valid only from `Unauthenticated`.
    ///
    /// Failures move back to `Unauthenticated`, emit `AuthError` and are
    /// not retried.
    ///
    /// # Errors
    /// `OperationInProgress` or `InvalidState` without side effects, or the
    /// strategy's failure after it was reported.
    #[instrument(skip(self, credentials), fields(strategy = %self.strategy.kind()))]
    pub async fn login(&self, credentials: Option<&Credentials>) -> Result<Session, AuthError> {
        let _gate = self.enter("login")?;

        {
            let mut inner = self.inner.write();
            if inner.state != AuthState::Unauthenticated {
                return Err(AuthError::InvalidState {
                    operation: "login",
                    state: inner.state.to_string(),
                });
            }
            inner.state = AuthState::Authenticating;
        }
        let mut pending = SettleOnDrop::new(self, "login");

        let outcome = self.strategy.login(credentials).await;
        pending.disarm();

        match outcome {
            Ok(identity) => {
                let session = Session::new(identity, self.strategy.kind());
                self.settle(AuthState::Authenticated, Some(session.clone()));
                info!(identity = %session.identity, "session established");
                self.emit(AuthSignal::SessionEstablished { identity: session.identity.clone() });
                Ok(session)
            }
            Err(err) => {
                self.settle(AuthState::Unauthenticated, None);
                warn!(error = %err, "login failed");
                self.emit(AuthSignal::AuthError { message: login_failure_message(&err) });
                Err(err)
            }
        }
    }

    /// Sign out. Valid only from `Authenticated`.
    ///
    /// The local session is cleared and `SessionEnded` emitted whatever the
    /// strategy reports; a strategy failure is additionally reported through
    /// `AuthError` and returned.
    ///
    /// # Errors
    /// `OperationInProgress` or `InvalidState` without side effects, or the
    /// strategy's failure after the session was cleared.
    #[instrument(skip(self), fields(strategy = %self.strategy.kind()))]
    pub async fn logout(&self) -> Result<(), AuthError> {
        let _gate = self.enter("logout")?;

        let session = {
            let inner = self.inner.read();
            match (inner.state, inner.session.clone()) {
                (AuthState::Authenticated, Some(session)) => session,
                (state, _) => {
                    return Err(AuthError::InvalidState {
                        operation: "logout",
                        state: state.to_string(),
                    })
                }
            }
        };
        let mut pending = SettleOnDrop::new(self, "logout");

        let outcome = self.strategy.logout(&session).await;
        pending.disarm();

        self.settle(AuthState::Unauthenticated, None);
        info!(identity = %session.identity, "session ended");
        self.emit(AuthSignal::SessionEnded);

        if let Err(err) = &outcome {
            warn!(error = %err, "remote logout failed; local session cleared anyway");
            self.emit(AuthSignal::AuthError {
                message: format!("Failed to logout: {}", err.user_message()),
            });
        }
        outcome
    }

    /// Bearer token for backend calls.
    ///
    /// `Ok(None)` means the backend needs no token (local strategy). Not
    /// gated: token requests may overlap with each other and with logins.
    ///
    /// # Errors
    /// `NoSession` when nobody is signed in under the delegated strategy,
    /// or the provider failure left after the single interactive retry.
    /// Errors are also reported through `AuthError`.
    #[instrument(skip(self), fields(strategy = %self.strategy.kind()))]
    pub async fn get_access_token(&self) -> Result<Option<AccessToken>, AuthError> {
        let session = self.session();
        match self.strategy.acquire_token(session.as_ref()).await {
            Ok(token) => Ok(token),
            Err(err) => {
                warn!(error = %err, "token acquisition failed");
                self.emit(AuthSignal::AuthError { message: err.user_message() });
                Err(err)
            }
        }
    }

    fn enter(&self, operation: &'static str) -> Result<tokio::sync::MutexGuard<'_, ()>, AuthError> {
        self.gate.try_lock().map_err(|_| {
            warn!(operation, "rejected: another auth operation is pending");
            AuthError::OperationInProgress
        })
    }

    fn settle(&self, state: AuthState, session: Option<Session>) {
        let mut inner = self.inner.write();
        inner.state = state;
        inner.session = session;
    }

    /// Clear everything after an abandoned operation.
    fn abandon(&self, operation: &'static str) {
        let had_session = {
            let mut inner = self.inner.write();
            inner.state = AuthState::Unauthenticated;
            inner.session.take().is_some()
        };
        warn!(operation, "auth operation dropped before completing; now unauthenticated");
        if had_session {
            self.emit(AuthSignal::SessionEnded);
        }
    }

    fn emit(&self, signal: AuthSignal) {
        self.signals.emit(signal);
    }
}

impl std::fmt::Debug for AuthController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("AuthController")
            .field("strategy", &self.strategy.kind())
            .field("state", &inner.state)
            .field("session", &inner.session)
            .finish_non_exhaustive()
    }
}

/// Settles the controller if the owning future is dropped mid-operation.
struct SettleOnDrop<'a> {
    controller: &'a AuthController,
    operation: &'static str,
    armed: bool,
}

impl<'a> SettleOnDrop<'a> {
    const fn new(controller: &'a AuthController, operation: &'static str) -> Self {
        Self { controller, operation, armed: true }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for SettleOnDrop<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.controller.abandon(self.operation);
        }
    }
}

fn login_failure_message(err: &AuthError) -> String {
    match err {
        AuthError::InvalidCredentials => err.user_message(),
        other => format!("Failed to login: {}", other.user_message()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::local::LocalCredentialStrategy;
    use crate::testing::{MemoryKeyValueStore, RecordingSignals};

    fn local_controller() -> (AuthController, RecordingSignals) {
        let store = Arc::new(MemoryKeyValueStore::new());
        let strategy = Arc::new(LocalCredentialStrategy::new(store, "admin", "admin"));
        let controller = AuthController::new(strategy);
        let signals = RecordingSignals::attach(controller.signals());
        (controller, signals)
    }

    #[tokio::test]
    async fn test_operations_before_initialize_are_rejected() {
        let (controller, signals) = local_controller();

        let err = controller.login(Some(&Credentials::new("admin", "admin"))).await.unwrap_err();
        assert_eq!(
            err,
            AuthError::InvalidState { operation: "login", state: "uninitialized".into() }
        );
        assert!(matches!(controller.logout().await, Err(AuthError::InvalidState { .. })));
        assert_eq!(controller.state(), AuthState::Uninitialized);
        assert!(signals.take().is_empty());
    }

    #[tokio::test]
    async fn test_initialize_is_idempotent() {
        let (controller, signals) = local_controller();

        assert_eq!(controller.initialize().await.unwrap(), AuthState::Unauthenticated);
        assert_eq!(controller.initialize().await.unwrap(), AuthState::Unauthenticated);
        assert_eq!(signals.take(), vec![AuthSignal::LoginRequired]);
    }

    #[tokio::test]
    async fn test_login_while_authenticated_is_rejected_without_signals() {
        let (controller, signals) = local_controller();
        controller.initialize().await.unwrap();
        controller.login(Some(&Credentials::new("admin", "admin"))).await.unwrap();
        signals.take();

        let err = controller.login(Some(&Credentials::new("admin", "admin"))).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidState { operation: "login", .. }));
        assert_eq!(controller.session().unwrap().identity, "admin");
        assert!(signals.take().is_empty());
    }

    #[test]
    fn test_login_failure_messages() {
        assert_eq!(
            login_failure_message(&AuthError::InvalidCredentials),
            "Invalid username or password."
        );
        assert_eq!(
            login_failure_message(&AuthError::ProviderFailure("AADSTS50011: redirect".into())),
            "Failed to login: AADSTS50011: redirect"
        );
    }
}
