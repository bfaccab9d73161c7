//! Authentication commands
//!
//! Thin wrappers over the [`AuthController`](userdesk_core::AuthController).
//! Signals are published by the controller itself; these commands only
//! return the outcome to the caller.

use serde::Serialize;
use userdesk_domain::{
    AccessToken, AuthState, Credentials, Result as DomainResult, Session, StrategyKind,
    UserDeskError,
};

use crate::context::AppContext;
use crate::utils::command_helpers::execute_command;

/// Snapshot of the controller for status displays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionStatus {
    pub state: AuthState,
    pub strategy: StrategyKind,
    pub identity: Option<String>,
}

/// Restore a previous session, if any.
///
/// Emits `sessionEstablished` or `loginRequired` on the signal bus.
pub async fn initialize(ctx: &AppContext) -> DomainResult<AuthState> {
    execute_command("auth::initialize", || async move {
        ctx.auth.initialize().await.map_err(UserDeskError::from)
    })
    .await
}

/// Sign in. `credentials` are required by the local strategy and ignored by
/// the delegated one.
pub async fn login(ctx: &AppContext, credentials: Option<Credentials>) -> DomainResult<Session> {
    execute_command("auth::login", || async move {
        ctx.auth.login(credentials.as_ref()).await.map_err(UserDeskError::from)
    })
    .await
}

/// Sign out. The local session is cleared even when the provider call fails.
pub async fn logout(ctx: &AppContext) -> DomainResult<()> {
    execute_command("auth::logout", || async move {
        ctx.auth.logout().await.map_err(UserDeskError::from)
    })
    .await
}

/// Current state, strategy and identity.
#[must_use]
pub fn session_status(ctx: &AppContext) -> SessionStatus {
    SessionStatus {
        state: ctx.auth.state(),
        strategy: ctx.auth.strategy_kind(),
        identity: ctx.auth.session().map(|session| session.identity),
    }
}

/// Access token for the configured scopes; `None` under the local strategy.
pub async fn access_token(ctx: &AppContext) -> DomainResult<Option<AccessToken>> {
    execute_command("auth::access_token", || async move {
        ctx.auth.get_access_token().await.map_err(UserDeskError::from)
    })
    .await
}
