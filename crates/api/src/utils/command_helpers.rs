//! Command execution helpers
//!
//! Every command runs through [`execute_command`] so timing and outcome are
//! logged in the same shape.

use std::future::Future;
use std::time::Instant;

use tracing::debug;
use userdesk_domain::Result as DomainResult;

use crate::utils::logging::{error_label, log_command_execution};

/// Execute a command with automatic timing and logging
///
/// # Example
///
/// ```rust,ignore
/// pub async fn list_users(ctx: &AppContext) -> Result<Vec<UserRecord>> {
///     execute_command("users::list_users", || async {
///         ctx.users.list().await.map_err(UserDeskError::from)
///     })
///     .await
/// }
/// ```
pub async fn execute_command<F, Fut, T>(command_name: &str, command_fn: F) -> DomainResult<T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = DomainResult<T>>,
{
    let start = Instant::now();

    let result = command_fn().await;

    let elapsed = start.elapsed();
    if let Err(err) = &result {
        debug!(command = command_name, error_type = error_label(err), error = %err, "command failed");
    }
    log_command_execution(command_name, elapsed, result.is_ok());

    result
}
