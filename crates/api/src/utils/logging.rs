use std::time::Duration;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use userdesk_domain::UserDeskError;

/// Environment variable selecting the log output format (`json` or `pretty`).
pub const LOG_FORMAT_ENV: &str = "USERDESK_LOG_FORMAT";

/// Install the global tracing subscriber.
///
/// The filter comes from `RUST_LOG` and defaults to `info`. Setting
/// `USERDESK_LOG_FORMAT=json` switches to one JSON object per line.
///
/// # Errors
/// Fails if a global subscriber is already installed.
pub fn init_logging() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var(LOG_FORMAT_ENV).is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if json {
        builder.json().try_init()
    } else {
        builder.with_target(false).try_init()
    }
    .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))
}

/// Log the outcome of a command execution with structured fields.
///
/// `command` is a stable identifier such as `"users::list_users"`; never
/// forward user input or secrets through it.
#[inline]
pub fn log_command_execution(command: &str, elapsed: Duration, success: bool) {
    let duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);

    if success {
        info!(command, duration_ms, "command_execution_success");
    } else {
        warn!(command, duration_ms, "command_execution_failure");
    }
}

/// Convert a `UserDeskError` into a stable label suitable for logging.
#[inline]
#[must_use]
pub const fn error_label(error: &UserDeskError) -> &'static str {
    match error {
        UserDeskError::Config(_) => "config",
        UserDeskError::Network(_) => "network",
        UserDeskError::Auth(_) => "auth",
        UserDeskError::Conflict(_) => "conflict",
        UserDeskError::Storage(_) => "storage",
        UserDeskError::NotFound(_) => "not_found",
        UserDeskError::InvalidInput(_) => "invalid_input",
        UserDeskError::Internal(_) => "internal",
    }
}
