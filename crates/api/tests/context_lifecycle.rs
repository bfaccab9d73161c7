//! Integration tests for AppContext lifecycle
//!
//! Builds contexts from configuration the way the binary does, with the
//! file-backed store in a temporary directory. A restart is a second context
//! over the same store file.

use std::path::Path;

use tempfile::TempDir;
use userdesk_core::testing::RecordingSignals;
use userdesk_core::AuthSignal;
use userdesk_domain::constants::LOCAL_LOGIN_MARKER_KEY;
use userdesk_domain::{AppConfig, AuthState, Credentials, StorageConfig};
use userdesk_lib::{commands, AppContext};

fn create_test_context(dir: &Path) -> AppContext {
    let config = AppConfig {
        storage: StorageConfig { path: dir.join("store.json") },
        ..AppConfig::default()
    };
    AppContext::new(config).expect("failed to create test context")
}

/// Validates a local session survives a restart.
///
/// Assertions:
/// - The first run asks for a login.
/// - A second context over the same store restores the session.
/// - Logging out removes the marker from disk.
#[tokio::test]
async fn test_local_session_survives_restart() {
    let dir = TempDir::new().expect("failed to create temporary directory");

    let first = create_test_context(dir.path());
    let signals = RecordingSignals::attach(first.auth.signals());
    assert_eq!(commands::initialize(&first).await.unwrap(), AuthState::Unauthenticated);
    commands::login(&first, Some(Credentials::new("admin", "admin"))).await.unwrap();
    assert_eq!(
        signals.take(),
        vec![
            AuthSignal::LoginRequired,
            AuthSignal::SessionEstablished { identity: "admin".into() }
        ]
    );

    let restarted = create_test_context(dir.path());
    let signals = RecordingSignals::attach(restarted.auth.signals());
    assert_eq!(commands::initialize(&restarted).await.unwrap(), AuthState::Authenticated);
    assert_eq!(commands::session_status(&restarted).identity.as_deref(), Some("admin"));
    assert_eq!(signals.take(), vec![AuthSignal::SessionEstablished { identity: "admin".into() }]);

    commands::logout(&restarted).await.unwrap();
    assert_eq!(restarted.store.get(LOCAL_LOGIN_MARKER_KEY).await.unwrap(), None);

    let third = create_test_context(dir.path());
    assert_eq!(commands::initialize(&third).await.unwrap(), AuthState::Unauthenticated);
}

/// Validates initialize is idempotent on one context.
#[tokio::test]
async fn test_initialize_twice_is_harmless() {
    let dir = TempDir::new().expect("failed to create temporary directory");
    let ctx = create_test_context(dir.path());

    assert_eq!(commands::initialize(&ctx).await.unwrap(), AuthState::Unauthenticated);
    assert_eq!(commands::initialize(&ctx).await.unwrap(), AuthState::Unauthenticated);
}
