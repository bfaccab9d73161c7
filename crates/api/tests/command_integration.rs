//! Integration tests for the command layer
//!
//! Commands run against an in-memory store, a scripted identity provider and
//! a wiremock users API.

mod support;

use serde_json::json;
use support::{delegated_context, local_context};
use userdesk_domain::{AuthState, Credentials, StrategyKind, UserDeskError, UserInput};
use userdesk_lib::commands;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn users_body() -> serde_json::Value {
    json!({
        "success": true,
        "data": [{ "id": 1, "name": "Ada Lovelace", "email": "ada@example.com", "phone": "555-0100" }]
    })
}

/// Validates the local sign-in cycle through the commands.
///
/// Assertions:
/// - Wrong credentials fail with an auth error and leave the user signed out.
/// - `admin`/`admin` signs in and the status reports the identity.
/// - Logout returns to `Unauthenticated`.
#[tokio::test]
async fn test_local_login_status_logout() {
    let server = MockServer::start().await;
    let (ctx, _store) = local_context(&server);

    assert_eq!(commands::initialize(&ctx).await.unwrap(), AuthState::Unauthenticated);

    let err = commands::login(&ctx, Some(Credentials::new("admin", "nope"))).await.unwrap_err();
    assert!(matches!(err, UserDeskError::Auth(_)));
    assert_eq!(commands::session_status(&ctx).state, AuthState::Unauthenticated);

    let session = commands::login(&ctx, Some(Credentials::new("admin", "admin"))).await.unwrap();
    assert_eq!(session.identity, "admin");

    let status = commands::session_status(&ctx);
    assert_eq!(status.identity.as_deref(), Some("admin"));
    assert_eq!(status.strategy, StrategyKind::Local);
    assert_eq!(serde_json::to_value(&status).unwrap()["identity"], "admin");
    assert_eq!(commands::access_token(&ctx).await.unwrap(), None);

    commands::logout(&ctx).await.unwrap();
    assert_eq!(commands::session_status(&ctx).identity, None);
}

/// Validates the rejections the console prints itself.
///
/// Assertions:
/// - Logging in twice fails with `Conflict` and keeps the session.
/// - Logging out while signed out fails with `Conflict`.
#[tokio::test]
async fn test_state_rejections_are_conflicts() {
    let server = MockServer::start().await;
    let (ctx, _store) = local_context(&server);
    commands::initialize(&ctx).await.unwrap();

    let err = commands::logout(&ctx).await.unwrap_err();
    assert_eq!(err, UserDeskError::Conflict("Cannot logout while unauthenticated".into()));

    commands::login(&ctx, Some(Credentials::new("admin", "admin"))).await.unwrap();
    let err = commands::login(&ctx, Some(Credentials::new("admin", "admin"))).await.unwrap_err();
    assert_eq!(err, UserDeskError::Conflict("Cannot login while authenticated".into()));
    assert_eq!(commands::session_status(&ctx).identity.as_deref(), Some("admin"));
}

/// Validates user commands are gated on a session.
///
/// Assertions:
/// - Every user command fails with `Auth` while signed out.
/// - No request reaches the backend.
#[tokio::test]
async fn test_user_commands_require_session() {
    let server = MockServer::start().await;
    let (ctx, _store) = local_context(&server);
    commands::initialize(&ctx).await.unwrap();

    assert!(matches!(commands::list_users(&ctx).await, Err(UserDeskError::Auth(_))));
    assert!(matches!(commands::get_user(&ctx, 1).await, Err(UserDeskError::Auth(_))));
    assert!(matches!(commands::delete_user(&ctx, 1).await, Err(UserDeskError::Auth(_))));
    let input = UserInput::new("Ada", "ada@example.com", "");
    assert!(matches!(commands::save_user(&ctx, None, input).await, Err(UserDeskError::Auth(_))));

    assert!(server.received_requests().await.unwrap().is_empty());
}

/// Validates the delegated token reaches the users API.
#[tokio::test]
async fn test_delegated_session_lists_users_with_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/users/"))
        .and(header("Authorization", "Bearer silent-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(users_body()))
        .expect(1)
        .mount(&server)
        .await;

    let (ctx, provider) = delegated_context(&server);
    commands::initialize(&ctx).await.unwrap();
    let session = commands::login(&ctx, None).await.unwrap();
    assert_eq!(session.identity, "Mock User");

    let users = commands::list_users(&ctx).await.unwrap();
    assert_eq!(users[0].email, "ada@example.com");
    assert_eq!(provider.calls().silent, 1);
}

/// Validates save and delete.
///
/// Assertions:
/// - Invalid input is rejected locally without a request.
/// - `None` id creates, `Some` id updates.
/// - Backend field errors surface as `InvalidInput`.
#[tokio::test]
async fn test_save_and_delete_user() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/users/"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "success": false,
            "errors": { "email": ["user with this email already exists."] }
        })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/users/1/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "User updated successfully"
        })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/users/1/"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let (ctx, _store) = local_context(&server);
    commands::initialize(&ctx).await.unwrap();
    commands::login(&ctx, Some(Credentials::new("admin", "admin"))).await.unwrap();

    let err = commands::save_user(&ctx, None, UserInput::new("", "ada@example.com", ""))
        .await
        .unwrap_err();
    assert_eq!(err, UserDeskError::InvalidInput("name is required".into()));
    assert!(server.received_requests().await.unwrap().is_empty());

    let err = commands::save_user(&ctx, None, UserInput::new("Ada", "ada@example.com", ""))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        UserDeskError::InvalidInput(
            "Failed to save user. user with this email already exists.".into()
        )
    );

    let updated = commands::save_user(&ctx, Some(1), UserInput::new("Ada", "ada@example.com", ""))
        .await
        .unwrap();
    assert_eq!(updated.message, "User updated successfully");

    assert_eq!(commands::delete_user(&ctx, 1).await.unwrap(), "User deleted successfully!");
}
