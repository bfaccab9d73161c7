//! Integration tests for the OAuth client
//!
//! Drives a full authorization-code flow followed by a refresh against a
//! mocked authority.

use userdesk_common::auth::{decode_id_token_claims, OAuthClient, OAuthConfig};
use userdesk_common::testing::id_token_for;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn query_param(url: &str, key: &str) -> Option<String> {
    let query = url.split_once('?')?.1;
    query.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        (k == key).then(|| urlencoding::decode(v).map(|v| v.into_owned()).unwrap_or_default())
    })
}

/// Validates the code flow and a subsequent refresh.
///
/// # Test Steps
/// 1. Generate an authorization URL and read its `state`
/// 2. Exchange a code, decode the ID token claims
/// 3. Refresh and merge the new token set, keeping the ID token
#[tokio::test(flavor = "multi_thread")]
async fn test_code_flow_then_refresh() {
    let server = MockServer::start().await;
    let id_token = id_token_for("oid-42", "ada@example.com", Some("Ada Lovelace"));

    Mock::given(method("POST"))
        .and(path("/common/oauth2/v2.0/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("redirect_uri=http%3A%2F%2F127.0.0.1%3A40000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "at-1",
            "refresh_token": "rt-1",
            "id_token": id_token,
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/common/oauth2/v2.0/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=rt-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "at-2",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = OAuthConfig::new(
        format!("{}/common", server.uri()),
        "client-1",
        "http://localhost:3000",
        vec!["User.Read".to_string()],
    );
    let client = OAuthClient::new(config);

    let (url, state) = client
        .generate_authorization_url(&["User.Read".to_string()], "http://127.0.0.1:40000", None)
        .await
        .unwrap();
    assert_eq!(query_param(&url, "state").as_deref(), Some(state.as_str()));
    assert_eq!(query_param(&url, "code_challenge_method").as_deref(), Some("S256"));

    let tokens = client.exchange_code_for_tokens("code-1", &state).await.unwrap();
    let claims = decode_id_token_claims(tokens.id_token.as_deref().unwrap()).unwrap();
    assert_eq!(claims.account_id().as_deref(), Some("oid-42"));
    assert_eq!(claims.name.as_deref(), Some("Ada Lovelace"));

    let refreshed = client
        .refresh_access_token(tokens.refresh_token.as_deref().unwrap(), &["User.Read".to_string()])
        .await
        .unwrap();
    let merged = tokens.merge_refreshed(refreshed);
    assert_eq!(merged.access_token, "at-2");
    assert_eq!(merged.refresh_token.as_deref(), Some("rt-1"));
    assert!(merged.id_token.is_some());
}
