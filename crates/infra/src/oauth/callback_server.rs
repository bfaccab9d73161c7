//! Loopback listener for the OAuth redirect
//!
//! Bound to the host and port of the configured redirect URI so the
//! provider's redirect lands here. Port `0` binds an ephemeral port and the
//! effective redirect URI is rewritten accordingly. The first callback
//! carrying either `code`+`state` or `error` resolves the flow; anything else
//! (favicon requests, reloads) is answered and ignored.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use parking_lot::Mutex;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error};
use url::Url;
use userdesk_domain::ProviderError;

const SUCCESS_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Signed in</title></head>
<body><h1>Sign-in complete</h1><p>You can close this window and return to UserDesk.</p></body>
</html>"#;

const FAILURE_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Sign-in failed</title></head>
<body><h1>Sign-in did not complete</h1><p>You can close this window.</p></body>
</html>"#;

/// What the provider sent back to the redirect URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    Authorized { code: String, state: String },
    /// The user closed or declined the sign-in page.
    Denied,
    Failed(String),
}

impl CallbackOutcome {
    fn from_params(params: &HashMap<String, String>) -> Option<Self> {
        if let Some(code) = params.get("error") {
            if matches!(code.as_str(), "access_denied" | "user_cancelled") {
                return Some(Self::Denied);
            }
            let detail = params.get("error_description").unwrap_or(code);
            return Some(Self::Failed(detail.clone()));
        }
        match (params.get("code"), params.get("state")) {
            (Some(code), Some(state)) => {
                Some(Self::Authorized { code: code.clone(), state: state.clone() })
            }
            _ => None,
        }
    }
}

type OutcomeSlot = Arc<Mutex<Option<oneshot::Sender<CallbackOutcome>>>>;

/// Single-use HTTP server receiving one OAuth redirect.
pub struct OAuthCallbackServer {
    redirect_uri: String,
    outcome: Option<oneshot::Receiver<CallbackOutcome>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl OAuthCallbackServer {
    /// Bind the listener for `redirect_uri` and start serving.
    ///
    /// # Errors
    /// Returns `ProviderError::Failure` if the URI is not a usable loopback
    /// URL or the port is taken.
    pub async fn start(redirect_uri: &str) -> Result<Self, ProviderError> {
        let mut url = Url::parse(redirect_uri).map_err(|err| {
            ProviderError::Failure(format!("invalid redirect URI '{redirect_uri}': {err}"))
        })?;
        let host = url
            .host_str()
            .ok_or_else(|| ProviderError::Failure(format!("redirect URI has no host: {redirect_uri}")))?;
        let bind_host = if host == "localhost" { "127.0.0.1" } else { host };
        let port = url.port_or_known_default().unwrap_or(80);

        let listener = TcpListener::bind((bind_host, port)).await.map_err(|err| {
            ProviderError::Failure(format!("failed to listen on {bind_host}:{port}: {err}"))
        })?;
        let bound_port = listener
            .local_addr()
            .map_err(|err| ProviderError::Failure(format!("failed to determine port: {err}")))?
            .port();

        // Keep the configured string verbatim unless the port had to change;
        // providers compare redirect URIs exactly.
        let effective_uri = if port == bound_port {
            redirect_uri.to_string()
        } else {
            url.set_port(Some(bound_port)).map_err(|()| {
                ProviderError::Failure(format!("redirect URI cannot carry a port: {redirect_uri}"))
            })?;
            url.to_string()
        };

        let (outcome_tx, outcome_rx) = oneshot::channel();
        let slot: OutcomeSlot = Arc::new(Mutex::new(Some(outcome_tx)));
        let app = Router::new().route(url.path(), get(handle_callback)).with_state(slot);

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            if let Err(err) = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await
            {
                error!(error = %err, "OAuth callback server error");
            }
        });

        debug!(redirect_uri = %effective_uri, "OAuth callback listener started");
        Ok(Self {
            redirect_uri: effective_uri,
            outcome: Some(outcome_rx),
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    /// Redirect URI to put in the authorization request.
    #[must_use]
    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    /// Wait for the redirect. Unbounded; callers impose their own timeout.
    ///
    /// # Errors
    /// Returns `ProviderError::Failure` if called twice or if the listener
    /// stopped before a callback arrived.
    pub async fn wait(&mut self) -> Result<CallbackOutcome, ProviderError> {
        let receiver = self
            .outcome
            .take()
            .ok_or_else(|| ProviderError::Failure("callback already consumed".to_string()))?;
        receiver.await.map_err(|_| {
            ProviderError::Failure("callback listener stopped before the redirect".to_string())
        })
    }

    /// Stop serving and wait for the listener task.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            if let Err(err) = handle.await {
                if err.is_panic() {
                    error!(error = %err, "OAuth callback server panicked");
                }
            }
        }
    }
}

impl Drop for OAuthCallbackServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            if !handle.is_finished() {
                handle.abort();
            }
        }
    }
}

async fn handle_callback(
    State(slot): State<OutcomeSlot>,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, Html<&'static str>) {
    let Some(outcome) = CallbackOutcome::from_params(&params) else {
        return (StatusCode::BAD_REQUEST, Html(FAILURE_PAGE));
    };

    let page = if matches!(outcome, CallbackOutcome::Authorized { .. }) {
        SUCCESS_PAGE
    } else {
        FAILURE_PAGE
    };
    if let Some(tx) = slot.lock().take() {
        let _ = tx.send(outcome);
    }
    (StatusCode::OK, Html(page))
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn hit(uri: &str) -> reqwest::StatusCode {
        reqwest::get(uri).await.unwrap().status()
    }

    #[tokio::test]
    async fn test_ephemeral_port_rewrites_redirect_uri() {
        let server = OAuthCallbackServer::start("http://127.0.0.1:0/callback").await.unwrap();

        let uri = Url::parse(server.redirect_uri()).unwrap();
        assert_ne!(uri.port(), Some(0));
        assert_eq!(uri.path(), "/callback");
        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_code_and_state_resolve_the_wait() {
        let mut server = OAuthCallbackServer::start("http://127.0.0.1:0/callback").await.unwrap();
        let base = server.redirect_uri().to_string();

        assert_eq!(hit(&format!("{base}?foo=bar")).await, reqwest::StatusCode::BAD_REQUEST);
        assert_eq!(hit(&format!("{base}?code=abc&state=xyz")).await, reqwest::StatusCode::OK);

        let outcome = server.wait().await.unwrap();
        assert_eq!(
            outcome,
            CallbackOutcome::Authorized { code: "abc".into(), state: "xyz".into() }
        );
        server.shutdown().await;
    }

    #[test]
    fn test_error_parameters() {
        let denied: HashMap<String, String> =
            [("error".to_string(), "access_denied".to_string())].into();
        assert_eq!(CallbackOutcome::from_params(&denied), Some(CallbackOutcome::Denied));

        let failed: HashMap<String, String> = [
            ("error".to_string(), "server_error".to_string()),
            ("error_description".to_string(), "AADSTS50011: redirect mismatch".to_string()),
        ]
        .into();
        assert_eq!(
            CallbackOutcome::from_params(&failed),
            Some(CallbackOutcome::Failed("AADSTS50011: redirect mismatch".into()))
        );
    }
}
