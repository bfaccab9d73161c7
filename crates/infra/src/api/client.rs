//! Users REST client
//!
//! CRUD over the backend's `users` collection. Every response is wrapped in
//! the `{ success, data, message, errors }` envelope; failed saves carry
//! per-field messages under `errors`.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};
use userdesk_domain::{ApiConfig, ApiEnvelope, UserInput, UserRecord};

use super::auth::AccessTokenProvider;
use super::errors::ApiError;

const SAVE_FAILED: &str = "Failed to save user";
const SAVED: &str = "User saved successfully!";
const DELETED: &str = "User deleted successfully!";

/// Result of a create or update call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserMutation {
    /// Stored record, when the backend echoes it.
    pub user: Option<UserRecord>,
    /// Message to show the user.
    pub message: String,
}

/// Client for the users collection
pub struct UsersClient {
    http: reqwest::Client,
    users_url: String,
    timeout: Duration,
    auth: Arc<dyn AccessTokenProvider>,
}

impl UsersClient {
    /// Create a client for `config.users_url()`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Config` if the HTTP client cannot be built.
    pub fn new(config: &ApiConfig, auth: Arc<dyn AccessTokenProvider>) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ApiError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { http, users_url: config.users_url(), timeout: config.timeout(), auth })
    }

    /// List all users.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the backend rejects it
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<UserRecord>, ApiError> {
        let envelope: ApiEnvelope<Vec<UserRecord>> =
            self.send(Method::GET, &self.users_url, None, "Failed to fetch users").await?;
        let users = envelope.data.unwrap_or_default();
        info!(count = users.len(), "users loaded");
        Ok(users)
    }

    /// Fetch one user.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for an unknown id
    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> Result<UserRecord, ApiError> {
        let envelope: ApiEnvelope<UserRecord> =
            self.send(Method::GET, &self.user_url(id), None, "Failed to fetch user details").await?;
        envelope
            .data
            .ok_or_else(|| ApiError::Client("user response carried no data".to_string()))
    }

    /// Create a user.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` with the backend's field messages when
    /// the input is rejected
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn create(&self, input: &UserInput) -> Result<UserMutation, ApiError> {
        let envelope = self.send(Method::POST, &self.users_url, Some(input), SAVE_FAILED).await?;
        Ok(mutation(envelope))
    }

    /// Replace a user's fields.
    ///
    /// # Errors
    ///
    /// Same as [`Self::create`], plus `ApiError::NotFound` for an unknown id
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn update(&self, id: i64, input: &UserInput) -> Result<UserMutation, ApiError> {
        let envelope = self.send(Method::PUT, &self.user_url(id), Some(input), SAVE_FAILED).await?;
        Ok(mutation(envelope))
    }

    /// Delete a user and return the confirmation message.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the backend rejects it
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<String, ApiError> {
        let envelope: ApiEnvelope<serde_json::Value> =
            self.send(Method::DELETE, &self.user_url(id), None, "Failed to delete user").await?;
        Ok(envelope.message.unwrap_or_else(|| DELETED.to_string()))
    }

    fn user_url(&self, id: i64) -> String {
        format!("{}/{id}/", self.users_url.trim_end_matches('/'))
    }

    async fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder, ApiError> {
        Ok(match self.auth.access_token().await? {
            Some(token) => request.bearer_auth(token),
            None => request,
        })
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        body: Option<&UserInput>,
        failure: &str,
    ) -> Result<ApiEnvelope<T>, ApiError> {
        debug!(%method, url = %url, "users API request");

        let mut request = self.http.request(method, url).header("Content-Type", "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }
        let request = self.authorize(request).await?;

        let response = request.send().await.map_err(|e| self.map_transport_error(&e))?;
        let status = response.status();
        let text = response.text().await.map_err(|e| self.map_transport_error(&e))?;

        if !status.is_success() {
            let err = map_status_error(status, failure, &text);
            warn!(status = %status, error = %err, "users API request failed");
            return Err(err);
        }

        if text.trim().is_empty() {
            return Ok(ApiEnvelope { success: None, data: None, message: None, errors: None });
        }
        let envelope: ApiEnvelope<T> = serde_json::from_str(&text)
            .map_err(|e| ApiError::Client(format!("Failed to parse response: {e}")))?;
        if envelope.success == Some(false) {
            return Err(ApiError::Client(
                envelope.message.unwrap_or_else(|| failure.to_string()),
            ));
        }
        Ok(envelope)
    }

    fn map_transport_error(&self, err: &reqwest::Error) -> ApiError {
        if err.is_timeout() {
            ApiError::Timeout(self.timeout)
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

fn mutation(envelope: ApiEnvelope<UserRecord>) -> UserMutation {
    UserMutation {
        message: envelope.message.unwrap_or_else(|| SAVED.to_string()),
        user: envelope.data,
    }
}

/// Message fields a non-envelope error body may carry (`{"detail": ...}`).
#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    detail: Option<String>,
}

fn map_status_error(status: StatusCode, failure: &str, body: &str) -> ApiError {
    if status == StatusCode::BAD_REQUEST {
        if let Ok(envelope) = serde_json::from_str::<ApiEnvelope<serde_json::Value>>(body) {
            let joined = envelope.joined_errors().unwrap_or_default();
            return ApiError::Validation {
                message: format!("{failure}. {joined}"),
                errors: envelope.errors.unwrap_or_default(),
            };
        }
    }

    let detail = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|body| body.detail.or(body.message))
        .unwrap_or_else(|| status.to_string());
    let message = format!("{failure}: {detail}");

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        ApiError::Auth(message)
    } else if status == StatusCode::NOT_FOUND {
        ApiError::NotFound(message)
    } else if status.is_server_error() {
        ApiError::Server(message)
    } else {
        ApiError::Client(message)
    }
}
