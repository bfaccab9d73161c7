//! API-specific error types
//!
//! Classifies failures of the users REST API so callers can tell a
//! validation problem (show the field messages) from an expired session or
//! an unreachable backend.

use std::time::Duration;

use thiserror::Error;
use userdesk_domain::{FieldErrors, UserDeskError};

/// Categories of API errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorCategory {
    /// 401/403 or no usable token
    Authentication,
    /// 400 with per-field messages
    Validation,
    NotFound,
    /// 5xx
    Server,
    /// Other 4xx and unexpected payloads
    Client,
    /// Connection failures and timeouts
    Network,
    Config,
}

/// Users API errors
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Display text is ready for the user, e.g.
    /// `Failed to save user. Enter a valid email address.`
    #[error("{message}")]
    Validation { message: String, errors: FieldErrors },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Client error: {0}")]
    Client(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),
}

impl ApiError {
    /// Get the error category for this error
    #[must_use]
    pub const fn category(&self) -> ApiErrorCategory {
        match self {
            Self::Auth(_) => ApiErrorCategory::Authentication,
            Self::Validation { .. } => ApiErrorCategory::Validation,
            Self::NotFound(_) => ApiErrorCategory::NotFound,
            Self::Server(_) => ApiErrorCategory::Server,
            Self::Client(_) => ApiErrorCategory::Client,
            Self::Network(_) | Self::Timeout(_) => ApiErrorCategory::Network,
            Self::Config(_) => ApiErrorCategory::Config,
        }
    }
}

impl From<ApiError> for UserDeskError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Auth(message) => Self::Auth(message),
            ApiError::Validation { message, .. } => Self::InvalidInput(message),
            ApiError::NotFound(message) => Self::NotFound(message),
            ApiError::Network(_) | ApiError::Timeout(_) => Self::Network(err.to_string()),
            ApiError::Config(message) => Self::Config(message),
            ApiError::Server(_) | ApiError::Client(_) => Self::Internal(err.to_string()),
        }
    }
}
