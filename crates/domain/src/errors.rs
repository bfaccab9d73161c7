//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for UserDesk
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum UserDeskError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    /// Rejected because of the current session state. No auth signal
    /// reports these.
    #[error("{0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for UserDesk operations
pub type Result<T> = std::result::Result<T, UserDeskError>;

/// Errors produced by the authentication controller and its strategies.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Submitted credentials did not match the configured pair.
    #[error("invalid username or password")]
    InvalidCredentials,

    /// The local strategy was asked to log in without credentials.
    #[error("username and password are required")]
    MissingCredentials,

    /// The provider needs user interaction; recoverable by one interactive
    /// retry.
    #[error("interaction required: {0}")]
    InteractionRequired(String),

    /// Any other identity-provider failure. Not retried automatically.
    #[error("identity provider failure: {0}")]
    ProviderFailure(String),

    /// The user closed or denied the interactive window.
    #[error("sign-in was cancelled")]
    Cancelled,

    /// A token was requested while nobody is signed in.
    #[error("no user is signed in")]
    NoSession,

    /// Another login/logout/initialize call is still pending.
    #[error("another authentication operation is in progress")]
    OperationInProgress,

    /// The operation is not valid from the controller's current state.
    #[error("cannot {operation} while {state}")]
    InvalidState {
        /// Operation that was attempted.
        operation: &'static str,
        /// State the controller was in.
        state: String,
    },

    /// Durable storage could not be read or written.
    #[error("storage error: {0}")]
    Storage(String),
}

impl AuthError {
    /// Display-ready message carried by the `authError` signal.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidCredentials => "Invalid username or password.".to_string(),
            Self::MissingCredentials => "Please enter a username and password.".to_string(),
            Self::InteractionRequired(detail) | Self::ProviderFailure(detail) => detail.clone(),
            Self::Cancelled => "Sign-in was cancelled.".to_string(),
            Self::NoSession => "No user is signed in.".to_string(),
            Self::OperationInProgress => {
                "Another sign-in operation is still in progress.".to_string()
            }
            Self::InvalidState { .. } | Self::Storage(_) => {
                let mut message = self.to_string();
                if let Some(first) = message.get_mut(0..1) {
                    first.make_ascii_uppercase();
                }
                message
            }
        }
    }
}

impl From<ProviderError> for AuthError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::InteractionRequired(detail) => Self::InteractionRequired(detail),
            ProviderError::Cancelled => Self::Cancelled,
            ProviderError::Failure(detail) => Self::ProviderFailure(detail),
        }
    }
}

impl From<AuthError> for UserDeskError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Storage(msg) => Self::Storage(msg),
            AuthError::OperationInProgress | AuthError::InvalidState { .. } => {
                Self::Conflict(err.user_message())
            }
            other => Self::Auth(other.to_string()),
        }
    }
}

/// Errors reported by the external identity-provider client.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// Silent acquisition is impossible without user interaction.
    #[error("interaction required: {0}")]
    InteractionRequired(String),

    /// The interactive window was closed before completing.
    #[error("user cancelled the interactive flow")]
    Cancelled,

    /// Any other provider failure.
    #[error("{0}")]
    Failure(String),
}

impl ProviderError {
    /// Whether the provider asked for an interactive retry.
    #[must_use]
    pub const fn is_interaction_required(&self) -> bool {
        matches!(self, Self::InteractionRequired(_))
    }
}
