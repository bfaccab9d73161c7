//! Configuration management
//!
//! The authentication section is chosen once at startup and never mutated
//! afterwards; it decides which strategy the controller is built with.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::constants::{
    DEFAULT_API_BASE_URL, DEFAULT_API_TIMEOUT_SECS, DEFAULT_INTERACTIVE_TIMEOUT_SECS,
    DEFAULT_LOCAL_PASSWORD, DEFAULT_LOCAL_USERNAME, DEFAULT_OAUTH_SCOPE, DEFAULT_REDIRECT_URI, DEFAULT_STORAGE_FILE,
    DEFAULT_USERS_PATH,
};
use crate::errors::{Result, UserDeskError};
use crate::types::StrategyKind;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

impl AppConfig {
    /// Validate every section.
    ///
    /// # Errors
    /// Returns `UserDeskError::Config` describing the first invalid value.
    pub fn validate(&self) -> Result<()> {
        self.api.validate()?;
        self.auth.validate()
    }
}

/// REST backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_users_path")]
    pub users_path: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ApiConfig {
    fn validate(&self) -> Result<()> {
        let is_http = Url::parse(&self.base_url)
            .is_ok_and(|url| matches!(url.scheme(), "http" | "https") && url.has_host());
        if !is_http {
            return Err(UserDeskError::Config(format!(
                "api.base_url must be an http(s) URL, got '{}'",
                self.base_url
            )));
        }
        if self.timeout_secs == 0 {
            return Err(UserDeskError::Config("api.timeout_secs must be positive".to_string()));
        }
        Ok(())
    }

    /// Collection URL, e.g. `http://localhost:8000/api/users/`.
    #[must_use]
    pub fn users_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.users_path)
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            users_path: default_users_path(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Strategy selection plus its parameters.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum AuthConfig {
    /// Static credential pair. Demo-grade: compared with plain string
    /// equality on the client.
    Local {
        #[serde(default = "default_username")]
        username: String,
        #[serde(default = "default_password", skip_serializing)]
        password: String,
    },
    /// Popup-based OAuth against an external identity provider.
    Delegated {
        client_id: String,
        authority: String,
        #[serde(default = "default_redirect_uri")]
        redirect_uri: String,
        #[serde(default = "default_scopes")]
        scopes: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        post_logout_redirect_uri: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        interactive_timeout_secs: Option<u64>,
    },
}

impl AuthConfig {
    #[must_use]
    pub const fn kind(&self) -> StrategyKind {
        match self {
            Self::Local { .. } => StrategyKind::Local,
            Self::Delegated { .. } => StrategyKind::Delegated,
        }
    }

    /// Reject configurations no strategy could work with.
    ///
    /// # Errors
    /// Returns `UserDeskError::Config` naming the offending field.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Local { username, .. } => {
                if username.is_empty() {
                    return Err(UserDeskError::Config("auth.username must not be empty".into()));
                }
            }
            Self::Delegated {
                client_id, authority, redirect_uri, scopes, interactive_timeout_secs, ..
            } => {
                if *interactive_timeout_secs == Some(0) {
                    return Err(UserDeskError::Config(
                        "auth.interactive_timeout_secs must be greater than zero".into(),
                    ));
                }
                if client_id.trim().is_empty() {
                    return Err(UserDeskError::Config("auth.client_id must not be empty".into()));
                }
                if authority.trim().is_empty() {
                    return Err(UserDeskError::Config("auth.authority must not be empty".into()));
                }
                if url_origin(redirect_uri).is_none() {
                    return Err(UserDeskError::Config(format!(
                        "auth.redirect_uri is not an absolute URL: '{redirect_uri}'"
                    )));
                }
                if scopes.iter().all(|scope| scope.trim().is_empty()) {
                    return Err(UserDeskError::Config("auth.scopes must not be empty".into()));
                }
            }
        }
        Ok(())
    }

    /// Where the provider sends the browser after sign-out: the configured
    /// value, else the redirect URI's origin. `None` for the local strategy.
    #[must_use]
    pub fn post_logout_redirect_uri(&self) -> Option<String> {
        match self {
            Self::Local { .. } => None,
            Self::Delegated { post_logout_redirect_uri: Some(uri), .. } => Some(uri.clone()),
            Self::Delegated { redirect_uri, .. } => url_origin(redirect_uri),
        }
    }

    /// Bound on popup flows: the configured value, else
    /// [`DEFAULT_INTERACTIVE_TIMEOUT_SECS`]. `None` for the local strategy.
    #[must_use]
    pub fn interactive_timeout(&self) -> Option<Duration> {
        match self {
            Self::Local { .. } => None,
            Self::Delegated { interactive_timeout_secs, .. } => Some(Duration::from_secs(
                interactive_timeout_secs.unwrap_or(DEFAULT_INTERACTIVE_TIMEOUT_SECS),
            )),
        }
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local { username, .. } => f
                .debug_struct("Local")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            Self::Delegated {
                client_id,
                authority,
                redirect_uri,
                scopes,
                post_logout_redirect_uri,
                interactive_timeout_secs,
            } => f
                .debug_struct("Delegated")
                .field("client_id", client_id)
                .field("authority", authority)
                .field("redirect_uri", redirect_uri)
                .field("scopes", scopes)
                .field("post_logout_redirect_uri", post_logout_redirect_uri)
                .field("interactive_timeout_secs", interactive_timeout_secs)
                .finish(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self::Local { username: default_username(), password: default_password() }
    }
}

/// Durable key-value storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { path: default_storage_path() }
    }
}

/// `scheme://host[:port]` of an absolute URL; `None` for opaque origins.
fn url_origin(url: &str) -> Option<String> {
    let origin = Url::parse(url).ok()?.origin();
    origin.is_tuple().then(|| origin.ascii_serialization())
}

fn default_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_users_path() -> String {
    DEFAULT_USERS_PATH.to_string()
}

const fn default_timeout_secs() -> u64 {
    DEFAULT_API_TIMEOUT_SECS
}

fn default_username() -> String {
    DEFAULT_LOCAL_USERNAME.to_string()
}

fn default_password() -> String {
    DEFAULT_LOCAL_PASSWORD.to_string()
}

fn default_redirect_uri() -> String {
    DEFAULT_REDIRECT_URI.to_string()
}

fn default_scopes() -> Vec<String> {
    vec![DEFAULT_OAUTH_SCOPE.to_string()]
}

fn default_storage_path() -> PathBuf {
    PathBuf::from(DEFAULT_STORAGE_FILE)
}
