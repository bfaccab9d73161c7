//! Session and authentication types
//!
//! A [`Session`] exists only while someone is signed in and is owned by the
//! auth controller. Everything here is plain data; the state machine lives in
//! `userdesk-core`.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which authentication strategy is active for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Popup-based OAuth against an external identity provider.
    Delegated,
    /// Static username/password comparison with a persisted marker.
    Local,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Delegated => f.write_str("delegated"),
            Self::Local => f.write_str("local"),
        }
    }
}

/// Lifecycle of the auth controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthState {
    Uninitialized,
    Unauthenticated,
    Authenticating,
    Authenticated,
}

impl AuthState {
    /// Stable states are the ones every operation settles in.
    #[must_use]
    pub const fn is_stable(self) -> bool {
        matches!(self, Self::Unauthenticated | Self::Authenticated)
    }
}

impl fmt::Display for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Uninitialized => "uninitialized",
            Self::Unauthenticated => "unauthenticated",
            Self::Authenticating => "authenticating",
            Self::Authenticated => "authenticated",
        };
        f.write_str(label)
    }
}

/// In-memory record of the currently authenticated identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Display name or username shown by the UI.
    pub identity: String,
    /// Strategy that produced this session.
    pub strategy_kind: StrategyKind,
}

impl Session {
    /// Create a session for `identity` under `strategy_kind`.
    #[must_use]
    pub fn new(identity: impl Into<String>, strategy_kind: StrategyKind) -> Self {
        Self { identity: identity.into(), strategy_kind }
    }
}

/// Username/password pair submitted to the local strategy.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self { username: username.into(), password: password.into() }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Account known to the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderAccount {
    /// Stable provider-side identifier (`oid`/`sub` claim).
    pub home_account_id: String,
    /// Sign-in name (`preferred_username` or `email`).
    pub username: String,
    /// Human readable name, when the provider supplied one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ProviderAccount {
    /// Name shown in the UI: the display name, falling back to the username.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().filter(|name| !name.is_empty()).unwrap_or(&self.username)
    }
}

/// Opaque bearer credential forwarded to the backend.
///
/// The controller never looks inside; it only requests and forwards it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    secret: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    #[must_use]
    pub fn new(secret: impl Into<String>, expires_at: Option<DateTime<Utc>>) -> Self {
        Self { secret: secret.into(), expires_at }
    }

    /// Raw bearer value for the `Authorization` header.
    #[must_use]
    pub fn secret(&self) -> &str {
        &self.secret
    }

    #[must_use]
    pub const fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("secret", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
