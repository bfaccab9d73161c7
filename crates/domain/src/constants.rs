//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! application.

/// Storage key of the persisted login marker written by the local strategy.
pub const LOCAL_LOGIN_MARKER_KEY: &str = "simpleAuthUser";

/// Storage key under which the OAuth adapter caches accounts and tokens.
pub const OAUTH_ACCOUNT_CACHE_KEY: &str = "oauth.accounts";

// Local strategy defaults (demo credentials)
pub const DEFAULT_LOCAL_USERNAME: &str = "admin";
pub const DEFAULT_LOCAL_PASSWORD: &str = "admin";

// Delegated strategy defaults
pub const DEFAULT_OAUTH_SCOPE: &str = "User.Read";
pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:3000";

/// Seconds a sign-in window may stay open before the flow is abandoned.
pub const DEFAULT_INTERACTIVE_TIMEOUT_SECS: u64 = 300;

/// Seconds before expiry at which a cached access token is considered stale.
pub const TOKEN_REFRESH_THRESHOLD_SECS: i64 = 300;

// REST backend defaults
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_USERS_PATH: &str = "/users/";
pub const DEFAULT_API_TIMEOUT_SECS: u64 = 30;

// Storage defaults
pub const DEFAULT_STORAGE_FILE: &str = "userdesk-storage.json";

/// Capacity of the auth signal broadcast channel.
pub const SIGNAL_CHANNEL_CAPACITY: usize = 64;
