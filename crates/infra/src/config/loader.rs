//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. If `USERDESK_AUTH_STRATEGY` is set, the whole configuration comes from
//!    the environment
//! 2. Otherwise the first config file found is used
//! 3. With neither, built-in defaults apply (local strategy, `admin`/`admin`)
//!
//! The result is validated before it is returned.
//!
//! ## Environment Variables
//! - `USERDESK_AUTH_STRATEGY`: `local` or `delegated`
//! - `USERDESK_LOCAL_USERNAME`, `USERDESK_LOCAL_PASSWORD`: local credential pair
//! - `USERDESK_CLIENT_ID`, `USERDESK_AUTHORITY`: required for `delegated`
//! - `USERDESK_REDIRECT_URI`: OAuth redirect URI
//! - `USERDESK_SCOPES`: comma- or space-separated resource scopes
//! - `USERDESK_POST_LOGOUT_REDIRECT_URI`: where sign-out returns to
//! - `USERDESK_INTERACTIVE_TIMEOUT_SECS`: bound on sign-in windows
//! - `USERDESK_API_BASE_URL`, `USERDESK_USERS_PATH`, `USERDESK_API_TIMEOUT_SECS`
//! - `USERDESK_STORAGE_PATH`: key-value store file
//!
//! ## File Locations
//! `userdesk.{toml,json}` then `config.{toml,json}`, looked up in the
//! current directory, its two parents, and the same places relative to the
//! executable.

use std::path::{Path, PathBuf};

use userdesk_domain::constants::{
    DEFAULT_LOCAL_PASSWORD, DEFAULT_LOCAL_USERNAME, DEFAULT_OAUTH_SCOPE, DEFAULT_REDIRECT_URI,
};
use userdesk_domain::{ApiConfig, AppConfig, AuthConfig, Result, StorageConfig, UserDeskError};

const CONFIG_FILE_NAMES: [&str; 4] =
    ["userdesk.toml", "userdesk.json", "config.toml", "config.json"];

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns `UserDeskError::Config` if the selected source is invalid. A
/// missing config file is not an error.
pub fn load() -> Result<AppConfig> {
    if std::env::var_os("USERDESK_AUTH_STRATEGY").is_some() {
        let config = load_from_env()?;
        tracing::info!(strategy = %config.auth.kind(), "Configuration loaded from environment variables");
        return Ok(config);
    }

    match search_config_paths() {
        Some(path) => load_from_file(Some(path)),
        None => {
            tracing::info!("No config file found, using built-in defaults");
            Ok(AppConfig::default())
        }
    }
}

/// Load configuration from environment variables
///
/// `USERDESK_AUTH_STRATEGY` is required; every other variable has the same
/// default as the file format.
///
/// # Errors
/// Returns `UserDeskError::Config` if required variables are missing or
/// have invalid values.
pub fn load_from_env() -> Result<AppConfig> {
    let auth = match env_var("USERDESK_AUTH_STRATEGY")?.to_ascii_lowercase().as_str() {
        "local" => AuthConfig::Local {
            username: env_opt("USERDESK_LOCAL_USERNAME")
                .unwrap_or_else(|| DEFAULT_LOCAL_USERNAME.to_string()),
            password: env_opt("USERDESK_LOCAL_PASSWORD")
                .unwrap_or_else(|| DEFAULT_LOCAL_PASSWORD.to_string()),
        },
        "delegated" => AuthConfig::Delegated {
            client_id: env_var("USERDESK_CLIENT_ID")?,
            authority: env_var("USERDESK_AUTHORITY")?,
            redirect_uri: env_opt("USERDESK_REDIRECT_URI")
                .unwrap_or_else(|| DEFAULT_REDIRECT_URI.to_string()),
            scopes: env_opt("USERDESK_SCOPES").map_or_else(
                || vec![DEFAULT_OAUTH_SCOPE.to_string()],
                |raw| split_scopes(&raw),
            ),
            post_logout_redirect_uri: env_opt("USERDESK_POST_LOGOUT_REDIRECT_URI"),
            interactive_timeout_secs: env_opt("USERDESK_INTERACTIVE_TIMEOUT_SECS")
                .map(|raw| parse_u64("USERDESK_INTERACTIVE_TIMEOUT_SECS", &raw))
                .transpose()?,
        },
        other => {
            return Err(UserDeskError::Config(format!(
                "Unknown auth strategy '{other}' (expected 'local' or 'delegated')"
            )))
        }
    };

    let api_defaults = ApiConfig::default();
    let api = ApiConfig {
        base_url: env_opt("USERDESK_API_BASE_URL").unwrap_or(api_defaults.base_url),
        users_path: env_opt("USERDESK_USERS_PATH").unwrap_or(api_defaults.users_path),
        timeout_secs: env_opt("USERDESK_API_TIMEOUT_SECS")
            .map(|raw| parse_u64("USERDESK_API_TIMEOUT_SECS", &raw))
            .transpose()?
            .unwrap_or(api_defaults.timeout_secs),
    };

    let storage = env_opt("USERDESK_STORAGE_PATH")
        .map_or_else(StorageConfig::default, |path| StorageConfig { path: PathBuf::from(path) });

    let config = AppConfig { api, auth, storage };
    config.validate()?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, searches the standard locations. Supports JSON and
/// TOML (detected by file extension).
///
/// # Errors
/// Returns `UserDeskError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid or a value fails validation
pub fn load_from_file(path: Option<PathBuf>) -> Result<AppConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(UserDeskError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => search_config_paths().ok_or_else(|| {
            UserDeskError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| UserDeskError::Config(format!("Failed to read config file: {e}")))?;

    let config = parse_config(&contents, &config_path)?;
    config.validate()?;
    Ok(config)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
///
/// # Errors
/// Returns `UserDeskError::Config` if format is invalid or parsing fails.
pub fn parse_config(contents: &str, path: &Path) -> Result<AppConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| UserDeskError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| UserDeskError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(UserDeskError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Search multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
#[must_use]
pub fn search_config_paths() -> Option<PathBuf> {
    let mut roots = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        roots.extend([cwd.clone(), cwd.join(".."), cwd.join("../..")]);
    }
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            roots.extend([exe_dir.to_path_buf(), exe_dir.join(".."), exe_dir.join("../..")]);
        }
    }

    roots
        .iter()
        .flat_map(|root| CONFIG_FILE_NAMES.iter().map(move |name| root.join(name)))
        .find(|path| path.exists())
}

/// Get required environment variable
///
/// # Errors
/// Returns `UserDeskError::Config` if the variable is not set.
fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        UserDeskError::Config(format!("Missing required environment variable: {key}"))
    })
}

/// Optional variable; blank counts as unset.
fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u64(key: &str, raw: &str) -> Result<u64> {
    raw.trim()
        .parse::<u64>()
        .map_err(|e| UserDeskError::Config(format!("Invalid value for {key}: {e}")))
}

fn split_scopes(raw: &str) -> Vec<String> {
    raw.split([',', ' '])
        .map(str::trim)
        .filter(|scope| !scope.is_empty())
        .map(str::to_string)
        .collect()
}
