//! # UserDesk Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - File-backed key-value storage
//! - The browser-based OAuth identity provider (system browser + loopback
//!   redirect listener)
//! - The users REST client
//! - Configuration loading
//!
//! ## Architecture
//! - Implements traits defined in `userdesk-core`
//! - Depends on `userdesk-common` for the OAuth client
//! - Contains all "impure" code (file system, HTTP, browser)

pub mod api;
pub mod config;
pub mod oauth;
pub mod storage;

// Re-export commonly used items
pub use api::{AccessTokenProvider, ApiError, UserMutation, UsersClient};
pub use oauth::{OAuthIdentityProvider, PopupLauncher, SystemBrowserLauncher};
pub use storage::FileKeyValueStore;
