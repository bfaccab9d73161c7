//! Common utilities shared across UserDesk crates.
//!
//! Currently this is the OAuth 2.0 + PKCE layer used by the delegated
//! sign-in adapter: endpoint configuration, token types, PKCE helpers and
//! the HTTP client for the authorization-code and refresh-token grants.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod auth;

#[cfg(any(feature = "test-utils", test))]
pub mod testing;

pub use auth::{OAuthClient, OAuthClientError, OAuthClientTrait, OAuthConfig, TokenSet};
