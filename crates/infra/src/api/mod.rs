//! Users backend client
//!
//! - [`client`]: `UsersClient` CRUD calls and envelope parsing
//! - [`auth`]: `AccessTokenProvider` seam, implemented by the auth controller
//! - [`errors`]: `ApiError` classification

pub mod auth;
pub mod client;
pub mod errors;

pub use auth::AccessTokenProvider;
pub use client::{UserMutation, UsersClient};
pub use errors::{ApiError, ApiErrorCategory};
