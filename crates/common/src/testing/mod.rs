//! Test doubles for the OAuth layer.
//!
//! Compiled for this crate's tests and, through the `test-utils` feature,
//! for downstream crates.

pub mod mocks;

pub use mocks::{id_token_for, MockOAuthClient};
