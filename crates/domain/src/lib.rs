//! # UserDesk Domain
//!
//! Business domain types and models for UserDesk.
//!
//! This crate contains:
//! - Session and authentication types (Session, AuthState, Credentials)
//! - User directory records and the REST envelope
//! - Domain error types and Result definitions
//! - Configuration structures
//! - Domain constants
//!
//! ## Architecture
//! - No dependencies on other UserDesk crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
