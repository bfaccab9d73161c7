//! # UserDesk Application
//!
//! Application layer - commands and main entry point.
//!
//! This crate contains:
//! - Commands (front-end → backend bridge)
//! - Application context (dependency injection)
//! - Logging bootstrap
//!
//! ## Architecture
//! - Depends on `domain`, `core`, `infra` and `common`
//! - Wires up the hexagonal architecture
//! - The `userdesk` binary is a console front-end over the commands

pub mod commands;
pub mod console;
pub mod context;
pub mod utils;

// Re-export for convenience
pub use commands::*;
pub use context::*;
