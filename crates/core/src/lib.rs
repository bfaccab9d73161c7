//! # UserDesk Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - The authentication state machine (`AuthController`)
//! - The two authentication strategies (delegated OAuth, local credentials)
//! - Port interfaces the strategies depend on (identity provider, key-value
//!   storage)
//! - The signal bus UI subscribers listen on
//!
//! ## Architecture Principles
//! - Only depends on `userdesk-domain`
//! - No HTTP, browser or file-system code
//! - All external dependencies via traits

pub mod auth;

#[cfg(any(feature = "test-utils", test))]
pub mod testing;

pub use auth::controller::AuthController;
pub use auth::delegated::DelegatedOAuthStrategy;
pub use auth::local::LocalCredentialStrategy;
pub use auth::ports::{AuthStrategy, IdentityProvider, KeyValueStore};
pub use auth::signals::{AuthSignal, SignalBus};
