//! Test doubles for the auth ports.
//!
//! Available to this crate's tests and, with the `test-utils` feature, to
//! downstream crates.

mod identity;
mod signals;
mod store;

pub use identity::{LoginHold, MockIdentityProvider, ProviderCalls};
pub use signals::RecordingSignals;
pub use store::MemoryKeyValueStore;
