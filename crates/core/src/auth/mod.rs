//! Authentication: session state machine, strategies and their ports.
//!
//! ```text
//!  UI ──► AuthController ──► dyn AuthStrategy ─┬─► DelegatedOAuthStrategy ──► dyn IdentityProvider
//!              │                               └─► LocalCredentialStrategy ──► dyn KeyValueStore
//!              └──► SignalBus ──► subscribers
//! ```
//!
//! Exactly one strategy is chosen when the controller is built and stays
//! fixed for the process lifetime.

pub mod controller;
pub mod delegated;
pub mod local;
pub mod ports;
pub mod signals;
