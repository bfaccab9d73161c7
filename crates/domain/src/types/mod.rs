//! Domain types and models

pub mod session;
pub mod user;

pub use session::{
    AccessToken, AuthState, Credentials, ProviderAccount, Session, StrategyKind,
};
pub use user::{ApiEnvelope, FieldErrors, UserInput, UserRecord};
