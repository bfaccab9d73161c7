//! Commands - the front-end to backend bridge
//!
//! Each command takes the shared [`AppContext`](crate::AppContext), runs
//! through [`execute_command`](crate::utils::command_helpers::execute_command)
//! and reports failures as `UserDeskError`.

pub mod auth;
pub mod users;

pub use auth::*;
pub use users::*;
