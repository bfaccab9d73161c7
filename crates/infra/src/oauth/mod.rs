//! Delegated sign-in adapter
//!
//! ```text
//! OAuthIdentityProvider
//!   ├── OAuthClientTrait      (authorize URL, code/refresh grants)
//!   ├── PopupLauncher         (system browser)
//!   ├── OAuthCallbackServer   (loopback redirect target)
//!   └── KeyValueStore         (account + token cache)
//! ```

pub mod callback_server;
pub mod launcher;
pub mod provider;

pub use callback_server::{CallbackOutcome, OAuthCallbackServer};
pub use launcher::{PopupLauncher, SystemBrowserLauncher};
pub use provider::OAuthIdentityProvider;
