//! UI-facing auth signals
//!
//! The controller publishes on a `tokio::broadcast` channel; every
//! subscriber gets its own receiver. Publishing with nobody listening is
//! fine, and a subscriber that lags behind skips the oldest signals.

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::trace;
use userdesk_domain::constants::SIGNAL_CHANNEL_CAPACITY;

/// Signals emitted by the auth controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AuthSignal {
    /// A session exists now, either restored or freshly signed in.
    SessionEstablished { identity: String },
    /// The session was cleared.
    SessionEnded,
    /// Nobody is signed in after startup; show the login surface.
    LoginRequired,
    /// An operation failed; `message` is ready for display.
    AuthError { message: String },
}

impl AuthSignal {
    /// Machine-friendly discriminator.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::SessionEstablished { .. } => "sessionEstablished",
            Self::SessionEnded => "sessionEnded",
            Self::LoginRequired => "loginRequired",
            Self::AuthError { .. } => "authError",
        }
    }
}

/// Broadcast bus for [`AuthSignal`]s.
#[derive(Debug, Clone)]
pub struct SignalBus {
    sender: broadcast::Sender<AuthSignal>,
}

impl SignalBus {
    /// Bus with room for `capacity` unread signals per subscriber.
    ///
    /// A zero capacity is raised to one.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(SIGNAL_CHANNEL_CAPACITY)
    }

    /// Publish to every current subscriber; returns how many received it.
    pub fn emit(&self, signal: AuthSignal) -> usize {
        trace!(signal = signal.kind(), "emitting auth signal");
        self.sender.send(signal).unwrap_or(0)
    }

    /// Receive signals emitted from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<AuthSignal> {
        self.sender.subscribe()
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for SignalBus {
    fn default() -> Self {
        Self::new()
    }
}
