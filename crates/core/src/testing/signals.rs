use parking_lot::Mutex;
use tokio::sync::broadcast::error::TryRecvError;
use tokio::sync::broadcast::Receiver;

use crate::auth::signals::{AuthSignal, SignalBus};

/// Collects signals published on a bus since it was attached.
#[derive(Debug)]
pub struct RecordingSignals {
    receiver: Mutex<Receiver<AuthSignal>>,
}

impl RecordingSignals {
    #[must_use]
    pub fn attach(bus: &SignalBus) -> Self {
        Self { receiver: Mutex::new(bus.subscribe()) }
    }

    /// Everything received since the last call, oldest first.
    #[must_use]
    pub fn take(&self) -> Vec<AuthSignal> {
        let mut receiver = self.receiver.lock();
        let mut signals = Vec::new();
        loop {
            match receiver.try_recv() {
                Ok(signal) => signals.push(signal),
                Err(TryRecvError::Lagged(_)) => continue,
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
        signals
    }

    /// Number of signals of the given kind in `signals`.
    #[must_use]
    pub fn count(signals: &[AuthSignal], kind: &str) -> usize {
        signals.iter().filter(|signal| signal.kind() == kind).count()
    }
}
