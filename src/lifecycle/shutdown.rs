//! Shutdown coordination for a supervised group.

use std::sync::{Arc, Mutex, PoisonError};

use tokio_util::sync::CancellationToken;

use crate::lifecycle::reason::TerminationReason;

/// Coordinator for graceful shutdown.
///
/// A one-shot broadcast: once triggered it stays triggered, and every
/// current and future waiter observes it. Clones share the same state.
/// The first fatal reason recorded through [`Shutdown::trigger_with`] is
/// kept; later ones are dropped.
#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    token: CancellationToken,
    reason: Arc<Mutex<Option<TerminationReason>>>,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Trigger the shutdown signal without recording a reason.
    pub fn trigger(&self) {
        self.token.cancel();
    }

    /// Record `reason` if none was recorded yet, then trigger.
    ///
    /// Returns true if `reason` became the group's termination reason.
    pub fn trigger_with(&self, reason: TerminationReason) -> bool {
        let recorded = {
            let mut slot = self.reason.lock().unwrap_or_else(PoisonError::into_inner);
            if slot.is_none() {
                *slot = Some(reason);
                true
            } else {
                tracing::debug!(%reason, "Termination reason already recorded, discarding");
                false
            }
        };
        self.token.cancel();
        recorded
    }

    /// Whether shutdown has been triggered.
    pub fn is_triggered(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Wait until shutdown is triggered. Returns immediately if it already was.
    pub async fn triggered(&self) {
        self.token.cancelled().await
    }

    /// Take the recorded termination reason, if any.
    pub fn take_reason(&self) -> Option<TerminationReason> {
        self.reason
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}
