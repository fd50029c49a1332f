//! Why a supervised group shut down.

use std::fmt;

use crate::lifecycle::signals::SignalKind;
use crate::net::ListenerError;

/// The single value chosen to represent why the whole group shut down.
#[derive(Debug)]
pub enum TerminationReason {
    /// Shutdown was requested programmatically and every listener stopped cleanly.
    Completed,
    /// An external termination signal initiated the shutdown.
    Signal(SignalKind),
    /// A listener's run loop failed.
    ListenerFailed {
        listener: String,
        error: ListenerError,
    },
    /// A listener failed to stop cleanly and nothing fatal happened before.
    StopFailed {
        listener: String,
        error: ListenerError,
    },
    /// A supervised task panicked.
    TaskPanicked { task: String },
    /// The outer shutdown deadline elapsed with tasks still pending.
    ShutdownTimedOut { pending: usize },
}

impl TerminationReason {
    /// Returns true if something broke, false if the group was asked to stop.
    pub fn is_failure(&self) -> bool {
        !matches!(
            self,
            TerminationReason::Completed | TerminationReason::Signal(_)
        )
    }
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationReason::Completed => write!(f, "all listeners stopped"),
            TerminationReason::Signal(kind) => write!(f, "received {}", kind),
            TerminationReason::ListenerFailed { listener, error } => {
                write!(f, "listener {} failed: {}", listener, error)
            }
            TerminationReason::StopFailed { listener, error } => {
                write!(f, "listener {} failed to stop: {}", listener, error)
            }
            TerminationReason::TaskPanicked { task } => write!(f, "{} panicked", task),
            TerminationReason::ShutdownTimedOut { pending } => {
                write!(f, "shutdown deadline elapsed with {} tasks pending", pending)
            }
        }
    }
}
