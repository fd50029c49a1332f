//! The listener contract supervised by the lifecycle subsystem.
//!
//! # Responsibilities
//! - Define the start/stop shape every supervised service exposes
//! - Separate "stopped because asked to" from "failed" at the type level
//! - Describe the observable lifecycle states of a listener
//!
//! # Design Decisions
//! - `start` blocks (awaits) for the whole life of the service
//! - `stop` is bounded by the listener's own grace period
//! - Identity is the bind address, unique within a group

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;

/// Error type for listener operations.
#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    /// The configured bind address could not be parsed.
    #[error("invalid bind address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    /// Failed to bind to address.
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// The serve loop returned an I/O error.
    #[error("serve loop on {address} failed: {source}")]
    Serve {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// In-flight work did not drain in time and was cut off.
    #[error("{address} did not drain within {grace:?}, in-flight requests were terminated")]
    GracePeriodElapsed { address: String, grace: Duration },

    /// Failure reported by a listener implemented outside this crate.
    #[error("{0}")]
    Other(String),
}

/// How a listener's run loop ended.
#[derive(Debug)]
pub enum RunOutcome {
    /// The listener halted because `stop` was requested.
    StoppedByRequest,
    /// The listener failed on its own; fatal to the group.
    Failed(ListenerError),
}

/// Lifecycle state of a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    /// Created but `start` has not bound anything yet.
    NotStarted,
    /// Accepting connections.
    Running,
    /// Stop requested, draining in-flight work.
    Stopping,
    /// Halted. Terminal.
    Stopped,
}

impl fmt::Display for ListenerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ListenerState::NotStarted => "not-started",
            ListenerState::Running => "running",
            ListenerState::Stopping => "stopping",
            ListenerState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// A long-running bound network service with a start/stop lifecycle.
///
/// `start` and `stop` are called from two different tasks: the supervisor
/// runs `start` on one and calls `stop` from a watcher once shutdown fires.
/// `stop` may be invoked before `start` has made any progress; an
/// implementation must then make `start` return promptly.
#[async_trait]
pub trait Listener: Send + Sync {
    /// Identity of this listener (its bind address).
    fn id(&self) -> &str;

    /// Run until stopped or failed.
    async fn start(&self) -> RunOutcome;

    /// Request an orderly halt and wait for it, bounded by a grace period.
    async fn stop(&self) -> Result<(), ListenerError>;
}
