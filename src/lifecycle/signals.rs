//! Termination signal handling.
//!
//! # Responsibilities
//! - Abstract "termination requested" behind [`SignalSource`]
//! - Deliver SIGINT/SIGTERM from the OS, or synthetic signals in tests
//! - Bridge the first signal into the group's shutdown
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - The supervisor never touches OS signals directly; a source is injected
//! - A second signal can optionally force shutdown

use std::fmt;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::lifecycle::reason::TerminationReason;
use crate::lifecycle::shutdown::Shutdown;

/// Kind of termination request delivered by a [`SignalSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    /// SIGINT / Ctrl-C.
    Interrupt,
    /// SIGTERM.
    Terminate,
    /// Raised through a [`SignalTrigger`].
    Manual,
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SignalKind::Interrupt => "SIGINT",
            SignalKind::Terminate => "SIGTERM",
            SignalKind::Manual => "manual termination request",
        };
        f.write_str(name)
    }
}

/// Source of external termination requests.
#[async_trait]
pub trait SignalSource: Send + 'static {
    /// Wait for the next termination request.
    ///
    /// `None` means the source is closed and will never deliver again.
    async fn recv(&mut self) -> Option<SignalKind>;
}

/// Termination requests delivered by the operating system.
pub struct OsSignals {
    #[cfg(unix)]
    interrupt: tokio::signal::unix::Signal,
    #[cfg(unix)]
    terminate: tokio::signal::unix::Signal,
}

impl OsSignals {
    /// Register the process signal handlers.
    #[cfg(unix)]
    pub fn install() -> std::io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind as UnixSignal};

        Ok(Self {
            interrupt: signal(UnixSignal::interrupt())?,
            terminate: signal(UnixSignal::terminate())?,
        })
    }

    /// Register the process signal handlers.
    #[cfg(not(unix))]
    pub fn install() -> std::io::Result<Self> {
        Ok(Self {})
    }
}

#[async_trait]
impl SignalSource for OsSignals {
    #[cfg(unix)]
    async fn recv(&mut self) -> Option<SignalKind> {
        tokio::select! {
            received = self.interrupt.recv() => received.map(|_| SignalKind::Interrupt),
            received = self.terminate.recv() => received.map(|_| SignalKind::Terminate),
        }
    }

    #[cfg(not(unix))]
    async fn recv(&mut self) -> Option<SignalKind> {
        tokio::signal::ctrl_c()
            .await
            .ok()
            .map(|_| SignalKind::Interrupt)
    }
}

/// Create a synthetic signal source and the handle that fires it.
pub fn manual() -> (SignalTrigger, ManualSignals) {
    let (tx, rx) = mpsc::unbounded_channel();
    (SignalTrigger { tx }, ManualSignals { rx })
}

/// Handle that raises termination requests on a [`ManualSignals`] source.
#[derive(Debug, Clone)]
pub struct SignalTrigger {
    tx: mpsc::UnboundedSender<SignalKind>,
}

impl SignalTrigger {
    /// Deliver a termination request. Returns false if the source is gone.
    pub fn send(&self, kind: SignalKind) -> bool {
        self.tx.send(kind).is_ok()
    }

    /// Deliver a [`SignalKind::Manual`] request.
    pub fn fire(&self) -> bool {
        self.send(SignalKind::Manual)
    }
}

/// Signal source fed by a [`SignalTrigger`]. Closed once every trigger is dropped.
#[derive(Debug)]
pub struct ManualSignals {
    rx: mpsc::UnboundedReceiver<SignalKind>,
}

#[async_trait]
impl SignalSource for ManualSignals {
    async fn recv(&mut self) -> Option<SignalKind> {
        self.rx.recv().await
    }
}

/// Translate external signals into the group's shutdown.
///
/// Waits for either a signal (recorded as the termination reason, then
/// shutdown fires) or for shutdown fired elsewhere. Without `escalate`, or
/// when shutdown was fired elsewhere, the bridge returns as soon as shutdown
/// is observed. Otherwise it keeps listening until `quiesced` fires; a second
/// signal cancels `force`.
pub(crate) async fn bridge<S: SignalSource>(
    mut signals: S,
    shutdown: Shutdown,
    quiesced: CancellationToken,
    force: CancellationToken,
    escalate: bool,
) {
    let received_first = tokio::select! {
        _ = shutdown.triggered() => {
            debug!("Shutdown already requested, signal bridge standing down");
            false
        }
        received = signals.recv() => match received {
            Some(kind) => {
                info!(signal = %kind, "Termination signal received, shutting down");
                shutdown.trigger_with(TerminationReason::Signal(kind));
                true
            }
            None => {
                debug!("Signal source closed, waiting for shutdown");
                shutdown.triggered().await;
                false
            }
        },
    };

    if !escalate || !received_first {
        return;
    }

    tokio::select! {
        _ = quiesced.cancelled() => {}
        received = signals.recv() => {
            if let Some(kind) = received {
                warn!(signal = %kind, "Second termination signal received, forcing shutdown");
                force.cancel();
            } else {
                quiesced.cancelled().await;
            }
        }
    }
}
