//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config → Build listeners → Install signals → Supervisor::run
//!
//! Supervision (supervisor.rs):
//!     per listener: run task + stop watcher
//!     one signal bridge
//!     wait for all → TerminationReason (reason.rs)
//!
//! Shutdown (shutdown.rs):
//!     Listener failure / signal / trigger → fire once → every watcher calls stop
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//!     Second signal → Optional forced shutdown
//! ```
//!
//! # Design Decisions
//! - Cancellation is explicit and injectable, never a hidden global
//! - All-or-nothing: one listener failing stops every listener
//! - Shutdown has an optional timeout: remaining tasks aborted after deadline

pub mod reason;
pub mod shutdown;
pub mod signals;
pub mod startup;
pub mod supervisor;

pub use reason::TerminationReason;
pub use shutdown::Shutdown;
pub use signals::{manual, ManualSignals, OsSignals, SignalKind, SignalSource, SignalTrigger};
pub use supervisor::{Supervisor, SupervisorConfig, SupervisorError};
