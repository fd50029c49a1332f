//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Supervisor
//!     → listener.rs (Listener trait: start / stop)
//!     → concrete listener binds and accepts (see http::server)
//!     → connection.rs (in-flight tracking while draining)
//!
//! Listener States:
//!     NotStarted → Running → Stopping → Stopped
//! ```
//!
//! # Design Decisions
//! - Run outcome is a tagged result, never an error-identity check
//! - Each listener is touched only by its own run task and stop watcher

pub mod connection;
pub mod listener;

pub use connection::{InFlightGuard, InFlightTracker, RequestId};
pub use listener::{Listener, ListenerError, ListenerState, RunOutcome};
