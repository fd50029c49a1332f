//! Supervisor for a fixed group of network listeners that start together
//! and stop together.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;

pub use config::schema::GroupConfig;
pub use http::HttpListener;
pub use lifecycle::{Shutdown, Supervisor, TerminationReason};
pub use net::{Listener, ListenerError, RunOutcome};
