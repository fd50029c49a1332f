//! Startup orchestration.
//!
//! # Responsibilities
//! - Build one listener per configured bind address
//! - Install OS signal handling
//! - Hand everything to the supervisor and wait for it
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listeners bind inside their own run task, so a bind failure stops the group

use std::sync::Arc;

use crate::config::GroupConfig;
use crate::http::HttpListener;
use crate::lifecycle::reason::TerminationReason;
use crate::lifecycle::signals::{OsSignals, SignalSource};
use crate::lifecycle::supervisor::{Supervisor, SupervisorConfig, SupervisorError};
use crate::net::Listener;

/// Error type for startup.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("failed to install signal handlers: {0}")]
    Signals(#[source] std::io::Error),

    #[error(transparent)]
    Supervisor(#[from] SupervisorError),
}

/// Build the HTTP listeners described by `config`.
pub fn build_listeners(config: &GroupConfig) -> Vec<Arc<dyn Listener>> {
    let grace_period = config.shutdown.grace_period();
    config
        .listeners
        .iter()
        .map(|listener| Arc::new(HttpListener::new(listener, grace_period)) as Arc<dyn Listener>)
        .collect()
}

/// Build a supervisor for `config` that stops on signals from `signals`.
pub fn supervisor<S: SignalSource>(
    config: &GroupConfig,
    signals: S,
) -> Result<Supervisor<S>, SupervisorError> {
    let supervisor = Supervisor::new(build_listeners(config), signals)?
        .with_config(SupervisorConfig::from(&config.shutdown));
    Ok(supervisor)
}

/// Run the configured group until it shuts down, stopping on SIGINT/SIGTERM.
pub async fn launch(config: GroupConfig) -> Result<TerminationReason, StartupError> {
    let signals = OsSignals::install().map_err(StartupError::Signals)?;
    let supervisor = supervisor(&config, signals)?;

    tracing::info!(
        listeners = config.listeners.len(),
        grace_period_ms = config.shutdown.grace_period_ms,
        shutdown_timeout_ms = ?config.shutdown.timeout_ms,
        "Press Ctrl+C to shut down gracefully"
    );

    Ok(supervisor.run().await)
}
