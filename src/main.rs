//! Server group supervisor (v1)
//!
//! Runs a fixed set of HTTP listeners that start together and stop together.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌────────────────────────────────────────────────────────┐
//!                 │                       SUPERVISOR                       │
//!                 │                                                        │
//!                 │  ┌───────────────┐          ┌─────────────────────┐    │
//!   SIGINT/TERM ──┼─▶│ signal bridge │──fire──▶ │ Shutdown (one-shot) │    │
//!                 │  └───────────────┘          └──────────┬──────────┘    │
//!                 │                                        │ observed by   │
//!                 │             ┌──────────────────────────┴─┐             │
//!                 │             ▼                            ▼             │
//!                 │  ┌────────────────┐          ┌────────────────┐        │
//!                 │  │ stop watcher 1 │   ...    │ stop watcher N │        │
//!                 │  └───────┬────────┘          └───────┬────────┘        │
//!                 │          │ stop()                    │ stop()          │
//!                 │          ▼                           ▼                 │
//!                 │  ┌────────────────┐          ┌────────────────┐        │
//!                 │  │  listener 1    │   ...    │  listener N    │        │
//!                 │  │  (run task)    │          │  (run task)    │        │
//!                 │  └────────────────┘          └────────────────┘        │
//!                 │     failure fires Shutdown                             │
//!                 │                                                        │
//!                 └────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use server_group::config::{load_config, validate_config, ConfigError, GroupConfig, ListenerConfig};
use server_group::lifecycle::startup;
use server_group::observability::init_logging;

#[derive(Parser)]
#[command(name = "server-group")]
#[command(about = "Run a group of HTTP listeners that start and stop together", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address; repeat for several listeners. Replaces configured listeners.
    #[arg(short, long = "listen", value_name = "ADDR")]
    listen: Vec<String>,

    /// Time each listener gets to drain on shutdown.
    #[arg(long)]
    grace_period_ms: Option<u64>,

    /// Abort everything still running this long after shutdown starts.
    #[arg(long)]
    shutdown_timeout_ms: Option<u64>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    fn load(&self) -> Result<GroupConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => GroupConfig::default(),
        };

        if !self.listen.is_empty() {
            config.listeners = self.listen.iter().map(ListenerConfig::new).collect();
        }
        if let Some(grace) = self.grace_period_ms {
            config.shutdown.grace_period_ms = grace;
        }
        if let Some(timeout) = self.shutdown_timeout_ms {
            config.shutdown.timeout_ms = Some(timeout);
        }
        if let Some(level) = &self.log_level {
            config.observability.log_level = level.clone();
        }

        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match cli.load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("server-group: {}", e);
            return ExitCode::FAILURE;
        }
    };

    init_logging(&config.observability);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        listeners = ?config.listeners.iter().map(|l| l.bind_address.as_str()).collect::<Vec<_>>(),
        "server-group starting"
    );

    match startup::launch(config).await {
        Ok(reason) if reason.is_failure() => {
            tracing::error!(%reason, "Exiting after failure");
            eprintln!("server-group: {}", reason);
            ExitCode::FAILURE
        }
        Ok(reason) => {
            tracing::info!(%reason, "Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Startup failed");
            eprintln!("server-group: {}", e);
            ExitCode::FAILURE
        }
    }
}
