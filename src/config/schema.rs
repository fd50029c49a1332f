//! Configuration schema definitions.
//!
//! All types derive `Deserialize` for loading from config files.

use std::time::Duration;

use serde::Deserialize;

/// Root configuration for a supervised group of listeners.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GroupConfig {
    /// Listeners to run, in supervision order.
    pub listeners: Vec<ListenerConfig>,

    /// Shutdown sequencing.
    pub shutdown: ShutdownConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for GroupConfig {
    fn default() -> Self {
        Self {
            listeners: vec![
                ListenerConfig::new("0.0.0.0:8091"),
                ListenerConfig::new("0.0.0.0:8092"),
            ],
            shutdown: ShutdownConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8091").
    pub bind_address: String,

    /// Artificial delay before the placeholder handler answers.
    #[serde(default)]
    pub response_delay_ms: u64,
}

impl ListenerConfig {
    /// Listener on `bind_address` with an immediate handler.
    pub fn new(bind_address: impl Into<String>) -> Self {
        Self {
            bind_address: bind_address.into(),
            response_delay_ms: 0,
        }
    }

    pub fn response_delay(&self) -> Duration {
        Duration::from_millis(self.response_delay_ms)
    }
}

/// Shutdown configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ShutdownConfig {
    /// Time each listener gets to drain before in-flight work is cut off.
    pub grace_period_ms: u64,

    /// Outer deadline for the whole group once shutdown has started.
    /// Unset means no deadline beyond each listener's grace period.
    pub timeout_ms: Option<u64>,

    /// Abort remaining work when a second termination signal arrives.
    pub force_on_second_signal: bool,
}

impl ShutdownConfig {
    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            grace_period_ms: 5_000,
            timeout_ms: None,
            force_on_second_signal: false,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Human-readable or JSON log lines.
    pub log_format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}
