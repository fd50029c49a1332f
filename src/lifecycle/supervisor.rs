//! Supervision of a fixed group of listeners.
//!
//! # Responsibilities
//! - Run every listener and a paired stop watcher concurrently
//! - Turn any listener failure or external signal into a group-wide stop
//! - Return only once every spawned task has finished
//! - Pick a single termination reason for the whole group
//!
//! # Design Decisions
//! - Exactly 2 tasks per listener plus 1 signal bridge, all in one `JoinSet`
//! - The shutdown coordinator is the only state shared between tasks
//! - First fatal condition wins; stop failures are reported only when
//!   nothing fatal happened, lowest listener index first
//! - Optional outer deadline aborts tasks that outlive their grace period

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::{self, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::ShutdownConfig;
use crate::lifecycle::reason::TerminationReason;
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::signals::{self, SignalSource};
use crate::net::{Listener, ListenerError, RunOutcome};

/// Error type for building a supervisor.
#[derive(Debug, thiserror::Error)]
pub enum SupervisorError {
    #[error("no listeners to supervise")]
    NoListeners,

    #[error("listener {0} is supervised more than once")]
    DuplicateListener(String),
}

/// Shutdown sequencing knobs.
#[derive(Debug, Clone, Default)]
pub struct SupervisorConfig {
    /// Abort whatever is still running this long after shutdown starts.
    pub shutdown_timeout: Option<Duration>,
    /// Abort whatever is still running when a second signal arrives.
    pub force_on_second_signal: bool,
}

impl From<&ShutdownConfig> for SupervisorConfig {
    fn from(config: &ShutdownConfig) -> Self {
        Self {
            shutdown_timeout: config.timeout(),
            force_on_second_signal: config.force_on_second_signal,
        }
    }
}

/// Owns a set of listeners and stops them as one unit.
pub struct Supervisor<S> {
    listeners: Vec<Arc<dyn Listener>>,
    signals: S,
    shutdown: Shutdown,
    config: SupervisorConfig,
}

/// What a spawned task reports back when it finishes.
enum TaskOutcome {
    Run { index: usize },
    Stop { index: usize, result: Result<(), ListenerError> },
    Bridge,
}

/// Which task a `JoinSet` entry is, for tasks that end without an outcome.
#[derive(Debug, Clone, Copy)]
enum TaskKind {
    Run(usize),
    Stop(usize),
    Bridge,
}

enum Next {
    Joined(Option<Result<(task::Id, TaskOutcome), task::JoinError>>),
    DeadlineElapsed,
    Forced,
}

impl<S: SignalSource> Supervisor<S> {
    /// Create a supervisor over `listeners`, stopping on signals from `signals`.
    ///
    /// Listener identities must be unique and the set non-empty.
    pub fn new(listeners: Vec<Arc<dyn Listener>>, signals: S) -> Result<Self, SupervisorError> {
        if listeners.is_empty() {
            return Err(SupervisorError::NoListeners);
        }

        let mut seen = HashSet::new();
        for listener in &listeners {
            if !seen.insert(listener.id()) {
                return Err(SupervisorError::DuplicateListener(listener.id().to_string()));
            }
        }

        Ok(Self {
            listeners,
            signals,
            shutdown: Shutdown::new(),
            config: SupervisorConfig::default(),
        })
    }

    pub fn with_config(mut self, config: SupervisorConfig) -> Self {
        self.config = config;
        self
    }

    /// Use an externally owned shutdown coordinator.
    pub fn with_shutdown(mut self, shutdown: Shutdown) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Handle that stops the whole group when triggered.
    pub fn shutdown_handle(&self) -> Shutdown {
        self.shutdown.clone()
    }

    /// Run every listener until the group shuts down.
    ///
    /// Returns once all run tasks, stop watchers and the signal bridge have
    /// completed (or, past the shutdown deadline, been aborted).
    pub async fn run(self) -> TerminationReason {
        let Self {
            listeners,
            signals,
            shutdown,
            config,
        } = self;

        let quiesced = CancellationToken::new();
        let force = CancellationToken::new();
        let mut tasks = JoinSet::new();
        let mut kinds = HashMap::new();

        info!(listeners = listeners.len(), "Supervisor starting");

        for (index, listener) in listeners.iter().enumerate() {
            let handle = tasks.spawn(run_listener(index, Arc::clone(listener), shutdown.clone()));
            kinds.insert(handle.id(), TaskKind::Run(index));

            let handle = tasks.spawn(watch_shutdown(index, Arc::clone(listener), shutdown.clone()));
            kinds.insert(handle.id(), TaskKind::Stop(index));
        }

        let bridge = signals::bridge(
            signals,
            shutdown.clone(),
            quiesced.clone(),
            force.clone(),
            config.force_on_second_signal,
        );
        let handle = tasks.spawn(async move {
            bridge.await;
            TaskOutcome::Bridge
        });
        kinds.insert(handle.id(), TaskKind::Bridge);

        let mut running = listeners.len();
        let mut listener_tasks = listeners.len() * 2;
        let mut stop_failures: Vec<(usize, ListenerError)> = Vec::new();
        let mut aborted = false;
        let mut aborted_tasks = 0;
        let mut forced = false;

        let deadline = shutdown_deadline(shutdown.clone(), config.shutdown_timeout);
        tokio::pin!(deadline);

        loop {
            let next = tokio::select! {
                joined = tasks.join_next_with_id() => Next::Joined(joined),
                _ = &mut deadline, if !aborted => Next::DeadlineElapsed,
                _ = force.cancelled(), if !aborted => Next::Forced,
            };

            let joined = match next {
                Next::Joined(Some(joined)) => joined,
                Next::Joined(None) => break,
                Next::DeadlineElapsed => {
                    let pending = tasks.len();
                    error!(pending, "Shutdown deadline elapsed, aborting remaining tasks");
                    shutdown.trigger_with(TerminationReason::ShutdownTimedOut { pending });
                    tasks.abort_all();
                    aborted = true;
                    aborted_tasks = pending;
                    continue;
                }
                Next::Forced => {
                    let pending = tasks.len();
                    warn!(pending, "Forced shutdown, aborting remaining tasks");
                    tasks.abort_all();
                    aborted = true;
                    aborted_tasks = pending;
                    forced = true;
                    continue;
                }
            };

            let kind = match &joined {
                Ok((id, _)) => kinds.remove(id),
                Err(e) => kinds.remove(&e.id()),
            };

            match joined {
                Ok((_, TaskOutcome::Run { index })) => {
                    debug!(listener = listeners[index].id(), "Run task finished");
                }
                Ok((_, TaskOutcome::Stop { index, result })) => {
                    let listener = listeners[index].id();
                    match result {
                        Ok(()) => info!(listener, "Listener stopped"),
                        Err(error) => {
                            error!(listener, %error, "Listener failed to stop");
                            stop_failures.push((index, error));
                        }
                    }
                }
                Ok((_, TaskOutcome::Bridge)) => debug!("Signal bridge finished"),
                Err(e) if e.is_cancelled() => {
                    debug!(task = ?kind, "Task aborted");
                }
                Err(e) => {
                    let task = describe(kind, &listeners);
                    error!(%task, error = %e, "Supervised task panicked");
                    shutdown.trigger_with(TerminationReason::TaskPanicked { task });
                }
            }

            match kind {
                Some(TaskKind::Run(_)) => {
                    running -= 1;
                    listener_tasks -= 1;
                    if running == 0 && !shutdown.is_triggered() {
                        info!("All listeners exited, shutting down");
                        shutdown.trigger();
                    }
                }
                Some(TaskKind::Stop(_)) => listener_tasks -= 1,
                Some(TaskKind::Bridge) | None => {}
            }

            if listener_tasks == 0 {
                quiesced.cancel();
            }
        }

        let reason = shutdown
            .take_reason()
            .or_else(|| {
                stop_failures
                    .into_iter()
                    .min_by_key(|(index, _)| *index)
                    .map(|(index, error)| TerminationReason::StopFailed {
                        listener: listeners[index].id().to_string(),
                        error,
                    })
            })
            .unwrap_or(TerminationReason::Completed);

        if aborted {
            warn!(%reason, aborted = aborted_tasks, forced, "Supervisor finished after aborting tasks");
        } else {
            info!(%reason, "Supervisor finished");
        }
        reason
    }
}

/// Run task: drive a listener and turn a failure into a group shutdown.
async fn run_listener(index: usize, listener: Arc<dyn Listener>, shutdown: Shutdown) -> TaskOutcome {
    let id = listener.id();
    info!(listener = id, "Starting listener");

    match listener.start().await {
        RunOutcome::StoppedByRequest => {
            if shutdown.is_triggered() {
                info!(listener = id, "Listener run loop ended");
            } else {
                warn!(listener = id, "Listener exited before shutdown was requested");
            }
        }
        RunOutcome::Failed(error) => {
            error!(listener = id, %error, "Listener failed, stopping the group");
            shutdown.trigger_with(TerminationReason::ListenerFailed {
                listener: id.to_string(),
                error,
            });
        }
    }

    TaskOutcome::Run { index }
}

/// Stop watcher: wait for shutdown, then stop exactly one listener once.
async fn watch_shutdown(index: usize, listener: Arc<dyn Listener>, shutdown: Shutdown) -> TaskOutcome {
    shutdown.triggered().await;
    info!(listener = listener.id(), "Stop requested");
    let result = listener.stop().await;
    TaskOutcome::Stop { index, result }
}

/// Completes `timeout` after shutdown fires; never completes without a timeout.
fn shutdown_deadline(shutdown: Shutdown, timeout: Option<Duration>) -> impl Future<Output = ()> {
    async move {
        match timeout {
            Some(timeout) => {
                shutdown.triggered().await;
                tokio::time::sleep(timeout).await;
            }
            None => std::future::pending().await,
        }
    }
}

fn describe(kind: Option<TaskKind>, listeners: &[Arc<dyn Listener>]) -> String {
    match kind {
        Some(TaskKind::Run(index)) => format!("run task for {}", listeners[index].id()),
        Some(TaskKind::Stop(index)) => format!("stop watcher for {}", listeners[index].id()),
        Some(TaskKind::Bridge) => "signal bridge".to_string(),
        None => "unknown task".to_string(),
    }
}
