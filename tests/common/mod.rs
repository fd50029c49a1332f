//! Shared utilities for supervision tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use server_group::net::{Listener, ListenerError, RunOutcome};
use tokio_util::sync::CancellationToken;

/// How a fake listener's run loop behaves.
#[derive(Debug, Clone, Copy)]
pub enum RunBehavior {
    /// Run until stopped.
    UntilStopped,
    /// Fail on its own after the delay.
    FailAfter(Duration),
    /// Return `StoppedByRequest` on its own after the delay.
    ExitAfter(Duration),
    /// Panic as soon as it starts.
    Panic,
}

/// In-memory listener that records every call made to it.
pub struct FakeListener {
    id: String,
    run: RunBehavior,
    stop_delay: Duration,
    stop_error: Option<String>,
    halted: CancellationToken,
    starts: AtomicUsize,
    stops: AtomicUsize,
}

#[allow(dead_code)]
impl FakeListener {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            run: RunBehavior::UntilStopped,
            stop_delay: Duration::ZERO,
            stop_error: None,
            halted: CancellationToken::new(),
            starts: AtomicUsize::new(0),
            stops: AtomicUsize::new(0),
        }
    }

    pub fn running(mut self, run: RunBehavior) -> Self {
        self.run = run;
        self
    }

    /// Take `delay` inside `stop` before halting.
    pub fn slow_stop(mut self, delay: Duration) -> Self {
        self.stop_delay = delay;
        self
    }

    /// Halt, but report `message` as a stop failure.
    pub fn failing_stop(mut self, message: &str) -> Self {
        self.stop_error = Some(message.to_string());
        self
    }

    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub fn is_halted(&self) -> bool {
        self.halted.is_cancelled()
    }
}

#[async_trait]
impl Listener for FakeListener {
    fn id(&self) -> &str {
        &self.id
    }

    async fn start(&self) -> RunOutcome {
        self.starts.fetch_add(1, Ordering::SeqCst);
        match self.run {
            RunBehavior::UntilStopped => {
                self.halted.cancelled().await;
                RunOutcome::StoppedByRequest
            }
            RunBehavior::FailAfter(delay) => tokio::select! {
                _ = self.halted.cancelled() => RunOutcome::StoppedByRequest,
                _ = tokio::time::sleep(delay) => {
                    RunOutcome::Failed(ListenerError::Other(format!("{} crashed", self.id)))
                }
            },
            RunBehavior::ExitAfter(delay) => {
                tokio::select! {
                    _ = self.halted.cancelled() => {}
                    _ = tokio::time::sleep(delay) => {}
                }
                RunOutcome::StoppedByRequest
            }
            RunBehavior::Panic => panic!("{} exploded", self.id),
        }
    }

    async fn stop(&self) -> Result<(), ListenerError> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        if !self.stop_delay.is_zero() {
            tokio::time::sleep(self.stop_delay).await;
        }
        self.halted.cancel();
        match &self.stop_error {
            Some(message) => Err(ListenerError::Other(message.clone())),
            None => Ok(()),
        }
    }
}

/// Erase fakes into the supervisor's listener type, keeping order.
pub fn group(fakes: &[Arc<FakeListener>]) -> Vec<Arc<dyn Listener>> {
    fakes
        .iter()
        .map(|fake| Arc::clone(fake) as Arc<dyn Listener>)
        .collect()
}

/// Log sink shared between a test and the `fmt` subscriber writing into it.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<std::sync::Mutex<Vec<u8>>>);

impl CapturedLogs {
    /// Install a thread-local subscriber writing into this sink.
    ///
    /// Only covers tasks polled on the calling thread, which holds for the
    /// default current-thread test runtime.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let sink = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_max_level(tracing::Level::INFO)
            .with_writer(move || sink.clone())
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    /// Captured output so far.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
