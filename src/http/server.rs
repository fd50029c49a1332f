//! HTTP listener built on Axum.
//!
//! # Responsibilities
//! - Bind the configured address and serve the placeholder handler
//! - Adapt Axum's graceful shutdown to the `Listener` start/stop contract
//! - Bound draining by a grace period, then cut off in-flight requests
//! - Track in-flight requests for shutdown logging

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use crate::config::ListenerConfig;
use crate::http::handler::{greet, GreetingState};
use crate::net::{InFlightTracker, Listener, ListenerError, ListenerState, RunOutcome};

/// Shared by the drain middleware of one listener.
#[derive(Clone)]
struct DrainState {
    tracker: InFlightTracker,
    force: CancellationToken,
}

/// An HTTP server supervised as a [`Listener`].
pub struct HttpListener {
    address: String,
    router: Router,
    grace_period: Duration,
    /// Fired by `stop`: stop accepting, drain gracefully.
    stop: CancellationToken,
    /// Fired when the grace period elapses: cut off in-flight requests.
    force: CancellationToken,
    state: watch::Sender<ListenerState>,
    tracker: InFlightTracker,
}

impl HttpListener {
    /// Create a listener for `config`, draining for at most `grace_period` on stop.
    pub fn new(config: &ListenerConfig, grace_period: Duration) -> Self {
        let tracker = InFlightTracker::new();
        let force = CancellationToken::new();
        let greeting = GreetingState {
            address: config.bind_address.clone(),
            delay: config.response_delay(),
        };
        let drain = DrainState {
            tracker: tracker.clone(),
            force: force.clone(),
        };

        let router = Router::new()
            .fallback(greet)
            .with_state(greeting)
            .layer(middleware::from_fn_with_state(drain, drain_guard))
            .layer(TraceLayer::new_for_http());

        let (state, _) = watch::channel(ListenerState::NotStarted);

        Self {
            address: config.bind_address.clone(),
            router,
            grace_period,
            stop: CancellationToken::new(),
            force,
            state,
            tracker,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ListenerState {
        *self.state.borrow()
    }

    /// Requests currently being served.
    pub fn in_flight(&self) -> u64 {
        self.tracker.active()
    }

    fn finish(&self, outcome: RunOutcome) -> RunOutcome {
        self.state.send_replace(ListenerState::Stopped);
        outcome
    }
}

#[async_trait]
impl Listener for HttpListener {
    fn id(&self) -> &str {
        &self.address
    }

    async fn start(&self) -> RunOutcome {
        if self.stop.is_cancelled() {
            tracing::info!(listener = %self.address, "Stop requested before start, not binding");
            return self.finish(RunOutcome::StoppedByRequest);
        }

        let addr: SocketAddr = match self.address.parse() {
            Ok(addr) => addr,
            Err(e) => {
                return self.finish(RunOutcome::Failed(ListenerError::InvalidAddress {
                    address: self.address.clone(),
                    reason: format!("{}", e),
                }));
            }
        };

        let listener = match TcpListener::bind(addr).await {
            Ok(listener) => listener,
            Err(source) => {
                return self.finish(RunOutcome::Failed(ListenerError::Bind {
                    address: self.address.clone(),
                    source,
                }));
            }
        };

        // Stop may have raced the bind; it moved the state to Stopping already.
        self.state.send_if_modified(|state| {
            if *state == ListenerState::NotStarted {
                *state = ListenerState::Running;
                true
            } else {
                false
            }
        });

        match listener.local_addr() {
            Ok(local) => tracing::info!(listener = %self.address, address = %local, "Listener started"),
            Err(_) => tracing::info!(listener = %self.address, "Listener started"),
        }

        let stop = self.stop.clone();
        let serve = axum::serve(listener, self.router.clone())
            .with_graceful_shutdown(async move { stop.cancelled_owned().await })
            .into_future();

        let outcome = tokio::select! {
            result = serve => match result {
                Ok(()) if self.stop.is_cancelled() => RunOutcome::StoppedByRequest,
                Ok(()) => RunOutcome::Failed(ListenerError::Other(format!(
                    "{} stopped serving without a stop request",
                    self.address
                ))),
                Err(source) => RunOutcome::Failed(ListenerError::Serve {
                    address: self.address.clone(),
                    source,
                }),
            },
            _ = self.force.cancelled() => {
                tracing::warn!(listener = %self.address, "Grace period elapsed, abandoning drain");
                RunOutcome::StoppedByRequest
            }
        };

        tracing::info!(listener = %self.address, "Listener halted");
        self.finish(outcome)
    }

    async fn stop(&self) -> Result<(), ListenerError> {
        self.stop.cancel();
        self.state.send_if_modified(|state| {
            if matches!(*state, ListenerState::NotStarted | ListenerState::Running) {
                *state = ListenerState::Stopping;
                true
            } else {
                false
            }
        });

        tracing::info!(
            listener = %self.address,
            in_flight = self.tracker.active(),
            grace_period = ?self.grace_period,
            "Stopping listener"
        );

        let mut state = self.state.subscribe();
        let drained = tokio::time::timeout(
            self.grace_period,
            state.wait_for(|state| *state == ListenerState::Stopped),
        )
        .await
        .is_ok();

        if drained {
            return Ok(());
        }

        tracing::warn!(
            listener = %self.address,
            in_flight = self.tracker.active(),
            "Grace period elapsed, terminating in-flight requests"
        );
        self.force.cancel();
        Err(ListenerError::GracePeriodElapsed {
            address: self.address.clone(),
            grace: self.grace_period,
        })
    }
}

/// Count the request as in flight and cut it off once the grace period is over.
async fn drain_guard(State(drain): State<DrainState>, request: Request<Body>, next: Next) -> Response {
    let guard = drain.tracker.track();
    tracing::trace!(request_id = %guard.id(), path = %request.uri().path(), "Request started");

    tokio::select! {
        response = next.run(request) => response,
        _ = drain.force.cancelled() => {
            tracing::debug!(request_id = %guard.id(), "Request terminated by shutdown");
            (StatusCode::SERVICE_UNAVAILABLE, "Server shutting down\n").into_response()
        }
    }
}
