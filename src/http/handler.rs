//! Placeholder request handler.

use std::time::Duration;

use axum::extract::State;

/// State for the greeting handler.
#[derive(Debug, Clone)]
pub struct GreetingState {
    pub address: String,
    pub delay: Duration,
}

/// Answer every request with the listener's identity, after an optional delay.
pub async fn greet(State(state): State<GreetingState>) -> String {
    if !state.delay.is_zero() {
        tokio::time::sleep(state.delay).await;
    }
    format!("I'm server {}\n", state.address)
}
