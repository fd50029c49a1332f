//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, drain middleware, graceful shutdown)
//!     → handler.rs (placeholder response)
//!     → Send to client
//! ```

pub mod handler;
pub mod server;

pub use server::HttpListener;
