//! Tower middleware layers for the courier transport.
//!
//! [`HyperTransport`](crate::HyperTransport) always wraps its wire client in a
//! [`LoggingLayer`]. The layer works on courier's own [`Request`](crate::Request)
//! and [`Response`](crate::Response) types, so it also composes with any other
//! `tower::Service` over them.
//!
//! # Available Layers
//!
//! - [`LoggingLayer`] - Logs requests/responses using `tracing`, honoring the
//!   per-request [`DebugTrace`] marker

mod logging;

pub use logging::{DebugTrace, LogLevel, Logging, LoggingLayer};

// Re-export tower types for convenience
pub use tower::{Layer, ServiceBuilder};
