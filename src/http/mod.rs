//! HTTP API server for driving the input widget
//!
//! This module provides a REST API for controlling capture sessions:
//! - POST /voice/:widget_id/start - Start a capture session
//! - POST /voice/:widget_id/stop - Stop the active capture
//! - POST /voice/:widget_id/cancel - Cancel and discard the active capture
//! - GET /voice/:widget_id/status - Session snapshot for rendering
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
