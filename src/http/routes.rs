use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Capture control
        .route("/voice/:widget_id/start", post(handlers::start_capture))
        .route("/voice/:widget_id/stop", post(handlers::stop_capture))
        .route("/voice/:widget_id/cancel", post(handlers::cancel_capture))
        // Widget queries
        .route("/voice/:widget_id/status", get(handlers::capture_status))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
