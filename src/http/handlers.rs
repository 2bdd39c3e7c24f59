use super::state::AppState;
use crate::session::{RecordingDeadline, SessionOptions, StartError};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use tracing::info;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct StartCaptureRequest {
    /// Auto-stop deadline in milliseconds; one of 5000/10000/20000
    /// (default 5000). Other values are rejected, not clamped.
    pub deadline_ms: Option<RecordingDeadline>,

    /// Language hint; omitted, empty, or "auto" lets the service detect
    pub language: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CaptureResponse {
    pub widget_id: String,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /voice/:widget_id/start
/// Start a capture session on a registered widget
pub async fn start_capture(
    State(state): State<AppState>,
    Path(widget_id): Path<String>,
    Json(req): Json<StartCaptureRequest>,
) -> impl IntoResponse {
    let Some(input) = state.get(&widget_id).await else {
        return widget_not_found(&widget_id);
    };

    let options = SessionOptions {
        deadline: req.deadline_ms.unwrap_or_default(),
        language: req
            .language
            .filter(|l| !l.is_empty() && l.as_str() != "auto"),
    };

    info!(
        "Capture start requested for widget {} ({}ms deadline)",
        widget_id,
        options.deadline.as_millis()
    );

    match input.start(options).await {
        Ok(()) => (
            StatusCode::OK,
            Json(CaptureResponse {
                widget_id,
                status: "recording".to_string(),
            }),
        )
            .into_response(),
        Err(StartError::SessionActive) => (
            StatusCode::CONFLICT,
            Json(ErrorResponse {
                error: format!("widget {} is already capturing", widget_id),
            }),
        )
            .into_response(),
    }
}

/// POST /voice/:widget_id/stop
/// Manually stop the active capture (idempotent with the deadline timer)
pub async fn stop_capture(
    State(state): State<AppState>,
    Path(widget_id): Path<String>,
) -> impl IntoResponse {
    match state.get(&widget_id).await {
        Some(input) => {
            input.stop().await;
            (
                StatusCode::OK,
                Json(CaptureResponse {
                    widget_id,
                    status: "stopping".to_string(),
                }),
            )
                .into_response()
        }
        None => widget_not_found(&widget_id),
    }
}

/// POST /voice/:widget_id/cancel
/// Cancel the active capture; buffered audio is discarded
pub async fn cancel_capture(
    State(state): State<AppState>,
    Path(widget_id): Path<String>,
) -> impl IntoResponse {
    match state.get(&widget_id).await {
        Some(input) => {
            input.cancel().await;
            (
                StatusCode::OK,
                Json(CaptureResponse {
                    widget_id,
                    status: "cancelled".to_string(),
                }),
            )
                .into_response()
        }
        None => widget_not_found(&widget_id),
    }
}

/// GET /voice/:widget_id/status
/// Current session snapshot (state, progress, deadline selection)
pub async fn capture_status(
    State(state): State<AppState>,
    Path(widget_id): Path<String>,
) -> impl IntoResponse {
    match state.get(&widget_id).await {
        Some(input) => (StatusCode::OK, Json(input.snapshot())).into_response(),
        None => widget_not_found(&widget_id),
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

fn widget_not_found(widget_id: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: format!("widget {widget_id} not found"),
        }),
    )
        .into_response()
}
