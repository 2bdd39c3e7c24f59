use serde::Serialize;

use super::config::RecordingDeadline;

/// Lifecycle phase of the capture session, as shown to the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Idle,
    RequestingAccess,
    Recording,
    Stopping,
    Validating,
    Transcribing,
}

/// UI-facing view of the session.
///
/// Exactly the observables rendering needs: phase, progress toward the
/// deadline, and the active deadline selection. Buffered audio and the
/// device handle stay owned by the session task.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SessionSnapshot {
    #[serde(rename = "state")]
    pub phase: SessionPhase,
    /// elapsed/deadline, clamped to [0, 1]
    pub progress: f64,
    #[serde(rename = "deadline_ms")]
    pub deadline: RecordingDeadline,
}

impl SessionSnapshot {
    pub fn new(phase: SessionPhase, progress: f64, deadline: RecordingDeadline) -> Self {
        Self {
            phase,
            progress,
            deadline,
        }
    }

    pub fn idle() -> Self {
        Self::new(SessionPhase::Idle, 0.0, RecordingDeadline::default())
    }
}
