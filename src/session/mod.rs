//! Voice capture session management
//!
//! This module provides the `VoiceInput` abstraction that manages:
//! - Microphone acquisition through the device gateway
//! - Bounded recording with a deadline timer and a 100 ms progress clock
//! - Manual stop and cancellation from any state
//! - Minimum-size validation before the transcription call
//! - Snapshot publication for UI rendering

mod config;
mod payload;
mod session;
mod state;

pub use config::{RecordingDeadline, SessionOptions};
pub use payload::{validate, InsufficientAudio, ValidAudio, MIN_PAYLOAD_BYTES};
pub use session::{StartError, VoiceInput};
pub use state::{SessionPhase, SessionSnapshot};
