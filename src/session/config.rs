use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Maximum recording duration selectable from the input widget.
///
/// The widget offers a fixed menu; arbitrary durations are rejected at the
/// edge rather than clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub enum RecordingDeadline {
    Secs5,
    Secs10,
    Secs20,
}

impl RecordingDeadline {
    pub const fn as_millis(self) -> u64 {
        match self {
            Self::Secs5 => 5_000,
            Self::Secs10 => 10_000,
            Self::Secs20 => 20_000,
        }
    }

    pub const fn duration(self) -> Duration {
        Duration::from_millis(self.as_millis())
    }
}

impl Default for RecordingDeadline {
    fn default() -> Self {
        Self::Secs5
    }
}

impl TryFrom<u64> for RecordingDeadline {
    type Error = String;

    fn try_from(ms: u64) -> Result<Self, Self::Error> {
        match ms {
            5_000 => Ok(Self::Secs5),
            10_000 => Ok(Self::Secs10),
            20_000 => Ok(Self::Secs20),
            other => Err(format!("unsupported recording deadline: {other}ms")),
        }
    }
}

impl From<RecordingDeadline> for u64 {
    fn from(deadline: RecordingDeadline) -> u64 {
        deadline.as_millis()
    }
}

/// Options for a single capture attempt.
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    /// Auto-stop deadline
    pub deadline: RecordingDeadline,
    /// Language code hint; `None` lets the service detect the language
    pub language: Option<String>,
}
