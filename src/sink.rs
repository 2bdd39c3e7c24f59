use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::capture::AcquisitionError;
use crate::transcribe::Transcription;

/// Minimum recognized length for a transcript to count as speech.
const MIN_RECOGNIZED_CHARS: usize = 2;

/// Message pushed into the chat pipeline.
///
/// Voice and typed input produce the same shape; downstream consumers
/// cannot tell them apart.
#[derive(Debug, Clone, Serialize)]
pub struct OutboundMessage {
    pub content: String,
    pub language: String,
    pub sent_at: DateTime<Utc>,
}

/// Terminal failure of a capture attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionFailure {
    PermissionDenied,
    DeviceNotFound,
    AcquisitionFailed,
    InsufficientAudio,
    RecognitionEmpty,
    TranscriptionService,
}

impl SessionFailure {
    /// The fixed user-facing message for this failure. Raw platform and
    /// protocol errors never reach the UI.
    pub fn user_message(self) -> &'static str {
        match self {
            Self::PermissionDenied => "마이크 사용 권한이 거부되었습니다.",
            Self::DeviceNotFound => "사용할 수 있는 마이크를 찾을 수 없습니다.",
            Self::AcquisitionFailed => "마이크에 접근할 수 없습니다. 다시 시도해주세요.",
            Self::InsufficientAudio => "음성이 감지되지 않았습니다. 다시 시도해주세요.",
            Self::RecognitionEmpty => "음성을 인식하지 못했습니다. 다시 시도해주세요.",
            Self::TranscriptionService => "음성 인식 처리 중 오류가 발생했습니다.",
        }
    }
}

impl From<&AcquisitionError> for SessionFailure {
    fn from(err: &AcquisitionError) -> Self {
        match err {
            AcquisitionError::PermissionDenied => Self::PermissionDenied,
            AcquisitionError::DeviceNotFound => Self::DeviceNotFound,
            AcquisitionError::Failed(_) => Self::AcquisitionFailed,
        }
    }
}

/// Routes session outcomes: transcripts into the message pipeline,
/// failures onto the notices channel. Neither path is ever silent.
#[derive(Clone)]
pub struct MessageSink {
    messages: mpsc::UnboundedSender<OutboundMessage>,
    notices: mpsc::UnboundedSender<&'static str>,
}

impl MessageSink {
    pub fn new(
        messages: mpsc::UnboundedSender<OutboundMessage>,
        notices: mpsc::UnboundedSender<&'static str>,
    ) -> Self {
        Self { messages, notices }
    }

    /// Forward a recognized transcript as one outbound message.
    ///
    /// The text is trimmed; anything under two characters counts as an
    /// empty recognition. The language hint wins only when the service did
    /// not detect one.
    pub fn deliver(
        &self,
        transcription: Transcription,
        language_hint: Option<&str>,
    ) -> Result<(), SessionFailure> {
        let content = transcription.text.trim().to_string();
        if content.chars().count() < MIN_RECOGNIZED_CHARS {
            return Err(SessionFailure::RecognitionEmpty);
        }

        let language = transcription
            .language
            .as_deref()
            .filter(|l| !l.is_empty())
            .or(language_hint)
            .unwrap_or_default()
            .to_string();

        let message = OutboundMessage {
            content,
            language,
            sent_at: Utc::now(),
        };

        info!(
            chars = message.content.chars().count(),
            language = %message.language,
            "delivering transcript to message pipeline"
        );

        if self.messages.send(message).is_err() {
            warn!("message pipeline closed; transcript dropped");
        }

        Ok(())
    }

    /// Surface the user-facing diagnostic for a failed attempt.
    pub fn notify_failure(&self, failure: SessionFailure) {
        let notice = failure.user_message();
        warn!(?failure, notice, "capture attempt failed");
        if self.notices.send(notice).is_err() {
            warn!("notice channel closed");
        }
    }
}
