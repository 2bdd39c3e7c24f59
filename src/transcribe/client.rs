use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::config::TranscriptionConfig;

/// Recognized speech returned by the transcription service.
#[derive(Debug, Clone, Deserialize)]
pub struct Transcription {
    pub text: String,
    /// Language detected by the service, when it reports one
    #[serde(default, alias = "detectedLanguage")]
    pub language: Option<String>,
}

/// Why a transcription call failed.
///
/// Both variants map to the same user-facing diagnostic; the split exists
/// for logs.
#[derive(Debug, Error)]
pub enum TranscriptionError {
    #[error("transcription request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("transcription service returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
}

/// Converts recorded audio into text plus a detected language.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Submit a WAV payload with an optional language hint.
    async fn transcribe(
        &self,
        wav: Vec<u8>,
        language_hint: Option<&str>,
    ) -> Result<Transcription, TranscriptionError>;
}

/// Whisper-compatible transcription endpoint client.
pub struct WhisperClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl WhisperClient {
    pub fn new(cfg: &TranscriptionConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: cfg.endpoint.clone(),
            api_key: cfg.api_key.clone(),
            model: cfg.model.clone(),
        }
    }
}

#[async_trait]
impl Transcriber for WhisperClient {
    async fn transcribe(
        &self,
        wav: Vec<u8>,
        language_hint: Option<&str>,
    ) -> Result<Transcription, TranscriptionError> {
        debug!(audio_bytes = wav.len(), "starting transcription request");

        let part = reqwest::multipart::Part::bytes(wav)
            .file_name("audio.wav")
            .mime_str("audio/wav")?;

        let mut form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("model", self.model.clone())
            .text("response_format", "verbose_json");
        if let Some(language) = language_hint {
            form = form.text("language", language.to_string());
        }

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(%status, %body, "transcription service error");
            return Err(TranscriptionError::Status { status, body });
        }

        let transcription: Transcription = response.json().await?;
        info!(
            chars = transcription.text.chars().count(),
            language = transcription.language.as_deref().unwrap_or("unknown"),
            "transcription complete"
        );

        Ok(transcription)
    }
}
