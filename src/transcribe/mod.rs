mod client;

pub use client::{Transcriber, Transcription, TranscriptionError, WhisperClient};
