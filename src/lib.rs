pub mod capture;
pub mod config;
pub mod http;
pub mod session;
pub mod sink;
pub mod transcribe;

pub use capture::{
    AcquisitionError, AudioChunk, CaptureConstraints, CaptureStream, DeviceGateway,
    MicrophoneGateway, StreamGuard,
};
pub use config::Config;
pub use http::{create_router, AppState};
pub use session::{
    RecordingDeadline, SessionOptions, SessionPhase, SessionSnapshot, StartError, VoiceInput,
    MIN_PAYLOAD_BYTES,
};
pub use sink::{MessageSink, OutboundMessage, SessionFailure};
pub use transcribe::{Transcriber, Transcription, TranscriptionError, WhisperClient};
