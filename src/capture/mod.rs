pub mod gateway;
pub mod microphone;

pub use gateway::{
    AcquisitionError, AudioChunk, CaptureConstraints, CaptureStream, DeviceGateway, StreamGuard,
};
pub use microphone::MicrophoneGateway;
