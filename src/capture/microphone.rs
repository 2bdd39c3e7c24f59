use std::sync::mpsc as std_mpsc;
use std::time::Instant;

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::FromSample;
use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};

use super::gateway::{
    AcquisitionError, AudioChunk, CaptureConstraints, CaptureStream, DeviceGateway, StreamGuard,
};

/// Chunks queued between the audio callback and the session before the
/// callback starts dropping instead of blocking.
const CHUNK_QUEUE: usize = 64;

/// cpal-backed microphone gateway.
///
/// cpal streams are not `Send`, so each acquisition runs on a dedicated
/// thread that owns the stream until the guard fires. Format constraints
/// (rate, channels) are enforced exactly; the processing constraints are
/// host-OS hints and are logged at acquisition time.
pub struct MicrophoneGateway;

impl MicrophoneGateway {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MicrophoneGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DeviceGateway for MicrophoneGateway {
    async fn acquire(
        &self,
        constraints: &CaptureConstraints,
    ) -> Result<CaptureStream, AcquisitionError> {
        let constraints = constraints.clone();
        let (ready_tx, ready_rx) = oneshot::channel();
        let (stop_tx, stop_rx) = std_mpsc::channel::<()>();

        std::thread::Builder::new()
            .name("mic-capture".to_string())
            .spawn(move || capture_thread(constraints, ready_tx, stop_rx))
            .map_err(|e| AcquisitionError::Failed(e.to_string()))?;

        let chunks = ready_rx.await.map_err(|_| {
            AcquisitionError::Failed("capture thread exited before opening the device".to_string())
        })??;

        let guard = StreamGuard::new(move || {
            let _ = stop_tx.send(());
        });

        Ok(CaptureStream::new(chunks, guard))
    }
}

/// Owns the cpal stream for the lifetime of one capture session.
fn capture_thread(
    constraints: CaptureConstraints,
    ready: oneshot::Sender<Result<mpsc::Receiver<AudioChunk>, AcquisitionError>>,
    stop: std_mpsc::Receiver<()>,
) {
    match open_stream(&constraints) {
        Ok((stream, chunks)) => {
            if ready.send(Ok(chunks)).is_err() {
                // Caller went away before the grant resolved; the stream
                // drops right here and the device is released.
                return;
            }
            // Park until the guard fires (or is dropped), then tear down.
            let _ = stop.recv();
            drop(stream);
            info!("capture device released");
        }
        Err(e) => {
            let _ = ready.send(Err(e));
        }
    }
}

fn open_stream(
    constraints: &CaptureConstraints,
) -> Result<(cpal::Stream, mpsc::Receiver<AudioChunk>), AcquisitionError> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or(AcquisitionError::DeviceNotFound)?;
    let name = device.name().unwrap_or_else(|_| "unknown".to_string());

    let supported = device
        .default_input_config()
        .map_err(classify_config_error)?;

    info!(
        device = %name,
        sample_rate = constraints.sample_rate,
        channels = constraints.channels,
        echo_cancellation = constraints.echo_cancellation,
        noise_suppression = constraints.noise_suppression,
        auto_gain = constraints.auto_gain,
        "opening capture device"
    );

    let requested = cpal::StreamConfig {
        channels: constraints.channels,
        sample_rate: cpal::SampleRate(constraints.sample_rate),
        buffer_size: cpal::BufferSize::Default,
    };

    let (tx, rx) = mpsc::channel(CHUNK_QUEUE);

    let stream = match supported.sample_format() {
        cpal::SampleFormat::I16 => build_stream::<i16>(&device, &requested, tx),
        cpal::SampleFormat::U16 => build_stream::<u16>(&device, &requested, tx),
        cpal::SampleFormat::F32 => build_stream::<f32>(&device, &requested, tx),
        other => {
            return Err(AcquisitionError::Failed(format!(
                "unsupported sample format {other:?}"
            )))
        }
    }
    .map_err(classify_build_error)?;

    stream
        .play()
        .map_err(|e| AcquisitionError::Failed(e.to_string()))?;

    Ok((stream, rx))
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    tx: mpsc::Sender<AudioChunk>,
) -> Result<cpal::Stream, cpal::BuildStreamError>
where
    T: cpal::SizedSample,
    i16: FromSample<T>,
{
    let started = Instant::now();
    device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            let mut pcm = Vec::with_capacity(data.len() * 2);
            for &sample in data {
                pcm.extend_from_slice(&i16::from_sample(sample).to_le_bytes());
            }
            let chunk = AudioChunk {
                pcm,
                offset_ms: started.elapsed().as_millis() as u64,
            };
            // The session stopped draining; drop rather than block the
            // audio callback.
            let _ = tx.try_send(chunk);
        },
        |err| warn!("capture stream error: {err}"),
        None,
    )
}

fn classify_build_error(err: cpal::BuildStreamError) -> AcquisitionError {
    match err {
        cpal::BuildStreamError::DeviceNotAvailable => AcquisitionError::DeviceNotFound,
        cpal::BuildStreamError::StreamConfigNotSupported => {
            AcquisitionError::Failed("requested capture format not supported".to_string())
        }
        cpal::BuildStreamError::BackendSpecific { err } => classify_backend(err.description),
        other => AcquisitionError::Failed(other.to_string()),
    }
}

fn classify_config_error(err: cpal::DefaultStreamConfigError) -> AcquisitionError {
    match err {
        cpal::DefaultStreamConfigError::DeviceNotAvailable => AcquisitionError::DeviceNotFound,
        cpal::DefaultStreamConfigError::BackendSpecific { err } => {
            classify_backend(err.description)
        }
        other => AcquisitionError::Failed(other.to_string()),
    }
}

fn classify_backend(description: String) -> AcquisitionError {
    let lower = description.to_ascii_lowercase();
    if lower.contains("permission") || lower.contains("denied") || lower.contains("not permitted") {
        AcquisitionError::PermissionDenied
    } else {
        AcquisitionError::Failed(description)
    }
}
