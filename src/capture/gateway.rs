use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

/// A fragment of captured audio as delivered by the device.
#[derive(Debug, Clone)]
pub struct AudioChunk {
    /// Raw sample bytes (i16 PCM, little-endian, interleaved)
    pub pcm: Vec<u8>,
    /// Milliseconds since capture started
    pub offset_ms: u64,
}

/// Capture settings requested from the device.
///
/// Every field is requested exactly as given. A device that cannot satisfy
/// the format fails acquisition instead of silently negotiating a fallback.
#[derive(Debug, Clone)]
pub struct CaptureConstraints {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels (1 = mono)
    pub channels: u16,
    pub echo_cancellation: bool,
    pub noise_suppression: bool,
    pub auto_gain: bool,
}

impl Default for CaptureConstraints {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            channels: 1,
            echo_cancellation: true,
            noise_suppression: true,
            auto_gain: true,
        }
    }
}

/// Why microphone acquisition failed.
///
/// Platform error codes are classified here; callers only ever see these
/// three cases and map each to its own user-facing message.
#[derive(Debug, Error)]
pub enum AcquisitionError {
    #[error("microphone permission denied")]
    PermissionDenied,
    #[error("no capture device available")]
    DeviceNotFound,
    #[error("failed to open capture device: {0}")]
    Failed(String),
}

/// Releases the underlying device when fired or dropped, exactly once.
pub struct StreamGuard {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl StreamGuard {
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// Stop the device now instead of waiting for drop.
    pub fn release(mut self) {
        self.fire();
    }

    fn fire(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        self.fire();
    }
}

/// A live capture: ordered chunk delivery plus the device handle.
///
/// Once the guard fires, the device stops producing and drops its sender,
/// so the receiver yields any already-queued chunks and then ends.
pub struct CaptureStream {
    chunks: mpsc::Receiver<AudioChunk>,
    guard: StreamGuard,
}

impl CaptureStream {
    pub fn new(chunks: mpsc::Receiver<AudioChunk>, guard: StreamGuard) -> Self {
        Self { chunks, guard }
    }

    /// Next chunk from the device, in capture order.
    pub async fn next_chunk(&mut self) -> Option<AudioChunk> {
        self.chunks.recv().await
    }

    /// Stop the device and hand back the receiver so the caller can drain
    /// whatever was queued before the stop took effect.
    pub fn release(self) -> mpsc::Receiver<AudioChunk> {
        self.guard.release();
        self.chunks
    }
}

/// Microphone access.
///
/// Implementations hold no state between calls; each `acquire` yields an
/// independent stream whose lifetime is governed solely by its guard.
#[async_trait]
pub trait DeviceGateway: Send + Sync {
    /// Request microphone access with the given constraints.
    ///
    /// May suspend indefinitely on a user permission prompt.
    async fn acquire(
        &self,
        constraints: &CaptureConstraints,
    ) -> Result<CaptureStream, AcquisitionError>;
}
