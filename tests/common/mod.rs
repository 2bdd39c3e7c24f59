// Shared fixtures for integration tests: a scriptable device gateway, a
// scripted transcription client, and channel taps on the message sink.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, Semaphore};

use voice_input::{
    AcquisitionError, AudioChunk, CaptureConstraints, CaptureStream, DeviceGateway, MessageSink,
    OutboundMessage, RecordingDeadline, SessionOptions, StreamGuard, Transcriber, Transcription,
    TranscriptionError, VoiceInput, MIN_PAYLOAD_BYTES,
};

pub fn options(deadline: RecordingDeadline) -> SessionOptions {
    SessionOptions {
        deadline,
        language: None,
    }
}

/// Poll until `cond` holds; paused-clock sleeps advance virtual time.
pub async fn wait_until(mut cond: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

/// Start a session, retrying while the previous attempt is still tearing
/// down (the conflict policy rejects until the task has fully finished).
pub async fn start_when_free(input: &Arc<VoiceInput>, opts: SessionOptions) {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match input.start(opts.clone()).await {
                Ok(()) => break,
                Err(_) => tokio::time::sleep(Duration::from_millis(5)).await,
            }
        }
    })
    .await
    .expect("start not accepted in time");
}

/// Feeding end of a granted mock capture stream.
pub struct MockDevice {
    sender: Arc<Mutex<Option<mpsc::Sender<AudioChunk>>>>,
}

impl MockDevice {
    /// Queue `bytes` of audio; false once the device has been released.
    pub fn feed(&self, bytes: usize) -> bool {
        let sender = self.sender.lock().unwrap().clone();
        match sender {
            Some(tx) => tx
                .try_send(AudioChunk {
                    pcm: vec![0u8; bytes],
                    offset_ms: 0,
                })
                .is_ok(),
            None => false,
        }
    }

    pub fn is_released(&self) -> bool {
        self.sender.lock().unwrap().is_none()
    }
}

/// Scriptable device gateway.
///
/// Grants immediately unless gated behind test-released permits; scripted
/// denials are served first. Counts live and peak simultaneous handles.
pub struct MockGateway {
    denials: Mutex<VecDeque<AcquisitionError>>,
    gate: Option<Arc<Semaphore>>,
    devices: mpsc::UnboundedSender<MockDevice>,
    live: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
    acquisitions: Arc<AtomicUsize>,
}

impl MockGateway {
    pub fn live_handles(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    pub fn peak_handles(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn acquisitions(&self) -> usize {
        self.acquisitions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DeviceGateway for MockGateway {
    async fn acquire(
        &self,
        _constraints: &CaptureConstraints,
    ) -> Result<CaptureStream, AcquisitionError> {
        self.acquisitions.fetch_add(1, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            match gate.acquire().await {
                Ok(permit) => permit.forget(),
                Err(_) => return Err(AcquisitionError::Failed("gate closed".to_string())),
            }
        }

        if let Some(err) = self.denials.lock().unwrap().pop_front() {
            return Err(err);
        }

        let (tx, rx) = mpsc::channel(64);
        let sender = Arc::new(Mutex::new(Some(tx)));
        let _ = self.devices.send(MockDevice {
            sender: Arc::clone(&sender),
        });

        let live = Arc::clone(&self.live);
        let peak = Arc::clone(&self.peak);
        let n = live.fetch_add(1, Ordering::SeqCst) + 1;
        peak.fetch_max(n, Ordering::SeqCst);

        let guard = StreamGuard::new(move || {
            // Dropping the sender ends the chunk stream for the session and
            // invalidates the test's feeding handle.
            sender.lock().unwrap().take();
            live.fetch_sub(1, Ordering::SeqCst);
        });

        Ok(CaptureStream::new(rx, guard))
    }
}

/// Transcriber that serves scripted responses in order.
pub struct MockTranscriber {
    responses: Mutex<VecDeque<Result<Transcription, TranscriptionError>>>,
    calls: AtomicUsize,
    last_hint: Mutex<Option<String>>,
    last_audio_bytes: AtomicUsize,
}

impl MockTranscriber {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_hint(&self) -> Option<String> {
        self.last_hint.lock().unwrap().clone()
    }

    pub fn last_audio_bytes(&self) -> usize {
        self.last_audio_bytes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transcriber for MockTranscriber {
    async fn transcribe(
        &self,
        wav: Vec<u8>,
        language_hint: Option<&str>,
    ) -> Result<Transcription, TranscriptionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.last_audio_bytes.store(wav.len(), Ordering::SeqCst);
        *self.last_hint.lock().unwrap() = language_hint.map(str::to_string);

        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Ok(Transcription {
                    text: "mock transcript".to_string(),
                    language: None,
                })
            })
    }
}

pub struct Harness {
    pub input: Arc<VoiceInput>,
    pub gateway: Arc<MockGateway>,
    pub transcriber: Arc<MockTranscriber>,
    pub devices: mpsc::UnboundedReceiver<MockDevice>,
    pub messages: mpsc::UnboundedReceiver<OutboundMessage>,
    pub notices: mpsc::UnboundedReceiver<&'static str>,
}

pub struct HarnessBuilder {
    gate: Option<Arc<Semaphore>>,
    denials: VecDeque<AcquisitionError>,
    responses: VecDeque<Result<Transcription, TranscriptionError>>,
}

impl HarnessBuilder {
    pub fn new() -> Self {
        Self {
            gate: None,
            denials: VecDeque::new(),
            responses: VecDeque::new(),
        }
    }

    /// Hold acquisitions until the test adds permits (permission prompt).
    pub fn gated(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Fail the next acquisition with `err`.
    pub fn deny(mut self, err: AcquisitionError) -> Self {
        self.denials.push_back(err);
        self
    }

    /// Script the next transcription response.
    pub fn respond(mut self, text: &str, language: Option<&str>) -> Self {
        self.responses.push_back(Ok(Transcription {
            text: text.to_string(),
            language: language.map(str::to_string),
        }));
        self
    }

    /// Fail the next transcription with the given HTTP status.
    pub fn respond_err(mut self, status: u16) -> Self {
        self.responses.push_back(Err(TranscriptionError::Status {
            status: reqwest::StatusCode::from_u16(status).unwrap(),
            body: "scripted failure".to_string(),
        }));
        self
    }

    pub fn build(self) -> Harness {
        let (device_tx, devices) = mpsc::unbounded_channel();
        let gateway = Arc::new(MockGateway {
            denials: Mutex::new(self.denials),
            gate: self.gate,
            devices: device_tx,
            live: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
            acquisitions: Arc::new(AtomicUsize::new(0)),
        });
        let transcriber = Arc::new(MockTranscriber {
            responses: Mutex::new(self.responses),
            calls: AtomicUsize::new(0),
            last_hint: Mutex::new(None),
            last_audio_bytes: AtomicUsize::new(0),
        });

        let (message_tx, messages) = mpsc::unbounded_channel();
        let (notice_tx, notices) = mpsc::unbounded_channel();
        let sink = MessageSink::new(message_tx, notice_tx);

        let input = Arc::new(VoiceInput::new(
            Arc::clone(&gateway) as Arc<dyn DeviceGateway>,
            Arc::clone(&transcriber) as Arc<dyn Transcriber>,
            CaptureConstraints::default(),
            MIN_PAYLOAD_BYTES,
            sink,
        ));

        Harness {
            input,
            gateway,
            transcriber,
            devices,
            messages,
            notices,
        }
    }
}
