use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{info, warn};
use uuid::Uuid;

use super::config::SessionOptions;
use super::payload;
use super::state::{SessionPhase, SessionSnapshot};
use crate::capture::{AudioChunk, CaptureConstraints, DeviceGateway};
use crate::sink::{MessageSink, SessionFailure};
use crate::transcribe::Transcriber;

/// Progress clock period while recording.
const PROGRESS_TICK: Duration = Duration::from_millis(100);

/// Rejected start request.
#[derive(Debug, Error)]
pub enum StartError {
    /// A capture is already live for this widget; the running session is
    /// left untouched and no second device handle is opened.
    #[error("a capture session is already active")]
    SessionActive,
}

#[derive(Debug, Clone, Copy)]
enum Command {
    Stop,
    Cancel,
}

/// Why the recording loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StopTrigger {
    Deadline,
    Manual,
    StreamEnded,
    Cancelled,
}

enum SessionOutcome {
    Delivered,
    Cancelled,
    Failed(SessionFailure),
}

struct ActiveSession {
    commands: mpsc::UnboundedSender<Command>,
    task: JoinHandle<()>,
}

/// Voice capture entry point for one input widget.
///
/// Owns at most one live capture session at a time. Each attempt walks
/// `RequestingAccess → Recording → Stopping → Validating → Transcribing`
/// and lands back on `Idle` whatever happens: the device is released, the
/// timers die with the recording loop, and a transcript or a diagnostic is
/// routed through the sink.
pub struct VoiceInput {
    gateway: Arc<dyn DeviceGateway>,
    transcriber: Arc<dyn Transcriber>,
    constraints: CaptureConstraints,
    min_payload_bytes: usize,
    sink: MessageSink,
    snapshot: watch::Sender<SessionSnapshot>,
    active: Mutex<Option<ActiveSession>>,
}

impl VoiceInput {
    pub fn new(
        gateway: Arc<dyn DeviceGateway>,
        transcriber: Arc<dyn Transcriber>,
        constraints: CaptureConstraints,
        min_payload_bytes: usize,
        sink: MessageSink,
    ) -> Self {
        let (snapshot, _) = watch::channel(SessionSnapshot::idle());
        Self {
            gateway,
            transcriber,
            constraints,
            min_payload_bytes,
            sink,
            snapshot,
            active: Mutex::new(None),
        }
    }

    /// Subscribe to UI snapshots.
    pub fn watch(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot.subscribe()
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        *self.snapshot.borrow()
    }

    /// Start a capture attempt.
    ///
    /// Rejected while another attempt is live: one device handle per
    /// widget, never two.
    pub async fn start(self: &Arc<Self>, options: SessionOptions) -> Result<(), StartError> {
        let mut active = self.active.lock().await;
        if let Some(session) = active.as_ref() {
            if !session.task.is_finished() {
                return Err(StartError::SessionActive);
            }
        }

        let (commands, command_rx) = mpsc::unbounded_channel();
        let session_id = Uuid::new_v4();
        let this = Arc::clone(self);
        let task = tokio::spawn(async move { this.run_session(session_id, options, command_rx).await });

        *active = Some(ActiveSession { commands, task });
        Ok(())
    }

    /// Request a manual stop. Races the deadline timer; only the first
    /// trigger takes effect. No-op when nothing is recording.
    pub async fn stop(&self) {
        self.send(Command::Stop).await;
    }

    /// Cancel the active attempt from any state: the device is released,
    /// buffered audio is discarded, and no transcription call is made.
    pub async fn cancel(&self) {
        self.send(Command::Cancel).await;
    }

    async fn send(&self, command: Command) {
        let active = self.active.lock().await;
        if let Some(session) = active.as_ref() {
            // A finished task has dropped its receiver; the failed send is
            // exactly the no-op we want.
            let _ = session.commands.send(command);
        }
    }

    fn publish(&self, snapshot: SessionSnapshot) {
        self.snapshot.send_replace(snapshot);
    }

    async fn run_session(
        self: Arc<Self>,
        session_id: Uuid,
        options: SessionOptions,
        mut commands: mpsc::UnboundedReceiver<Command>,
    ) {
        info!(
            %session_id,
            deadline_ms = options.deadline.as_millis(),
            language = options.language.as_deref().unwrap_or("auto"),
            "capture session starting"
        );

        let outcome = self.drive(session_id, &options, &mut commands).await;

        // Every exit path lands here with the device released and the
        // timers gone; the widget is interactive again.
        self.publish(SessionSnapshot::new(
            SessionPhase::Idle,
            0.0,
            options.deadline,
        ));

        match outcome {
            SessionOutcome::Delivered => info!(%session_id, "capture session completed"),
            SessionOutcome::Cancelled => info!(%session_id, "capture session cancelled"),
            SessionOutcome::Failed(failure) => self.sink.notify_failure(failure),
        }
    }

    async fn drive(
        &self,
        session_id: Uuid,
        options: &SessionOptions,
        commands: &mut mpsc::UnboundedReceiver<Command>,
    ) -> SessionOutcome {
        let deadline = options.deadline;

        // --- RequestingAccess ---------------------------------------------
        self.publish(SessionSnapshot::new(
            SessionPhase::RequestingAccess,
            0.0,
            deadline,
        ));

        let gateway = Arc::clone(&self.gateway);
        let constraints = self.constraints.clone();
        let mut acquire = Box::pin(async move { gateway.acquire(&constraints).await });

        let granted = tokio::select! {
            granted = &mut acquire => Some(granted),
            // Nothing is buffered yet, so stop means cancel here.
            _ = commands.recv() => None,
        };

        let mut stream = match granted {
            Some(Ok(stream)) => stream,
            Some(Err(err)) => {
                warn!(%session_id, error = %err, "device acquisition failed");
                return SessionOutcome::Failed(SessionFailure::from(&err));
            }
            None => {
                // The permission prompt may still resolve; a reaper waits on
                // it so a late grant is released immediately.
                tokio::spawn(async move {
                    if let Ok(stream) = acquire.await {
                        let _ = stream.release();
                    }
                });
                info!(%session_id, "cancelled while requesting access");
                return SessionOutcome::Cancelled;
            }
        };

        // --- Recording ----------------------------------------------------
        let started = Instant::now();
        let mut chunks: Vec<AudioChunk> = Vec::new();
        let mut progress = 0.0_f64;

        self.publish(SessionSnapshot::new(SessionPhase::Recording, 0.0, deadline));
        info!(%session_id, "recording");

        let mut ticker = time::interval(PROGRESS_TICK);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let deadline_sleep = time::sleep_until(started + deadline.duration());
        tokio::pin!(deadline_sleep);

        let trigger = loop {
            tokio::select! {
                // Leaving this loop removes both timer arms, so whichever
                // stop trigger loses the race has nothing left to fire.
                _ = &mut deadline_sleep => break StopTrigger::Deadline,
                command = commands.recv() => match command {
                    Some(Command::Stop) => break StopTrigger::Manual,
                    Some(Command::Cancel) | None => break StopTrigger::Cancelled,
                },
                chunk = stream.next_chunk() => match chunk {
                    Some(chunk) => chunks.push(chunk),
                    None => break StopTrigger::StreamEnded,
                },
                _ = ticker.tick() => {
                    progress = (started.elapsed().as_secs_f64()
                        / deadline.duration().as_secs_f64())
                        .clamp(0.0, 1.0);
                    self.publish(SessionSnapshot::new(
                        SessionPhase::Recording,
                        progress,
                        deadline,
                    ));
                }
            }
        };

        if trigger == StopTrigger::Cancelled {
            let _ = stream.release();
            info!(%session_id, "capture cancelled; audio discarded");
            return SessionOutcome::Cancelled;
        }

        // --- Stopping -----------------------------------------------------
        self.publish(SessionSnapshot::new(
            SessionPhase::Stopping,
            progress,
            deadline,
        ));

        // Release the device first, then drain what the capture side had
        // already queued; the channel ends once its sender is gone.
        let mut rest = stream.release();
        while let Some(chunk) = rest.recv().await {
            chunks.push(chunk);
        }

        info!(
            %session_id,
            trigger = ?trigger,
            chunks = chunks.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "capture stopped"
        );

        // A cancel that raced the stop is still honored before any
        // network call is made.
        while let Ok(command) = commands.try_recv() {
            if matches!(command, Command::Cancel) {
                info!(%session_id, "cancelled before transcription");
                return SessionOutcome::Cancelled;
            }
        }

        // --- Validating ---------------------------------------------------
        self.publish(SessionSnapshot::new(
            SessionPhase::Validating,
            progress,
            deadline,
        ));

        let audio = match payload::validate(chunks, self.min_payload_bytes) {
            Ok(audio) => audio,
            Err(insufficient) => {
                info!(
                    %session_id,
                    bytes = insufficient.total_bytes,
                    "capture below minimum size; skipping transcription"
                );
                return SessionOutcome::Failed(SessionFailure::InsufficientAudio);
            }
        };

        // --- Transcribing -------------------------------------------------
        self.publish(SessionSnapshot::new(
            SessionPhase::Transcribing,
            progress,
            deadline,
        ));
        info!(%session_id, bytes = audio.total_bytes(), "submitting audio for transcription");

        let wav = match audio.into_wav(&self.constraints) {
            Ok(wav) => wav,
            Err(err) => {
                warn!(%session_id, error = %err, "failed to assemble upload payload");
                return SessionOutcome::Failed(SessionFailure::TranscriptionService);
            }
        };

        let hint = options
            .language
            .as_deref()
            .filter(|l| !l.is_empty() && *l != "auto");
        let transcribing = self.transcriber.transcribe(wav, hint);
        tokio::pin!(transcribing);

        loop {
            tokio::select! {
                result = &mut transcribing => {
                    return match result {
                        Ok(transcription) => match self.sink.deliver(transcription, hint) {
                            Ok(()) => SessionOutcome::Delivered,
                            Err(failure) => SessionOutcome::Failed(failure),
                        },
                        Err(err) => {
                            warn!(%session_id, error = %err, "transcription failed");
                            SessionOutcome::Failed(SessionFailure::TranscriptionService)
                        }
                    };
                }
                command = commands.recv() => match command {
                    // Dropping the in-flight call abandons it; no device is
                    // held at this point.
                    Some(Command::Cancel) | None => {
                        info!(%session_id, "cancelled while transcribing");
                        return SessionOutcome::Cancelled;
                    }
                    Some(Command::Stop) => {}
                },
            }
        }
    }
}
