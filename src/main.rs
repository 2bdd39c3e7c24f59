use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::mpsc;
use tracing::info;

use voice_input::{
    AppState, Config, MessageSink, MicrophoneGateway, VoiceInput, WhisperClient,
};

#[derive(Parser)]
#[command(name = "voice-input")]
#[command(about = "Voice capture and transcription for the chat input")]
struct Args {
    /// Path to the configuration file (without extension)
    #[arg(short, long, default_value = "config/voice-input")]
    config: String,

    /// Widget id registered at startup
    #[arg(long, default_value = "chat")]
    widget_id: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config).context("Failed to load configuration")?;

    info!("{} v0.1.0", cfg.service.name);

    let (message_tx, mut message_rx) = mpsc::unbounded_channel();
    let (notice_tx, mut notice_rx) = mpsc::unbounded_channel();
    let sink = MessageSink::new(message_tx, notice_tx);

    let gateway = Arc::new(MicrophoneGateway::new());
    let transcriber = Arc::new(WhisperClient::new(&cfg.transcription));
    let input = Arc::new(VoiceInput::new(
        gateway,
        transcriber,
        cfg.capture.constraints(),
        cfg.capture.min_payload_bytes,
        sink,
    ));

    // The chat pipeline and its renderer live outside this service; log
    // what downstream consumers would receive.
    tokio::spawn(async move {
        while let Some(message) = message_rx.recv().await {
            info!(language = %message.language, "outbound message: {}", message.content);
        }
    });
    tokio::spawn(async move {
        while let Some(notice) = notice_rx.recv().await {
            info!("notice: {notice}");
        }
    });

    let state = AppState::new();
    state.register(args.widget_id, input).await;

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    info!("listening on {addr}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, voice_input::create_router(state)).await?;

    Ok(())
}
