use anyhow::Result;
use serde::Deserialize;

use crate::capture::CaptureConstraints;
use crate::session::MIN_PAYLOAD_BYTES;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub transcription: TranscriptionConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct CaptureConfig {
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    #[serde(default = "default_channels")]
    pub channels: u16,
    #[serde(default = "default_enabled")]
    pub echo_cancellation: bool,
    #[serde(default = "default_enabled")]
    pub noise_suppression: bool,
    #[serde(default = "default_enabled")]
    pub auto_gain: bool,
    #[serde(default = "default_min_payload_bytes")]
    pub min_payload_bytes: usize,
}

impl CaptureConfig {
    pub fn constraints(&self) -> CaptureConstraints {
        CaptureConstraints {
            sample_rate: self.sample_rate,
            channels: self.channels,
            echo_cancellation: self.echo_cancellation,
            noise_suppression: self.noise_suppression,
            auto_gain: self.auto_gain,
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            channels: default_channels(),
            echo_cancellation: default_enabled(),
            noise_suppression: default_enabled(),
            auto_gain: default_enabled(),
            min_payload_bytes: default_min_payload_bytes(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TranscriptionConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Usually supplied as VOICE_INPUT_TRANSCRIPTION__API_KEY rather than
    /// written into the config file
    #[serde(default)]
    pub api_key: String,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            api_key: String::new(),
        }
    }
}

fn default_sample_rate() -> u32 {
    48_000
}

fn default_channels() -> u16 {
    1
}

fn default_enabled() -> bool {
    true
}

fn default_min_payload_bytes() -> usize {
    MIN_PAYLOAD_BYTES
}

fn default_endpoint() -> String {
    "https://api.openai.com/v1/audio/transcriptions".to_string()
}

fn default_model() -> String {
    "whisper-1".to_string()
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("VOICE_INPUT").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
