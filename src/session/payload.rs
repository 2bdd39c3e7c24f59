use anyhow::{Context, Result};
use std::io::Cursor;

use crate::capture::{AudioChunk, CaptureConstraints};

/// Captures smaller than this are treated as silence and never uploaded.
///
/// Size heuristic only: a microphone opened and immediately closed, or an
/// ambient-noise capture, stays under it. No signal inspection happens.
pub const MIN_PAYLOAD_BYTES: usize = 4096;

/// A capture that failed the minimum-size check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsufficientAudio {
    pub total_bytes: usize,
}

/// Audio that passed validation, frozen and ready for upload.
#[derive(Debug, Clone)]
pub struct ValidAudio {
    chunks: Vec<AudioChunk>,
    total_bytes: usize,
}

/// Check the frozen chunk buffer against the minimum-size threshold.
pub fn validate(
    chunks: Vec<AudioChunk>,
    min_bytes: usize,
) -> Result<ValidAudio, InsufficientAudio> {
    let total_bytes = chunks.iter().map(|c| c.pcm.len()).sum();
    if total_bytes < min_bytes {
        Err(InsufficientAudio { total_bytes })
    } else {
        Ok(ValidAudio {
            chunks,
            total_bytes,
        })
    }
}

impl ValidAudio {
    pub fn total_bytes(&self) -> usize {
        self.total_bytes
    }

    /// Frame the PCM chunks as a WAV container for the multipart upload.
    /// Samples are carried over unconverted, in capture order.
    pub fn into_wav(self, constraints: &CaptureConstraints) -> Result<Vec<u8>> {
        let spec = hound::WavSpec {
            channels: constraints.channels,
            sample_rate: constraints.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec)
                .context("Failed to start WAV container")?;
            for chunk in &self.chunks {
                for bytes in chunk.pcm.chunks_exact(2) {
                    writer
                        .write_sample(i16::from_le_bytes([bytes[0], bytes[1]]))
                        .context("Failed to write sample to WAV")?;
                }
            }
            writer.finalize().context("Failed to finalize WAV")?;
        }

        Ok(cursor.into_inner())
    }
}
