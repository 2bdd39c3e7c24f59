// Tests for the minimum-size validator and WAV framing of the upload body.

use std::io::Cursor;

use voice_input::session::{validate, MIN_PAYLOAD_BYTES};
use voice_input::{AudioChunk, CaptureConstraints};

fn chunk_of(bytes: usize) -> AudioChunk {
    AudioChunk {
        pcm: vec![0u8; bytes],
        offset_ms: 0,
    }
}

fn chunk_from_samples(samples: &[i16], offset_ms: u64) -> AudioChunk {
    AudioChunk {
        pcm: samples.iter().flat_map(|s| s.to_le_bytes()).collect(),
        offset_ms,
    }
}

#[test]
fn short_capture_is_rejected() {
    let err = validate(vec![chunk_of(2_000)], MIN_PAYLOAD_BYTES).unwrap_err();
    assert_eq!(err.total_bytes, 2_000);
}

#[test]
fn empty_capture_is_rejected() {
    let err = validate(Vec::new(), MIN_PAYLOAD_BYTES).unwrap_err();
    assert_eq!(err.total_bytes, 0);
}

#[test]
fn threshold_is_inclusive() {
    assert!(validate(vec![chunk_of(MIN_PAYLOAD_BYTES - 1)], MIN_PAYLOAD_BYTES).is_err());

    let audio = validate(vec![chunk_of(MIN_PAYLOAD_BYTES)], MIN_PAYLOAD_BYTES).unwrap();
    assert_eq!(audio.total_bytes(), MIN_PAYLOAD_BYTES);
}

#[test]
fn chunk_sizes_sum_across_the_buffer() {
    let chunks = vec![chunk_of(1_500), chunk_of(1_500), chunk_of(1_500)];
    let audio = validate(chunks, MIN_PAYLOAD_BYTES).unwrap();
    assert_eq!(audio.total_bytes(), 4_500);
}

#[test]
fn wav_framing_preserves_format_and_sample_order() {
    let mut chunks = vec![
        chunk_from_samples(&[1, 2, 3], 0),
        chunk_from_samples(&[4, 5, 6], 100),
    ];
    // Pad past the threshold with a trailing silent chunk.
    chunks.push(chunk_of(MIN_PAYLOAD_BYTES));

    let constraints = CaptureConstraints::default();
    let audio = validate(chunks, MIN_PAYLOAD_BYTES).unwrap();
    let wav = audio.into_wav(&constraints).unwrap();

    let reader = hound::WavReader::new(Cursor::new(wav)).unwrap();
    let spec = reader.spec();
    assert_eq!(spec.sample_rate, constraints.sample_rate);
    assert_eq!(spec.channels, constraints.channels);
    assert_eq!(spec.bits_per_sample, 16);

    let samples: Vec<i16> = reader.into_samples::<i16>().map(Result::unwrap).collect();
    assert_eq!(&samples[..6], &[1, 2, 3, 4, 5, 6]);
    assert_eq!(samples.len(), 6 + MIN_PAYLOAD_BYTES / 2);
}
