//! Audio sample helpers
//!
//! The decoding core consumes raw `f32` sample buffers; container parsing
//! (WAV headers etc.) is owned by callers. These helpers cover the one wire
//! format the service accepts directly: headerless little-endian 16-bit PCM.

use crate::error::AudioError;

/// Convert headerless little-endian 16-bit PCM bytes to samples.
///
/// Samples keep their raw i16 amplitude range (not normalized to [-1, 1]),
/// which is what the decoding engine's feature pipeline expects.
pub fn pcm16_to_samples(bytes: &[u8]) -> Result<Vec<f32>, AudioError> {
    if bytes.len() % 2 != 0 {
        return Err(AudioError::InvalidPcm(format!(
            "odd byte length {} for 16-bit PCM",
            bytes.len()
        )));
    }

    Ok(bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32)
        .collect())
}

/// Duration in seconds of a sample buffer at the given sample rate
pub fn duration_seconds(num_samples: usize, sample_rate: f32) -> f32 {
    if sample_rate <= 0.0 {
        return 0.0;
    }
    num_samples as f32 / sample_rate
}
