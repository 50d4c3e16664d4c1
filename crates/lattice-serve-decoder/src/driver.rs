//! Streaming chunk driver
//!
//! Audio reaches a session either incrementally (the caller forwards chunks
//! to [`DecoderSession::feed_chunk`] as they arrive) or as one complete
//! buffer fed through [`feed_buffer`]. Both paths go through the identical
//! `feed_chunk` call, so for a fixed signal any valid partition into
//! consecutive chunks produces the same final search outcome.

use lattice_serve_core::error::DecodeError;

use crate::session::DecoderSession;

/// Nominal chunk duration for batch feeding
pub const DEFAULT_CHUNK_SECONDS: f32 = 1.0;

/// Partition a buffer into consecutive, non-overlapping decode chunks
///
/// The final chunk may be shorter. A non-positive `chunk_seconds` means the
/// whole buffer is one chunk; the chunk length never falls below one sample.
pub fn plan_chunks(
    samples: &[f32],
    sample_rate: f32,
    chunk_seconds: f32,
) -> impl Iterator<Item = &[f32]> {
    let chunk_len = if chunk_seconds > 0.0 {
        ((sample_rate * chunk_seconds) as usize).max(1)
    } else {
        samples.len().max(1)
    };
    samples.chunks(chunk_len)
}

/// Feed a complete audio buffer through the streaming path
///
/// Equivalent to the caller splitting the buffer at `chunk_seconds`
/// boundaries and feeding each piece to `feed_chunk` in order.
pub fn feed_buffer(
    session: &mut DecoderSession,
    sample_rate: f32,
    samples: &[f32],
    chunk_seconds: f32,
) -> Result<(), DecodeError> {
    for chunk in plan_chunks(samples, sample_rate, chunk_seconds) {
        session.feed_chunk(sample_rate, chunk)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_default_chunks() {
        let samples = vec![0.0f32; 40_000]; // 2.5 s at 16 kHz
        let chunks: Vec<&[f32]> = plan_chunks(&samples, 16000.0, 1.0).collect();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 16000);
        assert_eq!(chunks[1].len(), 16000);
        assert_eq!(chunks[2].len(), 8000);
    }

    #[test]
    fn test_partition_covers_every_sample_once() {
        let samples: Vec<f32> = (0..1000).map(|i| i as f32).collect();
        let rejoined: Vec<f32> = plan_chunks(&samples, 8000.0, 0.017)
            .flatten()
            .copied()
            .collect();
        assert_eq!(rejoined, samples);
    }

    #[test]
    fn test_non_positive_duration_means_whole_buffer() {
        let samples = vec![0.0f32; 5000];
        let chunks: Vec<&[f32]> = plan_chunks(&samples, 16000.0, 0.0).collect();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].len(), 5000);

        let chunks: Vec<&[f32]> = plan_chunks(&samples, 16000.0, -1.0).collect();
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn test_minimum_chunk_is_one_sample() {
        let samples = vec![0.0f32; 4];
        // duration so small it rounds to zero samples per chunk
        let chunks: Vec<&[f32]> = plan_chunks(&samples, 16000.0, 1e-9).collect();
        assert_eq!(chunks.len(), 4);
    }

    #[test]
    fn test_empty_buffer_yields_no_chunks() {
        let samples: Vec<f32> = Vec::new();
        assert_eq!(plan_chunks(&samples, 16000.0, 1.0).count(), 0);
    }
}
