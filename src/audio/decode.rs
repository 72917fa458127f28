use crate::audio::AudioChunk;
use crate::{Result, VoxstreamError};
use rodio::{Decoder, Source};
use std::io::Cursor;
use tracing::debug;

/// Decode one encoded audio chunk into PCM samples.
///
/// The decoder sniffs the container format, so the backend's MP3 payloads
/// decode, as do WAV/FLAC/Vorbis. Decoding is synchronous: the caller
/// processes chunks one at a time, which keeps enqueue order identical to
/// frame-arrival order.
pub fn decode_chunk(data: &[u8]) -> Result<AudioChunk> {
    if data.is_empty() {
        return Err(VoxstreamError::DecodeError("Empty chunk payload".into()));
    }

    let cursor = Cursor::new(data.to_vec());
    let source =
        Decoder::new(cursor).map_err(|e| VoxstreamError::DecodeError(e.to_string()))?;

    let sample_rate = source.sample_rate();
    let channels = source.channels();
    let samples: Vec<f32> = source.convert_samples().collect();

    if samples.is_empty() {
        return Err(VoxstreamError::DecodeError(
            "Chunk decoded to zero samples".into(),
        ));
    }

    debug!(
        "Decoded chunk: {} samples, {} Hz, {} channel(s)",
        samples.len(),
        sample_rate,
        channels
    );

    Ok(AudioChunk::new(samples, sample_rate, channels))
}
