//! Audio decode and playback

mod chunk;
mod decode;
mod playback;

pub use chunk::AudioChunk;
pub use decode::decode_chunk;
pub use playback::{AudioSink, NullSink, PlaybackHandle, PlaybackWorker};

#[cfg(feature = "audio-io")]
pub use playback::RodioSink;
