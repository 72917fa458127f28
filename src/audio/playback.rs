//! Sequential playback of decoded chunks
//!
//! A dedicated worker thread drains a FIFO queue, playing exactly one chunk
//! at a time through an [`AudioSink`]. Playback is independent of the
//! controller's session state: chunks queued before a stream ends keep
//! playing to completion.

use crate::audio::AudioChunk;
use crate::Result;
use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info, warn};

/// Output device abstraction
///
/// `play` blocks until the chunk has finished playing, which is what keeps
/// playback strictly sequential.
pub trait AudioSink {
    fn play(&mut self, chunk: &AudioChunk) -> Result<()>;
}

enum Signal {
    Queued,
    Shutdown,
}

#[derive(Default)]
struct QueueState {
    pending: Mutex<VecDeque<AudioChunk>>,
    playing: AtomicBool,
}

/// Handle for feeding and controlling the playback worker
#[derive(Clone)]
pub struct PlaybackHandle {
    state: Arc<QueueState>,
    signal_tx: Sender<Signal>,
    worker: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl PlaybackHandle {
    /// Append a decoded chunk to the tail of the queue
    pub fn enqueue(&self, chunk: AudioChunk) {
        self.state.pending.lock().push_back(chunk);
        // Worker gone means we are shutting down; the chunk is dropped
        let _ = self.signal_tx.send(Signal::Queued);
    }

    /// Drop all chunks that have not started playing.
    ///
    /// A chunk already in the sink finishes on its own.
    pub fn clear_pending(&self) {
        let dropped = {
            let mut pending = self.state.pending.lock();
            let n = pending.len();
            pending.clear();
            n
        };
        if dropped > 0 {
            debug!("Cleared {} pending chunk(s)", dropped);
        }
    }

    /// Whether a chunk is currently in the sink
    pub fn is_playing(&self) -> bool {
        self.state.playing.load(Ordering::SeqCst)
    }

    /// Number of chunks waiting behind the current one
    pub fn pending_len(&self) -> usize {
        self.state.pending.lock().len()
    }

    /// Whether nothing is playing and nothing is queued
    pub fn is_idle(&self) -> bool {
        // The worker flips `playing` while holding the pending lock, so this
        // snapshot is consistent
        let pending = self.state.pending.lock();
        pending.is_empty() && !self.state.playing.load(Ordering::SeqCst)
    }

    /// Total duration of queued (not yet playing) audio in seconds
    pub fn pending_duration_secs(&self) -> f32 {
        self.state
            .pending
            .lock()
            .iter()
            .map(|c| c.duration_secs())
            .sum()
    }

    /// Stop the worker after the current chunk and release the sink.
    ///
    /// Idempotent; a no-op when the worker already stopped or no sink was
    /// ever created.
    pub fn shutdown(&self) {
        let _ = self.signal_tx.send(Signal::Shutdown);
        if let Some(handle) = self.worker.lock().take() {
            if handle.join().is_err() {
                error!("Playback worker panicked");
            }
        }
    }
}

/// Spawns the playback worker thread
pub struct PlaybackWorker;

impl PlaybackWorker {
    /// Spawn a worker draining the queue through the sink `make_sink`
    /// produces.
    ///
    /// The sink is created lazily inside the worker thread on the first
    /// chunk (output streams are generally not `Send`); if creation fails,
    /// chunks are logged and dropped rather than failing the session.
    pub fn spawn<S, F>(make_sink: F) -> PlaybackHandle
    where
        S: AudioSink + 'static,
        F: FnOnce() -> Result<S> + Send + 'static,
    {
        let state = Arc::new(QueueState::default());
        let (signal_tx, signal_rx) = unbounded();

        let worker_state = Arc::clone(&state);
        let handle = thread::spawn(move || {
            run_worker(worker_state, signal_rx, make_sink);
        });

        PlaybackHandle {
            state,
            signal_tx,
            worker: Arc::new(Mutex::new(Some(handle))),
        }
    }
}

fn run_worker<S, F>(state: Arc<QueueState>, signal_rx: Receiver<Signal>, make_sink: F)
where
    S: AudioSink,
    F: FnOnce() -> Result<S>,
{
    info!("Playback worker starting");

    let mut make_sink = Some(make_sink);
    let mut sink: Option<S> = None;
    let mut sink_failed = false;

    loop {
        let next = {
            let mut pending = state.pending.lock();
            let next = pending.pop_front();
            state.playing.store(next.is_some(), Ordering::SeqCst);
            next
        };
        match next {
            Some(chunk) => {
                if sink.is_none() && !sink_failed {
                    if let Some(factory) = make_sink.take() {
                        match factory() {
                            Ok(s) => sink = Some(s),
                            Err(e) => {
                                error!("Audio output unavailable: {}", e);
                                sink_failed = true;
                            }
                        }
                    }
                }

                match sink.as_mut() {
                    Some(s) => {
                        debug!("Playing chunk ({:.2}s)", chunk.duration_secs());
                        if let Err(e) = s.play(&chunk) {
                            warn!("Playback failed, dropping chunk: {}", e);
                        }
                    }
                    None => debug!("No audio output, dropping chunk"),
                }
            }
            None => match signal_rx.recv() {
                Ok(Signal::Queued) => {}
                Ok(Signal::Shutdown) | Err(_) => break,
            },
        }
    }

    state.playing.store(false, Ordering::SeqCst);
    info!("Playback worker stopped");
}

/// Discards chunks; stands in for the device sink when audio output is
/// disabled
pub struct NullSink;

impl AudioSink for NullSink {
    fn play(&mut self, chunk: &AudioChunk) -> Result<()> {
        debug!("Discarding chunk ({:.2}s), audio output disabled", chunk.duration_secs());
        Ok(())
    }
}

/// Live output through the default device
#[cfg(feature = "audio-io")]
pub struct RodioSink {
    // Keeps the device stream alive for the lifetime of the sink
    _stream: rodio::OutputStream,
    sink: rodio::Sink,
}

#[cfg(feature = "audio-io")]
impl RodioSink {
    pub fn new() -> Result<Self> {
        use crate::VoxstreamError;

        let (stream, handle) = rodio::OutputStream::try_default()
            .map_err(|e| VoxstreamError::AudioDeviceError(e.to_string()))?;
        let sink = rodio::Sink::try_new(&handle)
            .map_err(|e| VoxstreamError::AudioDeviceError(e.to_string()))?;

        Ok(Self {
            _stream: stream,
            sink,
        })
    }
}

#[cfg(feature = "audio-io")]
impl AudioSink for RodioSink {
    fn play(&mut self, chunk: &AudioChunk) -> Result<()> {
        if chunk.is_empty() || chunk.sample_rate == 0 || chunk.channels == 0 {
            return Ok(());
        }

        let buffer =
            rodio::buffer::SamplesBuffer::new(chunk.channels, chunk.sample_rate, chunk.samples.clone());
        self.sink.append(buffer);
        self.sink.sleep_until_end();
        Ok(())
    }
}
