//! Interaction controller
//!
//! Owns the end-to-end flow for one question at a time: submit the text,
//! receive a session identifier, open the audio stream, decode chunks as
//! they arrive and hand them to the playback queue, and expose a derived
//! busy flag and status line to the presentation layer.

mod state;

pub use state::SessionPhase;

use crate::api::AskClient;
use crate::audio::{decode_chunk, PlaybackHandle};
use crate::config::ApiConfig;
use crate::stream::{spawn_reader, StreamEvent, StreamEventKind, StreamFrame};
use crate::Result;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Controller for the question/answer exchange
pub struct Controller {
    client: AskClient,
    playback: PlaybackHandle,
    phase: SessionPhase,

    /// Generation id of the current session; stream events from any other
    /// generation are discarded
    generation: Option<Uuid>,

    event_tx: UnboundedSender<StreamEvent>,
    event_rx: UnboundedReceiver<StreamEvent>,
    reader: Option<JoinHandle<()>>,
}

impl Controller {
    /// Create a controller for the given endpoints and playback queue
    pub fn new(config: ApiConfig, playback: PlaybackHandle) -> Self {
        let (event_tx, event_rx) = unbounded_channel();
        Self {
            client: AskClient::new(config),
            playback,
            phase: SessionPhase::Idle,
            generation: None,
            event_tx,
            event_rx,
            reader: None,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Busy flag for the presentation layer
    pub fn is_busy(&self) -> bool {
        self.phase.is_busy()
    }

    /// Status line for the presentation layer
    pub fn status(&self) -> &'static str {
        self.phase.status_text()
    }

    /// Playback queue handle (for draining checks and teardown)
    pub fn playback(&self) -> &PlaybackHandle {
        &self.playback
    }

    /// Submit a question and start streaming its answer.
    ///
    /// A whitespace-only question is a no-op. Submission failures are
    /// recovered locally: the phase carries the error status and the
    /// controller stays ready for the next question.
    pub async fn ask(&mut self, question: &str) -> Result<()> {
        let question = question.trim();
        if question.is_empty() {
            debug!("Ignoring empty question");
            return Ok(());
        }

        // Residual audio from a previous answer must not play into this one
        self.playback.clear_pending();

        // A superseded reader's events would be discarded anyway once the
        // generation changes; aborting it just reclaims the socket early
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }

        self.phase = SessionPhase::Submitting;
        info!("Submitting question ({} chars)", question.len());

        let session_id = match self.client.ask(question).await {
            Ok(id) => id,
            Err(e) => {
                warn!("Submission failed: {}", e);
                self.generation = None;
                self.phase = SessionPhase::SubmitFailed;
                return Ok(());
            }
        };

        let generation = Uuid::new_v4();
        self.generation = Some(generation);
        self.phase = SessionPhase::Connecting;

        let url = self.client.config().stream_url(&session_id);
        self.reader = Some(spawn_reader(url, generation, self.event_tx.clone()));
        Ok(())
    }

    /// Apply one stream event.
    ///
    /// Events run to completion one at a time and chunks are decoded inline,
    /// so playback order always matches frame-arrival order.
    pub fn handle_event(&mut self, event: StreamEvent) {
        if self.generation != Some(event.generation) {
            debug!(
                "Discarding event from superseded session {}",
                event.generation
            );
            return;
        }

        match event.kind {
            StreamEventKind::Opened => {
                if self.phase == SessionPhase::Connecting {
                    self.phase = SessionPhase::Receiving;
                }
            }
            StreamEventKind::Frame(StreamFrame::Audio(data)) => {
                match decode_chunk(&data) {
                    Ok(chunk) => self.playback.enqueue(chunk),
                    // A bad chunk is dropped; the stream continues
                    Err(e) => warn!("Error processing audio chunk: {}", e),
                }
            }
            StreamEventKind::Frame(StreamFrame::End) => {
                info!("Audio stream complete");
                self.phase = SessionPhase::Complete;
            }
            StreamEventKind::Frame(StreamFrame::ServerError(msg)) => {
                warn!("Backend reported stream failure: {}", msg);
                self.phase = SessionPhase::StreamFailed;
            }
            StreamEventKind::Failed(e) => {
                warn!("Stream failed: {}", e);
                self.phase = SessionPhase::StreamFailed;
            }
            StreamEventKind::Closed => {
                debug!("Stream closed");
                // A close after END or an error keeps that terminal status
                if self.phase.is_busy() {
                    self.phase = SessionPhase::Idle;
                }
            }
        }
    }

    /// Receive and apply stream events until the current session is done.
    ///
    /// Returns immediately when no session is busy. Queued audio keeps
    /// playing after this returns.
    pub async fn pump_until_idle(&mut self) {
        while self.is_busy() {
            match self.event_rx.recv().await {
                Some(event) => self.handle_event(event),
                // All senders gone; nothing further can arrive
                None => break,
            }
        }
    }

    /// Apply any already-delivered events without waiting
    pub fn poll_events(&mut self) {
        while let Ok(event) = self.event_rx.try_recv() {
            self.handle_event(event);
        }
    }

    /// Tear down the controller: close the stream (if open) and release the
    /// playback worker. Safe to call in any state.
    pub fn shutdown(mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
        self.playback.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{AudioChunk, AudioSink, PlaybackWorker};
    use crossbeam_channel::{unbounded, Receiver};
    use parking_lot::Mutex;
    use std::io::Cursor;
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    struct CapturingSink {
        played: Arc<Mutex<Vec<AudioChunk>>>,
    }

    impl AudioSink for CapturingSink {
        fn play(&mut self, chunk: &AudioChunk) -> crate::Result<()> {
            self.played.lock().push(chunk.clone());
            Ok(())
        }
    }

    fn test_controller() -> (Controller, Arc<Mutex<Vec<AudioChunk>>>) {
        let played = Arc::new(Mutex::new(Vec::new()));
        let sink_played = Arc::clone(&played);
        let playback = PlaybackWorker::spawn(move || {
            Ok(CapturingSink {
                played: sink_played,
            })
        });
        let controller = Controller::new(ApiConfig::new("localhost:8000", false), playback);
        (controller, played)
    }

    fn wav_chunk_bytes(marker: i16) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 22050,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for _ in 0..10 {
                writer.write_sample(marker).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    fn event(generation: Uuid, kind: StreamEventKind) -> StreamEvent {
        StreamEvent { generation, kind }
    }

    /// Puts the controller in the Connecting phase without a network round
    /// trip, returning the generation it will accept events for.
    fn enter_streaming(controller: &mut Controller) -> Uuid {
        let generation = Uuid::new_v4();
        controller.generation = Some(generation);
        controller.phase = SessionPhase::Connecting;
        generation
    }

    fn wait_for<P: Fn() -> bool>(predicate: P) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !predicate() {
            assert!(Instant::now() < deadline, "timed out");
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    /// Holds each chunk in the sink until the test releases it
    struct GatedSink {
        played: Arc<Mutex<Vec<f32>>>,
        gate: Receiver<()>,
    }

    impl AudioSink for GatedSink {
        fn play(&mut self, chunk: &AudioChunk) -> crate::Result<()> {
            let _ = self.gate.recv();
            self.played.lock().push(chunk.samples[0]);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_ask_clears_pending_queue() {
        let played = Arc::new(Mutex::new(Vec::new()));
        let sink_played = Arc::clone(&played);
        let (gate_tx, gate_rx) = unbounded();
        let playback = PlaybackWorker::spawn(move || {
            Ok(GatedSink {
                played: sink_played,
                gate: gate_rx,
            })
        });
        let mut controller = Controller::new(ApiConfig::new("127.0.0.1:1", false), playback);

        for marker in [1.0_f32, 2.0, 3.0] {
            controller
                .playback()
                .enqueue(AudioChunk::new(vec![marker; 10], 22050, 1));
        }
        // The first chunk occupies the sink; the rest queue behind it
        wait_for(|| controller.playback().is_playing() && controller.playback().pending_len() == 2);

        // Nothing listens on this port, so the submission itself fails, but
        // the queue is cleared before the request goes out
        controller.ask("next question").await.unwrap();
        assert_eq!(controller.playback().pending_len(), 0);
        assert_eq!(controller.phase(), SessionPhase::SubmitFailed);

        // The in-flight chunk finishes; the cleared ones never reach the sink
        gate_tx.send(()).unwrap();
        wait_for(|| played.lock().len() == 1);
        assert_eq!(played.lock()[0], 1.0);

        controller.shutdown();
    }

    #[test]
    fn test_poll_events_applies_delivered_events() {
        let (mut controller, _) = test_controller();
        let generation = enter_streaming(&mut controller);

        controller
            .event_tx
            .send(event(generation, StreamEventKind::Opened))
            .unwrap();
        controller
            .event_tx
            .send(event(generation, StreamEventKind::Frame(StreamFrame::End)))
            .unwrap();
        assert_eq!(controller.phase(), SessionPhase::Connecting);

        controller.poll_events();
        assert_eq!(controller.phase(), SessionPhase::Complete);

        controller.shutdown();
    }

    #[tokio::test]
    async fn test_empty_question_is_noop() {
        let (mut controller, _) = test_controller();
        controller.ask("   \t\n").await.unwrap();
        assert_eq!(controller.phase(), SessionPhase::Idle);
        assert!(!controller.is_busy());
        assert_eq!(controller.status(), "");
    }

    #[tokio::test]
    async fn test_submission_failure_sets_error_status() {
        // Nothing listens on this port, so the POST fails at transport level
        let playback = {
            let played = Arc::new(Mutex::new(Vec::new()));
            PlaybackWorker::spawn(move || Ok(CapturingSink { played }))
        };
        let mut controller =
            Controller::new(ApiConfig::new("127.0.0.1:1", false), playback);

        controller.ask("does anyone hear me?").await.unwrap();
        assert_eq!(controller.phase(), SessionPhase::SubmitFailed);
        assert!(!controller.is_busy());
        assert_eq!(controller.status(), "Error sending question");
    }

    #[test]
    fn test_open_then_chunks_then_end() {
        let (mut controller, played) = test_controller();
        let generation = enter_streaming(&mut controller);

        controller.handle_event(event(generation, StreamEventKind::Opened));
        assert_eq!(controller.phase(), SessionPhase::Receiving);
        assert_eq!(controller.status(), "Connected. Receiving audio...");

        for marker in [100, 200, 300] {
            controller.handle_event(event(
                generation,
                StreamEventKind::Frame(StreamFrame::Audio(wav_chunk_bytes(marker))),
            ));
        }

        controller.handle_event(event(generation, StreamEventKind::Frame(StreamFrame::End)));
        assert_eq!(controller.phase(), SessionPhase::Complete);
        assert!(!controller.is_busy());

        // Queued chunks keep playing after END
        wait_for(|| played.lock().len() == 3);
        let first_samples: Vec<f32> = played.lock().iter().map(|c| c.samples[0]).collect();
        assert!(first_samples[0] < first_samples[1]);
        assert!(first_samples[1] < first_samples[2]);

        controller.shutdown();
    }

    #[test]
    fn test_decode_failure_drops_only_that_chunk() {
        let (mut controller, played) = test_controller();
        let generation = enter_streaming(&mut controller);
        controller.handle_event(event(generation, StreamEventKind::Opened));

        controller.handle_event(event(
            generation,
            StreamEventKind::Frame(StreamFrame::Audio(wav_chunk_bytes(1))),
        ));
        controller.handle_event(event(
            generation,
            StreamEventKind::Frame(StreamFrame::Audio(vec![0xff, 0x00, 0xff])),
        ));
        controller.handle_event(event(
            generation,
            StreamEventKind::Frame(StreamFrame::Audio(wav_chunk_bytes(2))),
        ));

        // The bad chunk must not change phase or status
        assert_eq!(controller.phase(), SessionPhase::Receiving);

        controller.handle_event(event(generation, StreamEventKind::Frame(StreamFrame::End)));
        wait_for(|| played.lock().len() == 2);

        controller.shutdown();
    }

    #[test]
    fn test_close_without_end_clears_busy() {
        let (mut controller, _) = test_controller();
        let generation = enter_streaming(&mut controller);
        controller.handle_event(event(generation, StreamEventKind::Opened));

        controller.handle_event(event(generation, StreamEventKind::Closed));
        assert_eq!(controller.phase(), SessionPhase::Idle);
        assert!(!controller.is_busy());

        controller.shutdown();
    }

    #[test]
    fn test_close_after_end_keeps_complete_status() {
        let (mut controller, _) = test_controller();
        let generation = enter_streaming(&mut controller);
        controller.handle_event(event(generation, StreamEventKind::Opened));
        controller.handle_event(event(generation, StreamEventKind::Frame(StreamFrame::End)));
        controller.handle_event(event(generation, StreamEventKind::Closed));

        assert_eq!(controller.phase(), SessionPhase::Complete);
        assert_eq!(controller.status(), "Audio stream complete");

        controller.shutdown();
    }

    #[test]
    fn test_stream_error_sets_error_status() {
        let (mut controller, _) = test_controller();
        let generation = enter_streaming(&mut controller);

        controller.handle_event(event(
            generation,
            StreamEventKind::Failed("connection reset".into()),
        ));
        assert_eq!(controller.phase(), SessionPhase::StreamFailed);
        assert_eq!(controller.status(), "WebSocket connection error");
        assert!(!controller.is_busy());

        controller.shutdown();
    }

    #[test]
    fn test_relayed_server_error() {
        let (mut controller, _) = test_controller();
        let generation = enter_streaming(&mut controller);
        controller.handle_event(event(generation, StreamEventKind::Opened));

        controller.handle_event(event(
            generation,
            StreamEventKind::Frame(StreamFrame::ServerError("synthesis failed".into())),
        ));
        assert_eq!(controller.phase(), SessionPhase::StreamFailed);

        controller.shutdown();
    }

    #[test]
    fn test_stale_generation_events_are_discarded() {
        let (mut controller, played) = test_controller();
        let _old = enter_streaming(&mut controller);
        let current = enter_streaming(&mut controller);
        controller.handle_event(event(current, StreamEventKind::Opened));

        let stale = Uuid::new_v4();
        controller.handle_event(event(
            stale,
            StreamEventKind::Frame(StreamFrame::Audio(wav_chunk_bytes(9))),
        ));
        controller.handle_event(event(stale, StreamEventKind::Failed("old socket died".into())));
        controller.handle_event(event(stale, StreamEventKind::Closed));

        // The stale events mutated nothing
        assert_eq!(controller.phase(), SessionPhase::Receiving);
        std::thread::sleep(Duration::from_millis(50));
        assert!(played.lock().is_empty());

        controller.shutdown();
    }

    #[test]
    fn test_shutdown_with_nothing_created() {
        let (controller, _) = test_controller();
        controller.shutdown();
    }
}
