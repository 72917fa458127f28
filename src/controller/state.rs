/// Phase of the current question/answer exchange.
///
/// Status text and the busy flag are both derived from this tag, so the
/// presentation layer can never observe an inconsistent combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No question in flight
    Idle,

    /// Question submitted, awaiting a session identifier
    Submitting,

    /// Session identifier received, socket not yet open
    Connecting,

    /// Socket open, audio arriving
    Receiving,

    /// End marker received; queued audio may still be playing
    Complete,

    /// The submission failed or the response carried no session identifier
    SubmitFailed,

    /// The socket failed, or the backend relayed a failure
    StreamFailed,
}

impl SessionPhase {
    /// Whether a question is awaiting response or mid-stream
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            SessionPhase::Submitting | SessionPhase::Connecting | SessionPhase::Receiving
        )
    }

    /// Human-readable status line for the presentation layer
    pub fn status_text(&self) -> &'static str {
        match self {
            SessionPhase::Idle => "",
            SessionPhase::Submitting => "Sending question...",
            SessionPhase::Connecting => "Connecting to audio stream...",
            SessionPhase::Receiving => "Connected. Receiving audio...",
            SessionPhase::Complete => "Audio stream complete",
            SessionPhase::SubmitFailed => "Error sending question",
            SessionPhase::StreamFailed => "WebSocket connection error",
        }
    }
}
