//! WebSocket audio stream
//!
//! Connects to the per-session streaming endpoint and forwards inbound
//! frames as generation-tagged events. The client side never sends frames
//! after the handshake; the backend drives the stream and closes it.

mod reader;

pub use reader::spawn_reader;

use uuid::Uuid;

/// Text frame payload marking the end of a stream.
pub const END_SENTINEL: &str = "END";

/// Prefix of text frames relaying a server-side failure.
const SERVER_ERROR_PREFIX: &str = "Error:";

/// One inbound frame, already classified
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamFrame {
    /// Binary frame carrying one encoded audio chunk
    Audio(Vec<u8>),

    /// The `END` sentinel
    End,

    /// A relayed server-side failure (`Error: <msg>` text frame)
    ServerError(String),
}

/// Event delivered from a stream reader to the controller.
///
/// `generation` identifies the session the reader was spawned for, so a
/// superseded session's late events can be recognized and discarded.
#[derive(Debug, Clone)]
pub struct StreamEvent {
    pub generation: Uuid,
    pub kind: StreamEventKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEventKind {
    /// The socket connected
    Opened,

    /// One classified inbound frame
    Frame(StreamFrame),

    /// The socket failed (connect or mid-stream transport error)
    Failed(String),

    /// The socket closed, gracefully or not
    Closed,
}

/// Classify a text frame payload.
///
/// Anything that is neither the end sentinel nor a relayed error is ignored
/// by the caller.
pub(crate) fn classify_text(text: &str) -> Option<StreamFrame> {
    if text == END_SENTINEL {
        Some(StreamFrame::End)
    } else if let Some(msg) = text.strip_prefix(SERVER_ERROR_PREFIX) {
        Some(StreamFrame::ServerError(msg.trim().to_string()))
    } else {
        None
    }
}
