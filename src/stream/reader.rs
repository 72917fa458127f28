use crate::stream::{classify_text, StreamEvent, StreamEventKind, StreamFrame};
use futures::StreamExt;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Spawn a reader task for one session's stream.
///
/// The task connects to `url`, forwards every classified frame through
/// `event_tx` tagged with `generation`, and ends with either `Failed` or
/// `Closed`. Dropping the receiver or aborting the handle closes the socket.
pub fn spawn_reader(
    url: String,
    generation: Uuid,
    event_tx: UnboundedSender<StreamEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let send = |kind: StreamEventKind| {
            // Receiver gone means the controller was dropped; nothing to do
            let _ = event_tx.send(StreamEvent { generation, kind });
        };

        debug!("Connecting to audio stream at {}", url);
        let ws_stream = match connect_async(url.as_str()).await {
            Ok((stream, _response)) => stream,
            Err(e) => {
                warn!("Stream connect failed: {}", e);
                send(StreamEventKind::Failed(e.to_string()));
                return;
            }
        };
        info!("Audio stream connected");
        send(StreamEventKind::Opened);

        let (_write, mut read) = ws_stream.split();
        while let Some(message) = read.next().await {
            match message {
                Ok(Message::Binary(data)) => {
                    send(StreamEventKind::Frame(StreamFrame::Audio(data)));
                }
                Ok(Message::Text(text)) => {
                    if let Some(frame) = classify_text(&text) {
                        send(StreamEventKind::Frame(frame));
                    } else {
                        debug!("Ignoring unrecognized text frame: {}", text);
                    }
                }
                Ok(Message::Close(frame)) => {
                    debug!("Stream closed by backend: {:?}", frame);
                    break;
                }
                // Pings and pongs are answered by the transport
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) | Ok(Message::Frame(_)) => {}
                Err(e) => {
                    warn!("Stream transport error: {}", e);
                    send(StreamEventKind::Failed(e.to_string()));
                    return;
                }
            }
        }

        send(StreamEventKind::Closed);
    })
}
