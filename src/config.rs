//! Endpoint configuration
//!
//! Derives the HTTP and WebSocket endpoints for one backend host. The
//! transport security of the hosting environment is passed in explicitly so
//! URL derivation stays deterministic and testable.

use crate::api::SessionId;

/// Path prefix shared by the HTTP and WebSocket APIs.
const API_PREFIX: &str = "/api";

/// Path of the voice streaming endpoint, under the API prefix.
const VOICE_STREAM_PATH: &str = "/ws/voice";

/// Resolved endpoints for one backend host
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiConfig {
    /// Base HTTP endpoint, e.g. `https://host/api`
    base_url: String,

    /// Streaming endpoint, e.g. `wss://host/api/ws/voice`
    websocket_url: String,
}

impl ApiConfig {
    /// Build the endpoints for `host` (host or host:port, no scheme).
    ///
    /// `secure` selects `https`/`wss` over `http`/`ws`, matching the
    /// transport the surrounding application was itself served over.
    pub fn new(host: impl AsRef<str>, secure: bool) -> Self {
        let host = host.as_ref().trim_end_matches('/');
        let (http_scheme, ws_scheme) = if secure {
            ("https", "wss")
        } else {
            ("http", "ws")
        };

        Self {
            base_url: format!("{http_scheme}://{host}{API_PREFIX}"),
            websocket_url: format!("{ws_scheme}://{host}{API_PREFIX}{VOICE_STREAM_PATH}"),
        }
    }

    /// Base HTTP endpoint
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Streaming endpoint without a session suffix
    pub fn websocket_url(&self) -> &str {
        &self.websocket_url
    }

    /// URL for submitting a question
    pub fn ask_url(&self) -> String {
        format!("{}/ask", self.base_url)
    }

    /// URL for the health probe
    pub fn health_url(&self) -> String {
        format!("{}/health", self.base_url)
    }

    /// Streaming URL scoped to one session
    pub fn stream_url(&self, session_id: &SessionId) -> String {
        format!("{}/{}", self.websocket_url, session_id)
    }
}
