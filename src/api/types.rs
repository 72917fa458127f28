use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque token scoping one question's audio stream.
///
/// Issued by the backend per submitted question and dead once the
/// session's stream closes; never persisted or reused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Body of `POST /api/ask`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

/// Response of `POST /api/ask`
///
/// `session_id` is optional at the wire level; a response without it is a
/// submission failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskResponse {
    pub session_id: Option<SessionId>,
}
