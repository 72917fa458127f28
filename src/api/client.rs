use crate::api::{AskRequest, AskResponse, SessionId};
use crate::config::ApiConfig;
use crate::{Result, VoxstreamError};
use tracing::{debug, info};

/// HTTP client for the question-submission API
pub struct AskClient {
    http: reqwest::Client,
    config: ApiConfig,
}

impl AskClient {
    /// Create a client for the given endpoints
    pub fn new(config: ApiConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Submit a question and return the session identifier for its stream.
    ///
    /// Transport errors, non-2xx statuses and responses without a
    /// `session_id` all map to a submission failure.
    pub async fn ask(&self, question: &str) -> Result<SessionId> {
        let url = self.config.ask_url();
        debug!("Submitting question to {}", url);

        let response = self
            .http
            .post(&url)
            .json(&AskRequest {
                question: question.to_string(),
            })
            .send()
            .await
            .map_err(|e| VoxstreamError::SubmissionError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(VoxstreamError::SubmissionError(format!(
                "Backend returned {status}"
            )));
        }

        let body: AskResponse = response
            .json()
            .await
            .map_err(|e| VoxstreamError::MalformedResponse(e.to_string()))?;

        match body.session_id {
            Some(id) if !id.is_empty() => {
                info!("Question accepted, session {}", id);
                Ok(id)
            }
            _ => Err(VoxstreamError::MalformedResponse(
                "Response did not contain a session_id".to_string(),
            )),
        }
    }

    /// Probe the backend health endpoint
    pub async fn health(&self) -> Result<bool> {
        let response = self
            .http
            .get(self.config.health_url())
            .send()
            .await
            .map_err(|e| VoxstreamError::SubmissionError(e.to_string()))?;

        Ok(response.status().is_success())
    }
}
