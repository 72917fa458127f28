pub mod api;
pub mod audio;
pub mod config;
pub mod controller;
pub mod stream;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum VoxstreamError {
    #[error("Submission error: {0}")]
    SubmissionError(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Decode error: {0}")]
    DecodeError(String),

    #[error("Audio device error: {0}")]
    AudioDeviceError(String),
}

impl VoxstreamError {
    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            // A failed submission or stream ends the current session only;
            // the controller accepts a new question afterwards
            VoxstreamError::SubmissionError(_) => true,
            VoxstreamError::MalformedResponse(_) => true,
            // A bad chunk is dropped and the stream continues
            VoxstreamError::DecodeError(_) => true,
            // Device errors may require user intervention
            VoxstreamError::AudioDeviceError(_) => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, VoxstreamError>;
