//! Error kinds surfaced by a voice session
//!
//! Every adapter and the remote reply client translate their native failures
//! into a [`SessionError`] before anything reaches the session controller.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for session operations
pub type SessionResult<T> = Result<T, SessionError>;

/// Plain error classification, used in snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    PermissionDenied,
    RecognitionFailure,
    TransportError,
    MalformedResponseError,
    SynthesisFailure,
    NoContentError,
}

/// Errors that end the current exchange
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Recognition failed: {0}")]
    RecognitionFailure(String),

    #[error("Remote reply transport error: {0}")]
    Transport(String),

    #[error("Malformed remote reply: {0}")]
    MalformedResponse(String),

    #[error("Speech output failed: {0}")]
    SynthesisFailure(String),

    #[error("Remote reply had neither text nor audio")]
    NoContent,
}

impl SessionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SessionError::PermissionDenied(_) => ErrorKind::PermissionDenied,
            SessionError::RecognitionFailure(_) => ErrorKind::RecognitionFailure,
            SessionError::Transport(_) => ErrorKind::TransportError,
            SessionError::MalformedResponse(_) => ErrorKind::MalformedResponseError,
            SessionError::SynthesisFailure(_) => ErrorKind::SynthesisFailure,
            SessionError::NoContent => ErrorKind::NoContentError,
        }
    }
}

impl From<reqwest::Error> for SessionError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SessionError::MalformedResponse(err.to_string())
        } else {
            SessionError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SessionError {
    fn from(err: serde_json::Error) -> Self {
        SessionError::MalformedResponse(err.to_string())
    }
}

impl From<base64::DecodeError> for SessionError {
    fn from(err: base64::DecodeError) -> Self {
        SessionError::MalformedResponse(format!("reply audio is not valid base64: {}", err))
    }
}
