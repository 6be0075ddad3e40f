use crate::capability::AudioBuffer;
use crate::error::{ErrorKind, SessionError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Monotonic session tag; adapter events carrying an older value are discarded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Generation(pub u64);

impl Generation {
    pub fn next(self) -> Self {
        Generation(self.0 + 1)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle state of a single spoken exchange
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionState {
    #[default]
    Idle,
    Listening,
    Recognized,
    AwaitingReply,
    Replying,
    Speaking,
    Errored,
}

impl SessionState {
    /// Idle and Errored wait for the user; every other state waits on an adapter or the remote service
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Idle | SessionState::Errored)
    }
}

/// The unit of work for one spoken exchange
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub state: SessionState,
    pub generation: Generation,
    pub transcript: Option<String>,
    pub reply_text: Option<String>,
    pub recorded_audio: Option<AudioBuffer>,
    pub reply_audio: Option<AudioBuffer>,
    pub error: Option<SessionError>,
    pub is_speaking: bool,
    pub started_at: Option<DateTime<Utc>>,
}

impl Session {
    /// A fresh Idle session tagged with `generation`
    pub fn fresh(generation: Generation) -> Self {
        Self {
            generation,
            ..Self::default()
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            state: self.state,
            generation: self.generation,
            transcript: self.transcript.clone(),
            reply_text: self.reply_text.clone(),
            error: self.error.as_ref().map(|e| ErrorSummary {
                kind: e.kind(),
                message: e.to_string(),
            }),
            is_speaking: self.is_speaking,
            is_listening: self.state == SessionState::Listening,
            is_loading: matches!(
                self.state,
                SessionState::Recognized | SessionState::AwaitingReply | SessionState::Replying
            ),
            has_recorded_audio: self.recorded_audio.is_some(),
            has_reply_audio: self.reply_audio.is_some(),
            started_at: self.started_at,
        }
    }
}

/// Error as shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorSummary {
    pub kind: ErrorKind,
    pub message: String,
}

/// Read-only projection of the session published for rendering
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub state: SessionState,
    pub generation: Generation,
    pub transcript: Option<String>,
    pub reply_text: Option<String>,
    pub error: Option<ErrorSummary>,
    pub is_speaking: bool,
    pub is_listening: bool,
    pub is_loading: bool,
    pub has_recorded_audio: bool,
    pub has_reply_audio: bool,
    pub started_at: Option<DateTime<Utc>>,
}
