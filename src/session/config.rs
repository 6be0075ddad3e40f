use crate::capability::{CaptureConfig, RecognitionConfig};
use serde::{Deserialize, Serialize};

/// Per-exchange settings chosen before speaking; read-only during a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Language tag handed to speech recognition
    /// Default: "en-SG"
    pub recognition_language: String,

    /// Language tag handed to speech synthesis
    /// Default: "en-US"
    pub synthesis_language: String,

    /// Voice used when no voice matches `synthesis_language`
    pub preferred_voice: Option<String>,

    /// Microphone capture format
    pub capture: CaptureConfig,
}

impl SessionConfig {
    pub fn recognition(&self) -> RecognitionConfig {
        RecognitionConfig::final_only(self.recognition_language.clone())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            recognition_language: "en-SG".to_string(),
            synthesis_language: "en-US".to_string(),
            preferred_voice: None,
            capture: CaptureConfig::default(),
        }
    }
}
