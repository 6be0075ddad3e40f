use super::contract::{Capability, CapabilityEvent, CapabilityHandle, EventSink, Payload};
use crate::error::SessionError;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Speech recognition settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognitionConfig {
    /// BCP 47 language tag, e.g. "en-SG"
    pub language: String,
    /// Always false: only the final result is consumed
    pub interim_results: bool,
    pub max_alternatives: u32,
}

impl RecognitionConfig {
    pub fn final_only(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            interim_results: false,
            max_alternatives: 1,
        }
    }
}

/// Native failure codes reported by recognition engines
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionSignal {
    NoSpeech,
    Aborted,
    AudioCapture,
    Network,
    NotAllowed,
    ServiceNotAllowed,
    LanguageNotSupported,
    Other(String),
}

impl RecognitionSignal {
    pub fn from_code(code: &str) -> Self {
        match code {
            "no-speech" => RecognitionSignal::NoSpeech,
            "aborted" => RecognitionSignal::Aborted,
            "audio-capture" => RecognitionSignal::AudioCapture,
            "network" => RecognitionSignal::Network,
            "not-allowed" => RecognitionSignal::NotAllowed,
            "service-not-allowed" => RecognitionSignal::ServiceNotAllowed,
            "language-not-supported" => RecognitionSignal::LanguageNotSupported,
            other => RecognitionSignal::Other(other.to_string()),
        }
    }

    pub fn code(&self) -> &str {
        match self {
            RecognitionSignal::NoSpeech => "no-speech",
            RecognitionSignal::Aborted => "aborted",
            RecognitionSignal::AudioCapture => "audio-capture",
            RecognitionSignal::Network => "network",
            RecognitionSignal::NotAllowed => "not-allowed",
            RecognitionSignal::ServiceNotAllowed => "service-not-allowed",
            RecognitionSignal::LanguageNotSupported => "language-not-supported",
            RecognitionSignal::Other(code) => code.as_str(),
        }
    }
}

impl From<RecognitionSignal> for SessionError {
    fn from(signal: RecognitionSignal) -> Self {
        match signal {
            RecognitionSignal::NotAllowed | RecognitionSignal::ServiceNotAllowed => {
                SessionError::PermissionDenied(signal.code().to_string())
            }
            other => SessionError::RecognitionFailure(other.code().to_string()),
        }
    }
}

/// Recognizer that takes each line of text input as one final utterance
///
/// Stands in for a speech engine on terminals and in scripted runs: a blank
/// line is "no speech", end of input is an aborted engine.
pub struct LineRecognizer<R> {
    lines: Arc<Mutex<Lines<R>>>,
    exhausted: Arc<AtomicBool>,
}

impl<R: AsyncBufRead + Unpin + Send + 'static> LineRecognizer<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: Arc::new(Mutex::new(reader.lines())),
            exhausted: Arc::new(AtomicBool::new(false)),
        }
    }

    /// True once the input has reached end of file
    pub fn is_exhausted(&self) -> bool {
        self.exhausted.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl<R: AsyncBufRead + Unpin + Send + 'static> Capability for LineRecognizer<R> {
    type Request = RecognitionConfig;

    async fn start(
        &self,
        config: RecognitionConfig,
        events: EventSink,
    ) -> Result<CapabilityHandle, SessionError> {
        info!("Listening for speech ({})", config.language);

        let lines = Arc::clone(&self.lines);
        let exhausted = Arc::clone(&self.exhausted);
        let sink = events.clone();
        Ok(CapabilityHandle::spawn(&events, move |mut signal| async move {
            sink.emit(CapabilityEvent::Started);
            let mut lines = lines.lock().await;

            tokio::select! {
                _ = signal.released() => {}
                line = lines.next_line() => {
                    let event = match line {
                        Ok(Some(text)) if text.trim().is_empty() => {
                            CapabilityEvent::Error(RecognitionSignal::NoSpeech.into())
                        }
                        Ok(Some(text)) => {
                            CapabilityEvent::Data(Payload::Transcript(text.trim().to_string()))
                        }
                        Ok(None) => {
                            exhausted.store(true, Ordering::SeqCst);
                            CapabilityEvent::Error(RecognitionSignal::Aborted.into())
                        }
                        Err(e) => {
                            warn!("Failed to read input: {}", e);
                            CapabilityEvent::Error(RecognitionSignal::AudioCapture.into())
                        }
                    };
                    sink.emit(event);
                    sink.emit(CapabilityEvent::Ended);
                }
            }
        }))
    }

    fn name(&self) -> &str {
        "line-recognizer"
    }
}
