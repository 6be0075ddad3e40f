use super::contract::{Capability, CapabilityEvent, CapabilityHandle, EventSink, Release};
use crate::error::SessionError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// A voice offered by the synthesis engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    pub name: String,
    /// BCP 47 language tag
    pub language: String,
}

/// One piece of text to speak
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    pub text: String,
    /// Requested language tag, e.g. "en-US"
    pub language: String,
    /// Voice to fall back on when no voice matches the language
    pub preferred_voice: Option<String>,
}

/// Pick a voice for `language`.
///
/// First exact language-tag match wins; otherwise the preferred voice if the
/// engine has it; otherwise `None`, meaning the engine default.
pub fn select_voice<'a>(
    voices: &'a [Voice],
    language: &str,
    preferred_voice: Option<&str>,
) -> Option<&'a Voice> {
    voices
        .iter()
        .find(|v| v.language.eq_ignore_ascii_case(language))
        .or_else(|| preferred_voice.and_then(|name| voices.iter().find(|v| v.name == name)))
}

/// Speaks to the terminal at a fixed reading pace
///
/// Emits `started` when the text goes out and `ended` once the estimated
/// speaking time has elapsed.
pub struct ConsoleSynthesizer {
    voices: Vec<Voice>,
    words_per_minute: u32,
}

impl ConsoleSynthesizer {
    pub fn new(voices: Vec<Voice>, words_per_minute: u32) -> Self {
        Self {
            voices,
            words_per_minute: words_per_minute.max(1),
        }
    }

    /// Time it takes to read `text` aloud
    pub fn speaking_time(&self, text: &str) -> Duration {
        let words = text.split_whitespace().count() as u64;
        Duration::from_millis(words * 60_000 / self.words_per_minute as u64)
    }
}

#[async_trait::async_trait]
impl Capability for ConsoleSynthesizer {
    type Request = Utterance;

    async fn start(
        &self,
        utterance: Utterance,
        events: EventSink,
    ) -> Result<CapabilityHandle, SessionError> {
        if utterance.text.trim().is_empty() {
            return Err(SessionError::SynthesisFailure("nothing to speak".into()));
        }

        let voice = select_voice(
            &self.voices,
            &utterance.language,
            utterance.preferred_voice.as_deref(),
        )
        .map(|v| v.name.clone())
        .unwrap_or_else(|| "default".to_string());
        let duration = self.speaking_time(&utterance.text);
        info!("Speaking with voice {} for {:?}", voice, duration);

        let sink = events.clone();
        Ok(CapabilityHandle::spawn(&events, move |mut signal| async move {
            sink.emit(CapabilityEvent::Started);
            println!("[{}] {}", voice, utterance.text);

            tokio::select! {
                _ = tokio::time::sleep(duration) => {
                    sink.emit(CapabilityEvent::Ended);
                }
                release = signal.released() => {
                    debug!("Speech interrupted ({:?})", release);
                    if release == Release::Stop {
                        sink.emit(CapabilityEvent::Ended);
                    }
                }
            }
        }))
    }

    fn name(&self) -> &str {
        "console-synthesizer"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voice(name: &str, language: &str) -> Voice {
        Voice {
            name: name.into(),
            language: language.into(),
        }
    }

    #[test]
    fn test_first_exact_match_wins() {
        let voices = vec![
            voice("Daniel", "en-GB"),
            voice("Samantha", "en-US"),
            voice("Alex", "en-US"),
        ];
        let chosen = select_voice(&voices, "en-US", Some("Daniel")).unwrap();
        assert_eq!(chosen.name, "Samantha");
    }

    #[test]
    fn test_language_tags_compare_case_insensitively() {
        let voices = vec![voice("Samantha", "EN-us")];
        assert!(select_voice(&voices, "en-US", None).is_some());
    }

    #[test]
    fn test_falls_back_to_preferred_voice() {
        let voices = vec![voice("Daniel", "en-GB"), voice("Amelie", "fr-CA")];
        let chosen = select_voice(&voices, "en-SG", Some("Daniel")).unwrap();
        assert_eq!(chosen.name, "Daniel");
    }

    #[test]
    fn test_no_match_means_engine_default() {
        let voices = vec![voice("Daniel", "en-GB")];
        assert!(select_voice(&voices, "ms-MY", None).is_none());
        assert!(select_voice(&voices, "ms-MY", Some("Nobody")).is_none());
        assert!(select_voice(&[], "en-US", Some("Daniel")).is_none());
    }

    #[test]
    fn test_speaking_time_follows_pace() {
        let synth = ConsoleSynthesizer::new(Vec::new(), 120);
        assert_eq!(synth.speaking_time("Turning left now"), Duration::from_millis(1500));
        assert_eq!(synth.speaking_time(""), Duration::ZERO);
    }
}
