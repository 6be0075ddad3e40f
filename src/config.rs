use crate::avatar::AvatarVariant;
use crate::capability::Voice;
use crate::session::SessionConfig;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Prefix for environment overrides, e.g. `VOICE_AVATAR__REMOTE__ENDPOINT`
pub const ENV_PREFIX: &str = "VOICE_AVATAR";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub service: ServiceConfig,
    pub remote: RemoteConfig,
    pub session: SessionConfig,
    pub synthesis: SynthesisConfig,
    pub capture: CaptureSourceConfig,
    pub avatar: AvatarConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "voice-avatar".to_string(),
            http: HttpConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 3030,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Reply endpoint accepting `{"prompt": ...}`
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl RemoteConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://kevansoon-tts-endpoint.hf.space/gemini".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    pub words_per_minute: u32,
    /// Voices the console synthesizer offers
    pub voices: Vec<Voice>,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            words_per_minute: 180,
            voices: vec![
                Voice {
                    name: "Samantha".to_string(),
                    language: "en-US".to_string(),
                },
                Voice {
                    name: "Daniel".to_string(),
                    language: "en-GB".to_string(),
                },
            ],
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CaptureSourceConfig {
    /// WAV file replayed as the microphone; silence when unset
    pub input_wav: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AvatarConfig {
    pub variant: AvatarVariant,
    pub mouth_interval_ms: u64,
}

impl AvatarConfig {
    pub fn mouth_interval(&self) -> Duration {
        Duration::from_millis(self.mouth_interval_ms.max(1))
    }
}

impl Default for AvatarConfig {
    fn default() -> Self {
        Self {
            variant: AvatarVariant::default(),
            mouth_interval_ms: 150,
        }
    }
}

impl Config {
    /// Load `path` (extension optional, file optional) then apply environment overrides
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()
            .with_context(|| format!("Failed to read configuration from {}", path))?;

        settings
            .try_deserialize()
            .context("Invalid configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_original_deployment() {
        let cfg = Config::default();
        assert_eq!(cfg.session.recognition_language, "en-SG");
        assert_eq!(cfg.session.synthesis_language, "en-US");
        assert_eq!(cfg.avatar.variant, AvatarVariant::Chinese);
        assert_eq!(cfg.avatar.mouth_interval(), Duration::from_millis(150));
        assert!(cfg.remote.endpoint.ends_with("/gemini"));
        assert!(cfg.capture.input_wav.is_none());
    }
}
