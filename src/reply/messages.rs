use crate::capability::AudioBuffer;
use crate::error::SessionError;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Request body posted to the reply endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyRequest {
    pub prompt: String,
}

/// Success body returned by the reply endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyResponse {
    /// Reply text
    #[serde(default)]
    pub response: Option<String>,

    /// Base64-encoded reply audio
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<String>,

    /// MIME type of `audio` (default: audio/mpeg)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_mime: Option<String>,
}

impl ReplyResponse {
    /// Decode into a reply; emptiness is left for the session to judge
    pub fn into_reply(self) -> Result<super::RemoteReply, SessionError> {
        let reply_audio = match self.audio.filter(|a| !a.trim().is_empty()) {
            Some(encoded) => {
                let bytes = base64::engine::general_purpose::STANDARD.decode(encoded.trim())?;
                let mime = self.audio_mime.unwrap_or_else(|| "audio/mpeg".to_string());
                Some(AudioBuffer::new(bytes, mime))
            }
            None => None,
        };

        Ok(super::RemoteReply {
            reply_text: self.response.unwrap_or_default(),
            reply_audio,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_request_serialization() {
        let json = serde_json::to_string(&ReplyRequest {
            prompt: "turn left".to_string(),
        })
        .unwrap();
        assert_eq!(json, r#"{"prompt":"turn left"}"#);
    }

    #[test]
    fn test_text_only_response() {
        let msg: ReplyResponse = serde_json::from_str(r#"{"response": "Turning left now"}"#).unwrap();
        let reply = msg.into_reply().unwrap();

        assert_eq!(reply.reply_text, "Turning left now");
        assert!(reply.reply_audio.is_none());
    }

    #[test]
    fn test_response_with_audio() {
        let encoded = base64::engine::general_purpose::STANDARD.encode([1u8, 2, 3, 4]);
        let json = format!(
            r#"{{"response": "hi", "audio": "{}", "audio_mime": "audio/wav"}}"#,
            encoded
        );
        let msg: ReplyResponse = serde_json::from_str(&json).unwrap();
        let reply = msg.into_reply().unwrap();

        let audio = reply.reply_audio.expect("audio decoded");
        assert_eq!(audio.as_bytes(), &[1, 2, 3, 4]);
        assert_eq!(audio.mime(), "audio/wav");
    }

    #[test]
    fn test_empty_object_has_no_content() {
        let msg: ReplyResponse = serde_json::from_str("{}").unwrap();
        let reply = msg.into_reply().unwrap();

        assert!(reply.reply_text.is_empty());
        assert!(reply.reply_audio.is_none());
    }

    #[test]
    fn test_wrong_shape_is_rejected() {
        assert!(serde_json::from_str::<ReplyResponse>(r#"{"response": 42}"#).is_err());
        assert!(serde_json::from_str::<ReplyResponse>(r#"["Turning left"]"#).is_err());
    }

    #[test]
    fn test_bad_audio_is_malformed() {
        let msg = ReplyResponse {
            response: Some("hi".into()),
            audio: Some("%%% not base64 %%%".into()),
            audio_mime: None,
        };
        let err = msg.into_reply().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedResponseError);
    }
}
