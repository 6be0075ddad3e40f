use super::messages::{ReplyRequest, ReplyResponse};
use crate::capability::AudioBuffer;
use crate::error::{SessionError, SessionResult};
use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{info, warn};

/// Answer from the remote reasoning service
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteReply {
    pub reply_text: String,
    pub reply_audio: Option<AudioBuffer>,
}

/// Opaque request/response endpoint that answers a transcript
#[async_trait::async_trait]
pub trait ReplyClient: Send + Sync {
    async fn send(&self, transcript: &str) -> SessionResult<RemoteReply>;
}

/// JSON-over-HTTP reply client
pub struct HttpReplyClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpReplyClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait::async_trait]
impl ReplyClient for HttpReplyClient {
    async fn send(&self, transcript: &str) -> SessionResult<RemoteReply> {
        info!("Requesting reply from {}", self.endpoint);

        let request = ReplyRequest {
            prompt: transcript.to_string(),
        };

        let res = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            warn!("Reply endpoint returned {}", status);
            return Err(SessionError::Transport(format!(
                "reply endpoint returned {}: {}",
                status, body
            )));
        }

        let body = res.bytes().await?;
        let response: ReplyResponse = serde_json::from_slice(&body)?;

        info!("Reply received ({} bytes)", body.len());
        response.into_reply()
    }
}
