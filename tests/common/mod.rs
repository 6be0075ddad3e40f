#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use voice_avatar::capability::{
    AudioBuffer, CapabilityEvent, CaptureConfig, Payload, RecognitionConfig, ScriptedCapability,
    Utterance,
};
use voice_avatar::reply::{RemoteReply, ReplyClient};
use voice_avatar::session::{Capabilities, SessionConfig, SessionController};
use voice_avatar::SessionError;

/// Reply client that hands out queued outcomes, optionally after a delay
#[derive(Default)]
pub struct StubReply {
    outcomes: Mutex<VecDeque<Result<RemoteReply, SessionError>>>,
    prompts: Mutex<Vec<String>>,
    delay: Option<Duration>,
}

impl StubReply {
    pub fn answering(outcome: Result<RemoteReply, SessionError>) -> Self {
        let stub = Self::default();
        stub.push(outcome);
        stub
    }

    pub fn text(text: &str) -> Self {
        Self::answering(Ok(reply(text)))
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn push(&self, outcome: Result<RemoteReply, SessionError>) {
        self.outcomes.lock().unwrap().push_back(outcome);
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ReplyClient for StubReply {
    async fn send(&self, transcript: &str) -> Result<RemoteReply, SessionError> {
        self.prompts.lock().unwrap().push(transcript.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.outcomes.lock().unwrap().pop_front();
        next.unwrap_or(Err(SessionError::NoContent))
    }
}

pub fn reply(text: &str) -> RemoteReply {
    RemoteReply {
        reply_text: text.to_string(),
        reply_audio: None,
    }
}

pub fn recording() -> AudioBuffer {
    AudioBuffer::from_pcm(&[0i16; 160], 16000, 1).unwrap()
}

/// Microphone that runs until released and flushes a recording on stop
pub fn microphone() -> ScriptedCapability<CaptureConfig> {
    ScriptedCapability::new("mic")
        .emit(CapabilityEvent::Started)
        .hold()
        .on_stop(CapabilityEvent::Data(Payload::Recording(recording())))
        .on_stop(CapabilityEvent::Ended)
}

/// Recognizer that hears `text` once and waits to be stopped
pub fn hearing(text: &str) -> ScriptedCapability<RecognitionConfig> {
    ScriptedCapability::new("recognizer")
        .emit(CapabilityEvent::Started)
        .emit(CapabilityEvent::Data(Payload::Transcript(text.to_string())))
        .hold()
        .on_stop(CapabilityEvent::Ended)
}

/// Recognizer that never hears anything until released
pub fn deaf() -> ScriptedCapability<RecognitionConfig> {
    ScriptedCapability::new("recognizer")
        .emit(CapabilityEvent::Started)
        .hold()
}

/// Output adapter that speaks for `duration`
pub fn speaking<R: Send + 'static>(name: &str, duration: Duration) -> ScriptedCapability<R> {
    ScriptedCapability::new(name)
        .emit(CapabilityEvent::Started)
        .wait(duration)
        .emit(CapabilityEvent::Ended)
}

pub struct Rig {
    pub microphone: Arc<ScriptedCapability<CaptureConfig>>,
    pub recognizer: Arc<ScriptedCapability<RecognitionConfig>>,
    pub synthesizer: Arc<ScriptedCapability<Utterance>>,
    pub player: Arc<ScriptedCapability<AudioBuffer>>,
    pub reply: Arc<StubReply>,
}

impl Rig {
    pub fn new(recognizer: ScriptedCapability<RecognitionConfig>, reply: StubReply) -> Self {
        Self {
            microphone: Arc::new(microphone()),
            recognizer: Arc::new(recognizer),
            synthesizer: Arc::new(speaking("synth", Duration::from_millis(300))),
            player: Arc::new(speaking("player", Duration::from_millis(300))),
            reply: Arc::new(reply),
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            microphone: self.microphone.clone(),
            recognizer: self.recognizer.clone(),
            synthesizer: self.synthesizer.clone(),
            player: self.player.clone(),
            reply: self.reply.clone(),
        }
    }

    pub fn controller(&self) -> SessionController {
        SessionController::new(self.capabilities(), SessionConfig::default())
    }

    /// Adapter tasks still alive across every scripted capability
    pub fn active_tasks(&self) -> usize {
        self.microphone.stats().active()
            + self.recognizer.stats().active()
            + self.synthesizer.stats().active()
            + self.player.stats().active()
    }
}

/// Let aborted and detached adapter tasks finish unwinding
pub async fn quiesce() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}
