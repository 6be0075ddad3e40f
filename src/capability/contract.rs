use super::audio::AudioBuffer;
use crate::error::SessionError;
use crate::session::{Event, Generation};
use std::future::Future;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::debug;
use uuid::Uuid;

/// The four external capabilities a session drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CapabilityKind {
    Capture,
    Recognition,
    Synthesis,
    Playback,
}

impl CapabilityKind {
    /// Synthesis and playback share the single speech-output slot
    pub fn is_output(self) -> bool {
        matches!(self, CapabilityKind::Synthesis | CapabilityKind::Playback)
    }
}

/// Data carried by a `Data` event
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Final recognition result
    Transcript(String),
    /// Buffered microphone audio, flushed when capture is stopped
    Recording(AudioBuffer),
}

/// Lifecycle events every adapter emits
#[derive(Debug, Clone, PartialEq)]
pub enum CapabilityEvent {
    Started,
    Data(Payload),
    Error(SessionError),
    Ended,
}

/// Sender bound to one adapter invocation
///
/// Every event is tagged with the generation the handle was started under, so
/// an adapter can't address a newer session.
#[derive(Debug, Clone)]
pub struct EventSink {
    kind: CapabilityKind,
    generation: Generation,
    tx: mpsc::UnboundedSender<Event>,
}

impl EventSink {
    pub fn new(kind: CapabilityKind, generation: Generation, tx: mpsc::UnboundedSender<Event>) -> Self {
        Self { kind, generation, tx }
    }

    /// Returns false once the controller is gone
    pub fn emit(&self, event: CapabilityEvent) -> bool {
        self.tx
            .send(Event::Capability {
                generation: self.generation,
                kind: self.kind,
                event,
            })
            .is_ok()
    }

    pub fn kind(&self) -> CapabilityKind {
        self.kind
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }
}

/// How a handle is being let go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Release {
    /// Finish up and flush final data
    Stop,
    /// Drop everything
    Cancel,
}

/// Adapter-side end of a handle's release channel
#[derive(Debug)]
pub struct ReleaseSignal(oneshot::Receiver<Release>);

impl ReleaseSignal {
    /// Resolves when the owner stops, cancels or drops the handle.
    ///
    /// Await at most once to completion.
    pub async fn released(&mut self) -> Release {
        (&mut self.0).await.unwrap_or(Release::Cancel)
    }
}

/// Ownership token for one running adapter invocation
///
/// Dropping the handle aborts the adapter task, so nothing started for a
/// session outlives it.
#[derive(Debug)]
pub struct CapabilityHandle {
    id: Uuid,
    kind: CapabilityKind,
    generation: Generation,
    release: Option<oneshot::Sender<Release>>,
    task: Option<JoinHandle<()>>,
}

impl CapabilityHandle {
    /// Spawn the adapter task driving this invocation
    pub fn spawn<F, Fut>(sink: &EventSink, run: F) -> Self
    where
        F: FnOnce(ReleaseSignal) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let task = tokio::spawn(run(ReleaseSignal(rx)));

        Self {
            id: Uuid::new_v4(),
            kind: sink.kind(),
            generation: sink.generation(),
            release: Some(tx),
            task: Some(task),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> CapabilityKind {
        self.kind
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Ask the adapter to finish; its final events still arrive
    pub fn stop(mut self) {
        debug!("Stopping {:?} handle {}", self.kind, self.id);
        if let Some(tx) = self.release.take() {
            let _ = tx.send(Release::Stop);
        }
        // Detach: the task ends on its own once it sees the stop
        self.task.take();
    }

    /// Tear the adapter down now, without waiting for `ended`
    pub fn cancel(mut self) {
        debug!("Cancelling {:?} handle {}", self.kind, self.id);
        if let Some(tx) = self.release.take() {
            let _ = tx.send(Release::Cancel);
        }
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for CapabilityHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Minimal contract shared by capture, recognition, synthesis and playback
///
/// Implementations report everything through the [`EventSink`] handed to
/// `start`, and map native failures into [`SessionError`] first.
#[async_trait::async_trait]
pub trait Capability: Send + Sync {
    /// What the adapter needs to start (capture settings, utterance, audio...)
    type Request: Send + 'static;

    /// Start one invocation
    async fn start(
        &self,
        request: Self::Request,
        events: EventSink,
    ) -> Result<CapabilityHandle, SessionError>;

    /// Graceful stop
    async fn stop(&self, handle: CapabilityHandle) {
        handle.stop();
    }

    /// Immediate, fire-and-forget release
    fn cancel(&self, handle: CapabilityHandle) {
        handle.cancel();
    }

    /// Adapter name for logging
    fn name(&self) -> &str;
}
