use super::config::SessionConfig;
use super::effect::Effect;
use super::event::{Command, Event};
use super::state::{Session, SessionState, Snapshot};
use super::transition::{transition, Transition};
use crate::capability::{
    AudioBuffer, Capability, CapabilityEvent, CapabilityHandle, CapabilityKind, CaptureConfig,
    EventSink, RecognitionConfig, Utterance,
};
use crate::error::SessionError;
use crate::reply::ReplyClient;
use anyhow::{Context, Result};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// The external collaborators a controller drives
#[derive(Clone)]
pub struct Capabilities {
    pub microphone: Arc<dyn Capability<Request = CaptureConfig>>,
    pub recognizer: Arc<dyn Capability<Request = RecognitionConfig>>,
    pub synthesizer: Arc<dyn Capability<Request = Utterance>>,
    pub player: Arc<dyn Capability<Request = AudioBuffer>>,
    pub reply: Arc<dyn ReplyClient>,
}

impl Capabilities {
    async fn stop(&self, handle: CapabilityHandle) {
        match handle.kind() {
            CapabilityKind::Capture => self.microphone.stop(handle).await,
            CapabilityKind::Recognition => self.recognizer.stop(handle).await,
            CapabilityKind::Synthesis => self.synthesizer.stop(handle).await,
            CapabilityKind::Playback => self.player.stop(handle).await,
        }
    }

    fn cancel(&self, handle: CapabilityHandle) {
        match handle.kind() {
            CapabilityKind::Capture => self.microphone.cancel(handle),
            CapabilityKind::Recognition => self.recognizer.cancel(handle),
            CapabilityKind::Synthesis => self.synthesizer.cancel(handle),
            CapabilityKind::Playback => self.player.cancel(handle),
        }
    }
}

/// Which resources the controller holds right now
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HeldHandles {
    pub capture: bool,
    pub recognition: bool,
    pub output: bool,
    pub reply_in_flight: bool,
}

impl HeldHandles {
    pub fn count(&self) -> usize {
        [self.capture, self.recognition, self.output, self.reply_in_flight]
            .iter()
            .filter(|held| **held)
            .count()
    }
}

/// Drives one voice exchange at a time
///
/// The controller is the only owner of capability handles. Adapter events and
/// remote replies come back through a single queue tagged with the generation
/// they were issued under; `transition` decides, the controller executes.
pub struct SessionController {
    config: SessionConfig,
    capabilities: Capabilities,
    session: Session,

    /// One slot per category; synthesis and playback share `output`
    capture: Option<CapabilityHandle>,
    recognition: Option<CapabilityHandle>,
    output: Option<CapabilityHandle>,
    reply_task: Option<JoinHandle<()>>,

    events_tx: mpsc::UnboundedSender<Event>,
    events_rx: mpsc::UnboundedReceiver<Event>,
    snapshots: watch::Sender<Snapshot>,
}

impl SessionController {
    pub fn new(capabilities: Capabilities, config: SessionConfig) -> Self {
        let session = Session::default();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (snapshots, _) = watch::channel(session.snapshot());

        Self {
            config,
            capabilities,
            session,
            capture: None,
            recognition: None,
            output: None,
            reply_task: None,
            events_tx,
            events_rx,
            snapshots,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn snapshot(&self) -> Snapshot {
        self.session.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshots.subscribe()
    }

    /// Queue used by adapters and the reply task; exposed for injecting events
    pub fn event_sender(&self) -> mpsc::UnboundedSender<Event> {
        self.events_tx.clone()
    }

    pub fn held(&self) -> HeldHandles {
        HeldHandles {
            capture: self.capture.is_some(),
            recognition: self.recognition.is_some(),
            output: self.output.is_some(),
            reply_in_flight: self
                .reply_task
                .as_ref()
                .map_or(false, |task| !task.is_finished()),
        }
    }

    /// Apply one event, then any automatic follow-up step
    pub async fn dispatch(&mut self, event: Event) {
        let mut next = Some(event);

        while let Some(event) = next.take() {
            if let Event::Reply { generation, .. } = &event {
                if *generation == self.session.generation {
                    self.reply_task = None;
                }
            }

            let before = self.session.state;
            let Transition { session, effects } = transition(std::mem::take(&mut self.session), event);
            self.session = session;

            if before != self.session.state {
                info!(
                    "Session {}: {:?} -> {:?}",
                    self.session.generation, before, self.session.state
                );
            }

            for effect in effects {
                self.apply(effect).await;
            }
            self.publish();

            if self.session.state == SessionState::Recognized {
                next = Some(Event::Proceed);
            }
        }
    }

    /// Wait for the next queued adapter or reply event
    pub async fn next_event(&mut self) -> Option<Event> {
        self.events_rx.recv().await
    }

    /// Process queued events until the session waits on the user again
    pub async fn settle(&mut self) {
        while !self.session.state.is_terminal() {
            match self.events_rx.recv().await {
                Some(event) => self.dispatch(event).await,
                None => break,
            }
        }
    }

    /// Process whatever is already queued without waiting
    pub async fn drain(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            self.dispatch(event).await;
        }
    }

    /// Release everything and reset to a fresh Idle session
    pub async fn teardown(&mut self) {
        self.dispatch(Event::Teardown).await;
    }

    /// Serve commands until the command channel closes or `Teardown` arrives
    pub async fn run(mut self, mut commands: mpsc::Receiver<Command>) {
        info!("Session controller running");

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Teardown) | None => break,
                    Some(command) => self.dispatch(command.into()).await,
                },
                Some(event) = self.events_rx.recv() => self.dispatch(event).await,
            }
        }

        self.teardown().await;
        info!("Session controller stopped");
    }

    async fn apply(&mut self, effect: Effect) {
        debug!("Applying {:?}", effect);

        match effect {
            Effect::ReleaseAll => self.release_all(),
            Effect::StartCapture => {
                self.release(CapabilityKind::Capture);
                let microphone = Arc::clone(&self.capabilities.microphone);
                let started = microphone
                    .start(self.config.capture.clone(), self.sink(CapabilityKind::Capture))
                    .await;
                match started {
                    Ok(handle) => self.capture = Some(handle),
                    Err(err) => self.report(CapabilityKind::Capture, err),
                }
            }
            Effect::StartRecognition => {
                self.release(CapabilityKind::Recognition);
                let recognizer = Arc::clone(&self.capabilities.recognizer);
                let started = recognizer
                    .start(self.config.recognition(), self.sink(CapabilityKind::Recognition))
                    .await;
                match started {
                    Ok(handle) => self.recognition = Some(handle),
                    Err(err) => self.report(CapabilityKind::Recognition, err),
                }
            }
            Effect::Stop(kind) => {
                if let Some(handle) = self.take_handle(kind) {
                    let capabilities = self.capabilities.clone();
                    capabilities.stop(handle).await;
                }
            }
            Effect::Release(kind) => self.release(kind),
            Effect::RequestReply { transcript } => {
                self.abort_reply();
                let client = Arc::clone(&self.capabilities.reply);
                let tx = self.events_tx.clone();
                let generation = self.session.generation;

                self.reply_task = Some(tokio::spawn(async move {
                    let outcome = client.send(&transcript).await;
                    // Controller gone means the view is gone; nothing to report to
                    let _ = tx.send(Event::Reply { generation, outcome });
                }));
            }
            Effect::Speak { text } => {
                self.release(CapabilityKind::Synthesis);
                let utterance = Utterance {
                    text,
                    language: self.config.synthesis_language.clone(),
                    preferred_voice: self.config.preferred_voice.clone(),
                };
                let synthesizer = Arc::clone(&self.capabilities.synthesizer);
                let started = synthesizer
                    .start(utterance, self.sink(CapabilityKind::Synthesis))
                    .await;
                match started {
                    Ok(handle) => self.output = Some(handle),
                    Err(err) => self.report(CapabilityKind::Synthesis, err),
                }
            }
            Effect::Play { audio } => {
                self.release(CapabilityKind::Playback);
                let player = Arc::clone(&self.capabilities.player);
                let started = player.start(audio, self.sink(CapabilityKind::Playback)).await;
                match started {
                    Ok(handle) => self.output = Some(handle),
                    Err(err) => self.report(CapabilityKind::Playback, err),
                }
            }
        }
    }

    fn sink(&self, kind: CapabilityKind) -> EventSink {
        EventSink::new(kind, self.session.generation, self.events_tx.clone())
    }

    /// A failed start is reported like any other adapter error
    fn report(&self, kind: CapabilityKind, err: SessionError) {
        warn!("{:?} failed to start: {}", kind, err);
        let _ = self.events_tx.send(Event::Capability {
            generation: self.session.generation,
            kind,
            event: CapabilityEvent::Error(err),
        });
    }

    fn take_handle(&mut self, kind: CapabilityKind) -> Option<CapabilityHandle> {
        match kind {
            CapabilityKind::Capture => self.capture.take(),
            CapabilityKind::Recognition => self.recognition.take(),
            CapabilityKind::Synthesis | CapabilityKind::Playback => self.output.take(),
        }
    }

    fn release(&mut self, kind: CapabilityKind) {
        if let Some(handle) = self.take_handle(kind) {
            self.capabilities.cancel(handle);
        }
    }

    fn abort_reply(&mut self) {
        if let Some(task) = self.reply_task.take() {
            task.abort();
        }
    }

    fn release_all(&mut self) {
        self.release(CapabilityKind::Capture);
        self.release(CapabilityKind::Recognition);
        self.release(CapabilityKind::Synthesis);
        self.abort_reply();
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.session.snapshot());
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.release_all();
    }
}

/// Cloneable front end to a controller running on its own task
#[derive(Clone)]
pub struct ControllerHandle {
    commands: mpsc::Sender<Command>,
    snapshots: watch::Receiver<Snapshot>,
}

impl ControllerHandle {
    /// Spawn `controller` and return a handle to it
    pub fn spawn(controller: SessionController) -> (Self, JoinHandle<()>) {
        let (commands, rx) = mpsc::channel(32);
        let snapshots = controller.subscribe();
        let task = tokio::spawn(controller.run(rx));

        (Self { commands, snapshots }, task)
    }

    pub async fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .await
            .context("Session controller is not running")
    }

    pub async fn start(&self) -> Result<()> {
        self.send(Command::Start).await
    }

    pub async fn cancel(&self) -> Result<()> {
        self.send(Command::Cancel).await
    }

    pub async fn acknowledge(&self) -> Result<()> {
        self.send(Command::Acknowledge).await
    }

    /// Tear the controller down, releasing every handle
    pub async fn shutdown(&self) -> Result<()> {
        self.send(Command::Teardown).await
    }

    pub fn snapshot(&self) -> Snapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshots.clone()
    }

    /// Wait for the first published snapshot that satisfies `done`
    pub async fn wait_for(&self, done: impl FnMut(&Snapshot) -> bool) -> Result<Snapshot> {
        let mut rx = self.subscribe();
        let snapshot = rx
            .wait_for(done)
            .await
            .context("Session controller stopped")?;
        Ok(snapshot.clone())
    }
}
