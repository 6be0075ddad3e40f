//! Scripted capability double
//!
//! Replays a fixed list of lifecycle events for every invocation and keeps
//! count of starts, stops, cancels and still-running adapter tasks, so whole
//! exchanges can run without devices.

use super::contract::{
    Capability, CapabilityEvent, CapabilityHandle, EventSink, Release,
};
use crate::error::SessionError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// One step of a script
#[derive(Debug, Clone)]
pub enum Step {
    Emit(CapabilityEvent),
    Wait(Duration),
    /// Wait until the handle is released
    Hold,
}

/// Counters shared between a scripted capability and its running tasks
#[derive(Debug, Default)]
pub struct ScriptStats {
    starts: AtomicUsize,
    stops: AtomicUsize,
    cancels: AtomicUsize,
    active: AtomicUsize,
}

impl ScriptStats {
    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub fn cancels(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }

    /// Adapter tasks that have not finished or been aborted yet
    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }
}

/// Decrements the active count however the task ends, abort included
struct ActiveGuard(Arc<ScriptStats>);

impl ActiveGuard {
    fn enter(stats: &Arc<ScriptStats>) -> Self {
        stats.active.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(stats))
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.active.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct ScriptedCapability<R> {
    name: String,
    script: Vec<Step>,
    on_stop: Vec<CapabilityEvent>,
    start_error: Option<SessionError>,
    stats: Arc<ScriptStats>,
    requests: Mutex<Vec<R>>,
}

impl<R: Send + 'static> ScriptedCapability<R> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            script: Vec::new(),
            on_stop: Vec::new(),
            start_error: None,
            stats: Arc::new(ScriptStats::default()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn emit(mut self, event: CapabilityEvent) -> Self {
        self.script.push(Step::Emit(event));
        self
    }

    pub fn wait(mut self, duration: Duration) -> Self {
        self.script.push(Step::Wait(duration));
        self
    }

    pub fn hold(mut self) -> Self {
        self.script.push(Step::Hold);
        self
    }

    /// Events emitted when the handle is stopped gracefully
    pub fn on_stop(mut self, event: CapabilityEvent) -> Self {
        self.on_stop.push(event);
        self
    }

    /// Make every `start` fail with `err`
    pub fn fail_start(mut self, err: SessionError) -> Self {
        self.start_error = Some(err);
        self
    }

    pub fn stats(&self) -> Arc<ScriptStats> {
        Arc::clone(&self.stats)
    }

    /// Requests received so far, in order
    pub async fn requests(&self) -> Vec<R>
    where
        R: Clone,
    {
        self.requests.lock().await.clone()
    }
}

#[async_trait::async_trait]
impl<R: Send + 'static> Capability for ScriptedCapability<R> {
    type Request = R;

    async fn start(&self, request: R, events: EventSink) -> Result<CapabilityHandle, SessionError> {
        self.stats.starts.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().await.push(request);

        if let Some(err) = &self.start_error {
            return Err(err.clone());
        }

        let script = self.script.clone();
        let on_stop = self.on_stop.clone();
        let guard = ActiveGuard::enter(&self.stats);
        let sink = events.clone();

        Ok(CapabilityHandle::spawn(&events, move |mut signal| async move {
            let _guard = guard;

            for step in script {
                let release = match step {
                    Step::Emit(event) => {
                        sink.emit(event);
                        continue;
                    }
                    Step::Wait(duration) => tokio::select! {
                        _ = tokio::time::sleep(duration) => continue,
                        release = signal.released() => release,
                    },
                    Step::Hold => signal.released().await,
                };

                if release == Release::Stop {
                    for event in on_stop {
                        sink.emit(event);
                    }
                }
                return;
            }
        }))
    }

    async fn stop(&self, handle: CapabilityHandle) {
        self.stats.stops.fetch_add(1, Ordering::SeqCst);
        handle.stop();
    }

    fn cancel(&self, handle: CapabilityHandle) {
        self.stats.cancels.fetch_add(1, Ordering::SeqCst);
        handle.cancel();
    }

    fn name(&self) -> &str {
        &self.name
    }
}
