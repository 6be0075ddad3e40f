//! Pure transition function of the session state machine
//!
//! `transition(session, event)` never touches an adapter. It returns the next
//! session together with the effects the controller must execute, so every row
//! of the lifecycle can be exercised without real capabilities.

use super::effect::Effect;
use super::event::Event;
use super::state::{Session, SessionState};
use crate::capability::{CapabilityEvent, CapabilityKind, Payload};
use crate::error::SessionError;
use crate::reply::RemoteReply;
use tracing::{debug, info, warn};

/// Outcome of applying one event
#[derive(Debug)]
pub struct Transition {
    pub session: Session,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn new(session: Session, effects: Vec<Effect>) -> Self {
        Self { session, effects }
    }

    fn unchanged(session: Session) -> Self {
        Self::new(session, Vec::new())
    }
}

/// Apply `event` to `session`
pub fn transition(session: Session, event: Event) -> Transition {
    if let Some(generation) = event.generation() {
        if generation != session.generation {
            debug!(
                "Discarding stale event from {} (current {})",
                generation, session.generation
            );
            return Transition::unchanged(session);
        }
    }

    match event {
        Event::Start { at } => {
            let mut next = Session::fresh(session.generation.next());
            next.state = SessionState::Listening;
            next.started_at = Some(at);
            info!("Session {} listening", next.generation);
            Transition::new(
                next,
                vec![Effect::ReleaseAll, Effect::StartCapture, Effect::StartRecognition],
            )
        }
        Event::Cancel => cancel(session),
        Event::Acknowledge => acknowledge(session),
        Event::Teardown => {
            let next = Session::fresh(session.generation.next());
            info!("Session torn down, next generation {}", next.generation);
            Transition::new(next, vec![Effect::ReleaseAll])
        }
        Event::Proceed => proceed(session),
        Event::Capability { kind, event, .. } => on_capability(session, kind, event),
        Event::Reply { outcome, .. } => on_reply(session, outcome),
    }
}

fn cancel(mut session: Session) -> Transition {
    if session.state.is_terminal() {
        return Transition::unchanged(session);
    }

    info!("Session {} cancelled in {:?}", session.generation, session.state);
    session.generation = session.generation.next();
    session.state = SessionState::Idle;
    session.is_speaking = false;
    Transition::new(session, vec![Effect::ReleaseAll])
}

fn acknowledge(mut session: Session) -> Transition {
    if session.state != SessionState::Errored {
        return Transition::unchanged(session);
    }

    session.state = SessionState::Idle;
    session.error = None;
    Transition::new(session, vec![Effect::ReleaseAll])
}

fn proceed(mut session: Session) -> Transition {
    if session.state != SessionState::Recognized {
        return Transition::unchanged(session);
    }

    match session.transcript.clone() {
        Some(transcript) => {
            session.state = SessionState::AwaitingReply;
            Transition::new(session, vec![Effect::RequestReply { transcript }])
        }
        None => fail(
            session,
            SessionError::RecognitionFailure("no transcript recorded".into()),
            Vec::new(),
        ),
    }
}

fn on_capability(mut session: Session, kind: CapabilityKind, event: CapabilityEvent) -> Transition {
    use CapabilityKind::{Capture, Recognition};
    use SessionState::{Listening, Replying, Speaking};

    match (session.state, kind, event) {
        // A gracefully stopped capture flushes its buffer whenever it gets there
        (_, Capture, CapabilityEvent::Data(Payload::Recording(audio))) => {
            session.recorded_audio = Some(audio);
            Transition::unchanged(session)
        }

        (Listening, Recognition, CapabilityEvent::Data(Payload::Transcript(text))) => {
            if text.trim().is_empty() {
                return fail(
                    session,
                    SessionError::RecognitionFailure("no-speech".into()),
                    listening_release(),
                );
            }
            info!("Session {} recognized: {}", session.generation, text);
            session.transcript = Some(text);
            session.state = SessionState::Recognized;
            Transition::new(
                session,
                vec![Effect::Stop(Recognition), Effect::Stop(Capture)],
            )
        }

        (Listening, Recognition | Capture, CapabilityEvent::Error(err)) => {
            fail(session, err, listening_release())
        }

        (Listening, Recognition, CapabilityEvent::Ended) => fail(
            session,
            SessionError::RecognitionFailure("recognition ended without a transcript".into()),
            listening_release(),
        ),

        (Replying, kind, CapabilityEvent::Started) if kind.is_output() => {
            session.state = SessionState::Speaking;
            session.is_speaking = true;
            Transition::unchanged(session)
        }

        (Replying | Speaking, kind, CapabilityEvent::Ended) if kind.is_output() => {
            info!("Session {} finished speaking", session.generation);
            session.state = SessionState::Idle;
            session.is_speaking = false;
            Transition::new(session, vec![Effect::Release(kind)])
        }

        (Replying | Speaking, kind, CapabilityEvent::Error(err)) if kind.is_output() => {
            fail(session, err, vec![Effect::Release(kind)])
        }

        (state, kind, event) => {
            debug!("Ignoring {:?} from {:?} while {:?}", event, kind, state);
            Transition::unchanged(session)
        }
    }
}

fn on_reply(mut session: Session, outcome: Result<RemoteReply, SessionError>) -> Transition {
    if session.state != SessionState::AwaitingReply {
        debug!("Ignoring remote reply while {:?}", session.state);
        return Transition::unchanged(session);
    }

    let reply = match outcome {
        Ok(reply) => reply,
        Err(err) => return fail(session, err, Vec::new()),
    };

    let has_text = !reply.reply_text.trim().is_empty();
    let effect = match reply.reply_audio {
        Some(audio) => {
            session.reply_audio = Some(audio.clone());
            Effect::Play { audio }
        }
        None if has_text => Effect::Speak {
            text: reply.reply_text.clone(),
        },
        None => return fail(session, SessionError::NoContent, Vec::new()),
    };

    if has_text {
        session.reply_text = Some(reply.reply_text);
    }
    session.state = SessionState::Replying;
    Transition::new(session, vec![effect])
}

fn listening_release() -> Vec<Effect> {
    vec![
        Effect::Release(CapabilityKind::Recognition),
        Effect::Release(CapabilityKind::Capture),
    ]
}

fn fail(mut session: Session, err: SessionError, effects: Vec<Effect>) -> Transition {
    warn!("Session {} failed in {:?}: {}", session.generation, session.state, err);
    session.state = SessionState::Errored;
    session.is_speaking = false;
    session.error = Some(err);
    Transition::new(session, effects)
}
