use super::state::Generation;
use crate::capability::{CapabilityEvent, CapabilityKind};
use crate::error::SessionError;
use crate::reply::RemoteReply;
use chrono::{DateTime, Utc};

/// Everything the session controller reacts to
#[derive(Debug, Clone)]
pub enum Event {
    /// User starts speaking (also restarts from any other state)
    Start { at: DateTime<Utc> },

    /// User cancels the exchange in progress
    Cancel,

    /// User dismisses an error
    Acknowledge,

    /// Surrounding view is going away
    Teardown,

    /// Automatic step out of `Recognized`
    Proceed,

    /// Lifecycle event from one of the capability adapters
    Capability {
        generation: Generation,
        kind: CapabilityKind,
        event: CapabilityEvent,
    },

    /// The remote reply client resolved or rejected
    Reply {
        generation: Generation,
        outcome: Result<RemoteReply, SessionError>,
    },
}

impl Event {
    /// A start request stamped with the current time
    pub fn start() -> Self {
        Event::Start { at: Utc::now() }
    }

    /// Generation tag for adapter and client events; user commands are untagged
    pub fn generation(&self) -> Option<Generation> {
        match self {
            Event::Capability { generation, .. } | Event::Reply { generation, .. } => {
                Some(*generation)
            }
            _ => None,
        }
    }
}

/// User-issued commands, accepted by [`super::ControllerHandle`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Cancel,
    Acknowledge,
    Teardown,
}

impl From<Command> for Event {
    fn from(command: Command) -> Self {
        match command {
            Command::Start => Event::start(),
            Command::Cancel => Event::Cancel,
            Command::Acknowledge => Event::Acknowledge,
            Command::Teardown => Event::Teardown,
        }
    }
}
