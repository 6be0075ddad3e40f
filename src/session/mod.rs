//! Voice session management
//!
//! This module provides the `SessionController` that owns one spoken exchange:
//! - Microphone capture and speech recognition
//! - The remote reply request
//! - Speech synthesis or reply audio playback
//! - The `is_speaking` flag the avatar animates from
//!
//! State changes are decided by the pure [`transition`] function and executed
//! by the controller, which also publishes a [`Snapshot`] after every event.

mod config;
mod controller;
mod effect;
mod event;
mod state;
mod transition;

pub use config::SessionConfig;
pub use controller::{Capabilities, ControllerHandle, HeldHandles, SessionController};
pub use effect::Effect;
pub use event::{Command, Event};
pub use state::{ErrorSummary, Generation, Session, SessionState, Snapshot};
pub use transition::{transition, Transition};
