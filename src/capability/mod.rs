//! Capability adapters
//!
//! Thin contracts over the four external capabilities a voice exchange uses:
//! - Microphone capture (frames buffered into a WAV recording)
//! - Speech recognition (one final transcript per invocation)
//! - Speech synthesis (one utterance at a time)
//! - Audio playback (buffered reply audio)
//!
//! Each adapter is started through the same [`Capability`] trait and reports
//! `started` / `data` / `error` / `ended` events tagged with the session
//! generation it was started for.

pub mod audio;
pub mod contract;
pub mod microphone;
pub mod playback;
pub mod recognition;
pub mod scripted;
pub mod synthesis;

pub use audio::{AudioBuffer, AudioFrame, AudioInfo, CaptureConfig, FrameSource, SilenceSource, WavFileSource};
pub use contract::{
    Capability, CapabilityEvent, CapabilityHandle, CapabilityKind, EventSink, Payload, Release,
    ReleaseSignal,
};
pub use microphone::Microphone;
pub use playback::{playback_event, BufferedPlayer, PlaybackSignal};
pub use recognition::{LineRecognizer, RecognitionConfig, RecognitionSignal};
pub use scripted::{ScriptStats, ScriptedCapability, Step};
pub use synthesis::{select_voice, ConsoleSynthesizer, Utterance, Voice};
