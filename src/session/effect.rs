use crate::capability::{AudioBuffer, CapabilityKind};

/// Side effects requested by a transition, executed by the controller in order
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Cancel every held handle and any in-flight remote call
    ReleaseAll,

    /// Acquire a microphone capture handle
    StartCapture,

    /// Acquire a speech recognition handle
    StartRecognition,

    /// Stop a handle gracefully, letting it flush its final data
    Stop(CapabilityKind),

    /// Cancel a handle without waiting for its `ended` event
    Release(CapabilityKind),

    /// Ask the remote reply service for an answer
    RequestReply { transcript: String },

    /// Speak reply text through the synthesis capability
    Speak { text: String },

    /// Play reply audio through the playback capability
    Play { audio: AudioBuffer },
}
