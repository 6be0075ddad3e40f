use super::audio::{normalize_frame, AudioBuffer, CaptureConfig, FrameSource};
use super::contract::{
    Capability, CapabilityEvent, CapabilityHandle, EventSink, Payload, Release,
};
use crate::error::SessionError;
use std::sync::Arc;
use tracing::{error, info};

/// Microphone capture over a [`FrameSource`]
///
/// Frames are buffered for the lifetime of the handle. A graceful stop flushes
/// them as one WAV recording; a cancel throws them away.
pub struct Microphone {
    source: Arc<dyn FrameSource>,
}

impl Microphone {
    pub fn new(source: Arc<dyn FrameSource>) -> Self {
        Self { source }
    }
}

#[async_trait::async_trait]
impl Capability for Microphone {
    type Request = CaptureConfig;

    async fn start(
        &self,
        config: CaptureConfig,
        events: EventSink,
    ) -> Result<CapabilityHandle, SessionError> {
        let mut frames = self.source.open(&config)?;
        info!("Microphone capture started ({})", self.source.name());

        let sink = events.clone();
        Ok(CapabilityHandle::spawn(&events, move |mut signal| async move {
            sink.emit(CapabilityEvent::Started);

            let mut samples: Vec<i16> = Vec::new();
            // Layout the buffered samples actually carry
            let mut format = (config.sample_rate, config.channels);
            let mut source_open = true;

            let release = loop {
                tokio::select! {
                    release = signal.released() => break release,
                    frame = frames.recv(), if source_open => match frame {
                        Some(frame) => {
                            let frame = normalize_frame(frame, config.sample_rate, config.channels);
                            format = (frame.sample_rate, frame.channels);
                            samples.extend_from_slice(&frame.samples);
                        }
                        // Source exhausted; keep the handle until released
                        None => source_open = false,
                    },
                }
            };

            if release == Release::Stop {
                match AudioBuffer::from_pcm(&samples, format.0, format.1) {
                    Ok(recording) => {
                        info!("Captured {} samples", samples.len());
                        sink.emit(CapabilityEvent::Data(Payload::Recording(recording)));
                    }
                    Err(e) => error!("Failed to encode recording: {:#}", e),
                }
                sink.emit(CapabilityEvent::Ended);
            }
        }))
    }

    fn name(&self) -> &str {
        "microphone"
    }
}
