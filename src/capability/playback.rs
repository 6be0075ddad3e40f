use super::audio::AudioBuffer;
use super::contract::{Capability, CapabilityEvent, CapabilityHandle, EventSink, Release};
use crate::error::SessionError;
use std::time::Duration;
use tracing::info;

/// Native media-element events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackSignal {
    Play,
    Pause,
    Ended,
}

/// Pause counts as the end of speech: the avatar stops talking either way
pub fn playback_event(signal: PlaybackSignal) -> CapabilityEvent {
    match signal {
        PlaybackSignal::Play => CapabilityEvent::Started,
        PlaybackSignal::Pause | PlaybackSignal::Ended => CapabilityEvent::Ended,
    }
}

/// Plays buffered reply audio
///
/// Playback runs for the buffer's probed duration; buffers whose length can't
/// be determined use `fallback_duration`.
pub struct BufferedPlayer {
    fallback_duration: Duration,
}

impl BufferedPlayer {
    pub fn new(fallback_duration: Duration) -> Self {
        Self { fallback_duration }
    }
}

impl Default for BufferedPlayer {
    fn default() -> Self {
        Self::new(Duration::from_secs(2))
    }
}

#[async_trait::async_trait]
impl Capability for BufferedPlayer {
    type Request = AudioBuffer;

    async fn start(
        &self,
        audio: AudioBuffer,
        events: EventSink,
    ) -> Result<CapabilityHandle, SessionError> {
        let info = audio.probe()?;
        let duration = info.duration.unwrap_or(self.fallback_duration);
        info!(
            "Playing {} bytes of {} for {:?}",
            audio.len(),
            audio.mime(),
            duration
        );

        let sink = events.clone();
        Ok(CapabilityHandle::spawn(&events, move |mut signal| async move {
            sink.emit(playback_event(PlaybackSignal::Play));

            tokio::select! {
                _ = tokio::time::sleep(duration) => {
                    sink.emit(playback_event(PlaybackSignal::Ended));
                }
                release = signal.released() => {
                    if release == Release::Stop {
                        sink.emit(playback_event(PlaybackSignal::Pause));
                    }
                }
            }
            drop(audio);
        }))
    }

    fn name(&self) -> &str {
        "buffered-player"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pause_is_consumed_like_ended() {
        assert_eq!(playback_event(PlaybackSignal::Play), CapabilityEvent::Started);
        assert_eq!(playback_event(PlaybackSignal::Pause), CapabilityEvent::Ended);
        assert_eq!(playback_event(PlaybackSignal::Ended), CapabilityEvent::Ended);
    }
}
