//! Avatar presenter
//!
//! Stateless apart from the mouth flag: given a variant and whether speech is
//! playing, it toggles `mouth_open` on a fixed timer while speaking and keeps
//! the mouth closed otherwise. It knows nothing about sessions or errors.

use crate::session::Snapshot;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Default mouth toggle period
pub const MOUTH_INTERVAL: Duration = Duration::from_millis(150);

/// Avatar look selected before starting a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AvatarVariant {
    #[default]
    Chinese,
    Indian,
    Malay,
}

impl AvatarVariant {
    pub const ALL: [AvatarVariant; 3] = [AvatarVariant::Chinese, AvatarVariant::Indian, AvatarVariant::Malay];

    pub fn label(self) -> &'static str {
        match self {
            AvatarVariant::Chinese => "Chinese",
            AvatarVariant::Indian => "Indian",
            AvatarVariant::Malay => "Malay",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            AvatarVariant::Chinese => "East Asian features with warm skin tone",
            AvatarVariant::Indian => "South Asian features with rich skin tone",
            AvatarVariant::Malay => "Southeast Asian features with golden skin tone",
        }
    }
}

/// What the renderer draws
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvatarFrame {
    pub variant: AvatarVariant,
    pub is_speaking: bool,
    pub mouth_open: bool,
}

impl fmt::Display for AvatarFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mouth = if self.mouth_open { "O" } else { "-" };
        write!(f, "[{}] (o{}o)", self.variant.label(), mouth)
    }
}

/// Mouth animation state
#[derive(Debug, Clone)]
pub struct Avatar {
    variant: AvatarVariant,
    is_speaking: bool,
    mouth_open: bool,
}

impl Avatar {
    pub fn new(variant: AvatarVariant) -> Self {
        Self {
            variant,
            is_speaking: false,
            mouth_open: false,
        }
    }

    pub fn is_speaking(&self) -> bool {
        self.is_speaking
    }

    pub fn set_speaking(&mut self, speaking: bool) {
        self.is_speaking = speaking;
        if !speaking {
            self.mouth_open = false;
        }
    }

    /// Timer tick: flip the mouth while speaking
    pub fn tick(&mut self) {
        if self.is_speaking {
            self.mouth_open = !self.mouth_open;
        }
    }

    pub fn frame(&self) -> AvatarFrame {
        AvatarFrame {
            variant: self.variant,
            is_speaking: self.is_speaking,
            mouth_open: self.mouth_open,
        }
    }
}

/// Follow session snapshots and publish avatar frames
///
/// The task ends when the snapshot channel closes.
pub fn spawn_presenter(
    variant: AvatarVariant,
    interval: Duration,
    mut snapshots: watch::Receiver<Snapshot>,
) -> (watch::Receiver<AvatarFrame>, JoinHandle<()>) {
    let mut avatar = Avatar::new(variant);
    avatar.set_speaking(snapshots.borrow().is_speaking);
    let (tx, rx) = watch::channel(avatar.frame());

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                changed = snapshots.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let speaking = snapshots.borrow_and_update().is_speaking;
                    if speaking != avatar.is_speaking() {
                        avatar.set_speaking(speaking);
                        ticker.reset();
                        tx.send_replace(avatar.frame());
                    }
                }
                _ = ticker.tick(), if avatar.is_speaking() => {
                    avatar.tick();
                    tx.send_replace(avatar.frame());
                }
            }
        }
    });

    (rx, task)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionState;

    #[test]
    fn test_mouth_only_moves_while_speaking() {
        let mut avatar = Avatar::new(AvatarVariant::Malay);
        avatar.tick();
        assert!(!avatar.frame().mouth_open);

        avatar.set_speaking(true);
        avatar.tick();
        assert!(avatar.frame().mouth_open);
        avatar.tick();
        assert!(!avatar.frame().mouth_open);
        avatar.tick();
        assert!(avatar.frame().mouth_open);

        avatar.set_speaking(false);
        assert!(!avatar.frame().mouth_open);
    }

    #[test]
    fn test_variant_labels() {
        assert_eq!(AvatarVariant::Indian.label(), "Indian");
        assert!(AvatarVariant::Chinese.description().contains("East Asian"));
        assert_eq!(
            serde_json::to_string(&AvatarVariant::Malay).unwrap(),
            "\"malay\""
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_presenter_animates_while_speaking() {
        let (snap_tx, snap_rx) = watch::channel(Snapshot::default());
        let (mut frames, task) = spawn_presenter(AvatarVariant::Chinese, MOUTH_INTERVAL, snap_rx);
        assert!(!frames.borrow().is_speaking);

        snap_tx.send_replace(Snapshot {
            state: SessionState::Speaking,
            is_speaking: true,
            ..Snapshot::default()
        });

        frames.changed().await.unwrap();
        let first = *frames.borrow_and_update();
        assert!(first.is_speaking);
        assert!(!first.mouth_open);

        let started = tokio::time::Instant::now();
        let mut mouth = Vec::new();
        for _ in 0..4 {
            frames.changed().await.unwrap();
            let frame = *frames.borrow_and_update();
            assert!(frame.is_speaking);
            mouth.push(frame.mouth_open);
        }
        assert_eq!(mouth, vec![true, false, true, false]);
        assert!(started.elapsed() >= MOUTH_INTERVAL * 4);

        snap_tx.send_replace(Snapshot::default());
        frames.changed().await.unwrap();
        let frame = *frames.borrow_and_update();
        assert!(!frame.is_speaking);
        assert!(!frame.mouth_open);

        drop(snap_tx);
        task.await.unwrap();
    }
}
