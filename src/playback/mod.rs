pub mod controller;
pub mod session;

pub use controller::{AutoTimer, PlaybackController, TimerId};
pub use session::{PlaybackSession, SessionEvent, SessionHandle};

use crate::core::Frame;

/// Playback state owned by the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlaybackState {
    /// Index of the step being shown
    pub current_index: usize,
    /// Whether steps advance on their own
    pub auto_play: bool,
}

/// Read-only copy of the session state published to the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlaybackSnapshot {
    pub state: PlaybackState,
    pub step_count: usize,
    /// Whether an auto-advance timer is pending
    pub timer_pending: bool,
    /// Whether voice commands are being listened for
    pub voice_active: bool,
}

/// Status line data for the UI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackStatus {
    /// 1-based step number; 0 when the play has no steps
    pub step_number: usize,
    pub step_count: usize,
    pub label: Option<String>,
    pub auto_play: bool,
}

impl PlaybackStatus {
    pub fn new(snapshot: &PlaybackSnapshot, frame: &Frame) -> Self {
        let step_number = if snapshot.step_count == 0 {
            0
        } else {
            snapshot.state.current_index + 1
        };

        Self {
            step_number,
            step_count: snapshot.step_count,
            label: frame.label.clone(),
            auto_play: snapshot.state.auto_play,
        }
    }

    /// `Step k / N`
    pub fn step_text(&self) -> String {
        format!("Step {} / {}", self.step_number, self.step_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{derive_frame, PlayDefinition, Player, Step};

    #[test]
    fn test_status_is_one_based() {
        let play = PlayDefinition::new(
            "Two",
            vec![
                Step {
                    label: Some("Start".to_string()),
                    players: vec![Player::new("A", 1.0, 1.0)],
                    ..Default::default()
                },
                Step::default(),
            ],
        );
        let snapshot = PlaybackSnapshot {
            state: PlaybackState {
                current_index: 0,
                auto_play: true,
            },
            step_count: 2,
            ..Default::default()
        };

        let status = PlaybackStatus::new(&snapshot, &derive_frame(&play, 0));
        assert_eq!(status.step_text(), "Step 1 / 2");
        assert_eq!(status.label.as_deref(), Some("Start"));
        assert!(status.auto_play);
    }

    #[test]
    fn test_status_for_empty_play() {
        let status = PlaybackStatus::new(&PlaybackSnapshot::default(), &Frame::empty());
        assert_eq!(status.step_text(), "Step 0 / 0");
        assert_eq!(status.label, None);
    }
}
