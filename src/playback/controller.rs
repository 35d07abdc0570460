use crate::controls::Command;
use crate::core::PlayDefinition;
use crate::playback::PlaybackState;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Identifies one armed auto-advance timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// The pending auto-advance timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoTimer {
    pub id: TimerId,
    /// Step that was current when the timer was armed
    pub step_index: usize,
    pub delay: Duration,
    pub deadline: Instant,
}

/// State machine for stepping through a play
///
/// Owns the current step index, the auto-play flag and at most one pending
/// auto-advance timer. A timer only exists while auto-play is on and a next
/// step exists; every manual command and every toggle-off cancels it.
pub struct PlaybackController {
    play: Arc<PlayDefinition>,
    state: PlaybackState,
    timer: Option<AutoTimer>,
    next_timer_id: u64,
}

impl PlaybackController {
    pub fn new(play: Arc<PlayDefinition>) -> Self {
        Self {
            play,
            state: PlaybackState::default(),
            timer: None,
            next_timer_id: 0,
        }
    }

    pub fn play(&self) -> &Arc<PlayDefinition> {
        &self.play
    }

    /// Get current playback state
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Get current step index
    pub fn position(&self) -> usize {
        self.state.current_index
    }

    /// Get total number of steps
    pub fn step_count(&self) -> usize {
        self.play.step_count()
    }

    pub fn is_auto_play(&self) -> bool {
        self.state.auto_play
    }

    /// Get the pending auto-advance timer, if any
    pub fn timer(&self) -> Option<&AutoTimer> {
        self.timer.as_ref()
    }

    /// Apply a manual command. Returns true if the state changed.
    pub fn apply(&mut self, command: Command) -> bool {
        if self.play.is_empty() {
            return false;
        }

        self.cancel_timer();
        let before = self.state;

        match command {
            Command::Advance => {
                self.state.current_index = (self.state.current_index + 1).min(self.play.last_index());
            }
            Command::Retreat => {
                self.state.current_index = self.state.current_index.saturating_sub(1);
            }
            Command::Reset => {
                self.state.current_index = 0;
                self.state.auto_play = false;
            }
        }

        self.arm_timer();

        debug!(
            "{:?}: step {} -> {} (auto: {})",
            command, before.current_index, self.state.current_index, self.state.auto_play
        );
        before != self.state
    }

    /// Turn auto-play on or off
    pub fn set_auto_play(&mut self, enabled: bool) {
        if self.play.is_empty() || self.state.auto_play == enabled {
            return;
        }

        self.state.auto_play = enabled;
        if enabled {
            self.arm_timer();
        } else {
            self.cancel_timer();
        }
        debug!("Auto-play {}", if enabled { "on" } else { "off" });
    }

    /// Handle expiry of timer `id`. Returns true if the play advanced.
    ///
    /// Fires for anything other than the pending timer are ignored. At the
    /// last step nothing happens and auto-play stays on.
    pub fn on_auto_tick(&mut self, id: TimerId) -> bool {
        match self.timer {
            Some(timer) if timer.id == id => self.timer = None,
            _ => {
                debug!("Ignoring stale auto-advance timer {:?}", id);
                return false;
            }
        }

        if !self.state.auto_play || !self.has_next() {
            return false;
        }

        self.state.current_index += 1;
        debug!("Auto-advance to step {}", self.state.current_index);
        self.arm_timer();
        true
    }

    /// Drop the pending timer without advancing
    pub fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            debug!("Cancelled auto-advance timer {:?}", timer.id);
        }
    }

    fn has_next(&self) -> bool {
        self.state.current_index + 1 < self.play.step_count()
    }

    fn arm_timer(&mut self) {
        if !self.state.auto_play || !self.has_next() {
            return;
        }

        self.next_timer_id += 1;
        let delay = self.play.step_duration(self.state.current_index);
        self.timer = Some(AutoTimer {
            id: TimerId(self.next_timer_id),
            step_index: self.state.current_index,
            delay,
            deadline: Instant::now() + delay,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Player, Step};

    fn play_with(durations: &[u64]) -> Arc<PlayDefinition> {
        let steps = durations
            .iter()
            .enumerate()
            .map(|(i, &ms)| Step {
                duration_ms: Some(ms as f64),
                players: vec![Player::new("A", i as f32 * 10.0, 10.0)],
                ..Default::default()
            })
            .collect();
        Arc::new(PlayDefinition::new("Test", steps))
    }

    fn pending_id(controller: &PlaybackController) -> TimerId {
        controller.timer().expect("timer should be pending").id
    }

    #[test]
    fn test_advance_to_end_then_noop() {
        let mut controller = PlaybackController::new(play_with(&[500, 500, 500, 500]));
        assert_eq!(controller.state(), PlaybackState::default());

        for _ in 0..3 {
            assert!(controller.apply(Command::Advance));
        }
        assert_eq!(controller.position(), 3);

        assert!(!controller.apply(Command::Advance));
        assert_eq!(controller.position(), 3);
    }

    #[test]
    fn test_retreat() {
        let mut controller = PlaybackController::new(play_with(&[500, 500, 500]));
        assert!(!controller.apply(Command::Retreat));
        assert_eq!(controller.position(), 0);

        controller.apply(Command::Advance);
        controller.apply(Command::Advance);
        assert!(controller.apply(Command::Retreat));
        assert_eq!(controller.position(), 1);
    }

    #[test]
    fn test_reset_from_every_state() {
        for index in 0..3 {
            for auto in [false, true] {
                let mut controller = PlaybackController::new(play_with(&[500, 500, 500]));
                for _ in 0..index {
                    controller.apply(Command::Advance);
                }
                controller.set_auto_play(auto);

                controller.apply(Command::Reset);
                assert_eq!(controller.state(), PlaybackState::default());
                assert!(controller.timer().is_none());
            }
        }
    }

    #[test]
    fn test_auto_tick_advances_and_rearms() {
        let mut controller = PlaybackController::new(play_with(&[500, 700, 900]));
        controller.set_auto_play(true);

        let first = *controller.timer().unwrap();
        assert_eq!(first.step_index, 0);
        assert_eq!(first.delay, Duration::from_millis(500));

        assert!(controller.on_auto_tick(first.id));
        assert_eq!(controller.position(), 1);

        let second = *controller.timer().unwrap();
        assert_ne!(second.id, first.id);
        assert_eq!(second.step_index, 1);
        assert_eq!(second.delay, Duration::from_millis(700));
    }

    #[test]
    fn test_auto_play_stalls_at_last_step() {
        let mut controller = PlaybackController::new(play_with(&[500, 500]));
        controller.set_auto_play(true);
        let id = pending_id(&controller);
        controller.on_auto_tick(id);

        assert_eq!(controller.position(), 1);
        assert!(controller.is_auto_play());
        assert!(controller.timer().is_none());

        // Enabling at the last step arms nothing either
        controller.set_auto_play(false);
        controller.set_auto_play(true);
        assert!(controller.timer().is_none());
        assert_eq!(controller.position(), 1);
    }

    #[test]
    fn test_manual_command_replaces_pending_timer() {
        let mut controller = PlaybackController::new(play_with(&[500, 500, 500]));
        controller.set_auto_play(true);
        let stale = pending_id(&controller);

        controller.apply(Command::Advance);
        let fresh = pending_id(&controller);
        assert_ne!(stale, fresh);

        // The old timer firing late must not double-advance
        assert!(!controller.on_auto_tick(stale));
        assert_eq!(controller.position(), 1);
        assert_eq!(pending_id(&controller), fresh);

        assert!(controller.on_auto_tick(fresh));
        assert_eq!(controller.position(), 2);
    }

    #[test]
    fn test_toggle_off_cancels_timer() {
        let mut controller = PlaybackController::new(play_with(&[500, 500]));
        controller.set_auto_play(true);
        let id = pending_id(&controller);

        controller.set_auto_play(false);
        assert!(controller.timer().is_none());
        assert!(!controller.on_auto_tick(id));
        assert_eq!(controller.position(), 0);
    }

    #[test]
    fn test_enable_twice_keeps_timer() {
        let mut controller = PlaybackController::new(play_with(&[500, 500]));
        controller.set_auto_play(true);
        let id = pending_id(&controller);

        controller.set_auto_play(true);
        assert_eq!(pending_id(&controller), id);
    }

    #[test]
    fn test_default_duration_for_timer() {
        let play = Arc::new(PlayDefinition::new(
            "Defaults",
            vec![Step::default(), Step::default()],
        ));
        let mut controller = PlaybackController::new(play);
        controller.set_auto_play(true);
        assert_eq!(
            controller.timer().unwrap().delay,
            Duration::from_millis(crate::core::DEFAULT_STEP_DURATION_MS)
        );
    }

    #[test]
    fn test_empty_play_is_inert() {
        let mut controller = PlaybackController::new(Arc::new(PlayDefinition::new("Empty", Vec::new())));

        assert!(!controller.apply(Command::Advance));
        assert!(!controller.apply(Command::Retreat));
        assert!(!controller.apply(Command::Reset));
        controller.set_auto_play(true);

        assert_eq!(controller.state(), PlaybackState::default());
        assert!(controller.timer().is_none());
    }
}
