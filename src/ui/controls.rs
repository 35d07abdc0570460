use crate::controls::InputEvent;
use crate::playback::{PlaybackStatus, SessionEvent};
use imgui::{Condition, StyleColor, Ui};

/// Labels of the manual step buttons, in display order
pub const BUTTON_LABELS: [&str; 3] = ["Reset", "Prev", "Next"];

const ACCENT: [f32; 4] = [0.02, 0.59, 0.41, 1.0];
const ACCENT_HOVER: [f32; 4] = [0.06, 0.72, 0.51, 1.0];

/// Playback controls: step buttons, auto-play toggle and status line
pub struct ControlsWindow {
    auto_play: bool,
}

impl Default for ControlsWindow {
    fn default() -> Self {
        Self::new()
    }
}

impl ControlsWindow {
    pub fn new() -> Self {
        Self { auto_play: false }
    }

    /// Render the window and return the events the user triggered
    pub fn render(&mut self, ui: &Ui, status: Option<&PlaybackStatus>, is_open: &mut bool) -> Vec<SessionEvent> {
        let mut events = Vec::new();

        ui.window("Playback")
            .size([420.0, 130.0], Condition::FirstUseEver)
            .position([20.0, 620.0], Condition::FirstUseEver)
            .opened(is_open)
            .build(|| {
                let Some(status) = status else {
                    ui.text_disabled("No play selected");
                    return;
                };

                // Follow the session: Reset clears auto-play on its side
                self.auto_play = status.auto_play;

                for (i, label) in BUTTON_LABELS.iter().enumerate() {
                    if i > 0 {
                        ui.same_line();
                    }
                    let _colors = (*label == "Next").then(|| {
                        (
                            ui.push_style_color(StyleColor::Button, ACCENT),
                            ui.push_style_color(StyleColor::ButtonHovered, ACCENT_HOVER),
                        )
                    });
                    if ui.button(label) {
                        events.push(SessionEvent::Input(InputEvent::Button(label.to_string())));
                    }
                }

                ui.same_line();
                if ui.checkbox("Auto", &mut self.auto_play) {
                    events.push(SessionEvent::SetAutoPlay(self.auto_play));
                }

                ui.separator();
                ui.text(status.step_text());
                if let Some(label) = &status.label {
                    ui.same_line();
                    ui.text_colored([0.63, 0.63, 0.67, 1.0], label);
                }
                ui.text_disabled("Space/→ advance, ← back, R reset");
            });

        events
    }
}
