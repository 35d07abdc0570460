use crate::core::{PlayDefinition, VideoSource};
use imgui::{Condition, Ui};

/// Title, tags, video link and step list of the loaded play
pub fn render_play_info(ui: &Ui, play: Option<&PlayDefinition>, error: Option<&str>, is_open: &mut bool) {
    ui.window("Play Info")
        .size([320.0, 360.0], Condition::FirstUseEver)
        .position([1060.0, 30.0], Condition::FirstUseEver)
        .opened(is_open)
        .build(|| {
            if let Some(error) = error {
                ui.text_colored([1.0, 0.4, 0.4, 1.0], "No play selected");
                ui.text_wrapped(error);
                return;
            }

            let Some(play) = play else {
                ui.text_disabled("No play selected (File > Open Play...)");
                return;
            };

            ui.text(&play.title);
            if !play.tags.is_empty() {
                ui.text_disabled(format!("Tags: {}", play.tags.join(", ")));
            }

            if let Some(video) = &play.video {
                let source = VideoSource::parse(video);
                ui.separator();
                match &source {
                    VideoSource::YouTube { id, .. } => ui.text(format!("Video (YouTube {})", id)),
                    VideoSource::Direct(_) => ui.text("Video"),
                }
                ui.text_wrapped(source.url());
                if ui.small_button("Copy link") {
                    ui.set_clipboard_text(source.url());
                }
            }

            ui.separator();
            ui.text(format!("{} steps", play.step_count()));
            for (i, step) in play.steps.iter().enumerate() {
                ui.text(format!(
                    "{:2}. {} ({} ms, {} players)",
                    i + 1,
                    step.label.as_deref().unwrap_or("-"),
                    step.duration().as_millis(),
                    step.players.len()
                ));
            }
        });
}
