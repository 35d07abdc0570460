use crate::content::{LibraryEntry, PlayLibrary};
use imgui::{Condition, Ui};
use std::path::{Path, PathBuf};

/// Action requested from the library window
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LibraryAction {
    Open(PathBuf),
    Refresh,
    ChooseFolder,
}

/// Browser for the plays in the library directory
pub struct LibraryWindow {
    /// Selected tag, `None` shows every play
    tag_filter: Option<String>,
    /// Title search
    query: String,
}

impl Default for LibraryWindow {
    fn default() -> Self {
        Self::new()
    }
}

impl LibraryWindow {
    pub fn new() -> Self {
        Self {
            tag_filter: None,
            query: String::new(),
        }
    }

    pub fn render(
        &mut self,
        ui: &Ui,
        library: &PlayLibrary,
        current: Option<&Path>,
        is_open: &mut bool,
    ) -> Option<LibraryAction> {
        let mut action = None;

        ui.window("Library")
            .size([320.0, 520.0], Condition::FirstUseEver)
            .position([20.0, 30.0], Condition::FirstUseEver)
            .opened(is_open)
            .build(|| {
                action = self.render_content(ui, library, current);
            });

        action
    }

    fn render_content(&mut self, ui: &Ui, library: &PlayLibrary, current: Option<&Path>) -> Option<LibraryAction> {
        let mut action = None;

        if ui.small_button("Folder...") {
            action = Some(LibraryAction::ChooseFolder);
        }
        ui.same_line();
        if ui.small_button("Refresh") {
            action = Some(LibraryAction::Refresh);
        }

        let Some(root) = library.root() else {
            ui.text_disabled("No library folder");
            return action;
        };
        ui.same_line();
        ui.text_disabled(root.display().to_string());

        // Tag filter
        let tags = library.tags();
        let preview = self.tag_filter.as_deref().unwrap_or("All tags");
        if let Some(_combo) = ui.begin_combo("##tag", preview) {
            if ui.selectable_config("All tags").selected(self.tag_filter.is_none()).build() {
                self.tag_filter = None;
            }
            for tag in &tags {
                let selected = self.tag_filter.as_deref() == Some(tag.as_str());
                if ui.selectable_config(tag).selected(selected).build() {
                    self.tag_filter = Some(tag.clone());
                }
            }
        }

        // The selected tag may have vanished after a refresh
        if let Some(tag) = &self.tag_filter {
            if !tags.contains(tag) {
                self.tag_filter = None;
            }
        }

        let _ = ui.input_text("##query", &mut self.query)
            .hint("Search title...")
            .build();

        ui.separator();

        let entries = library.filter(self.tag_filter.as_deref(), &self.query);
        if entries.is_empty() {
            ui.text_disabled("No plays");
        }

        for (i, entry) in entries.iter().enumerate() {
            if let Some(path) = render_entry(ui, i, entry, current) {
                action = Some(LibraryAction::Open(path));
            }
        }

        action
    }
}

fn render_entry(ui: &Ui, index: usize, entry: &LibraryEntry, current: Option<&Path>) -> Option<PathBuf> {
    let is_current = current == Some(entry.path.as_path());
    let label = format!("{}##play_{}", entry.title, index);

    let mut opened = None;
    if entry.is_valid() {
        if ui.selectable_config(&label).selected(is_current).build() {
            opened = Some(entry.path.clone());
        }
    } else {
        ui.text_colored([1.0, 0.4, 0.4, 1.0], &entry.title);
    }

    if ui.is_item_hovered() {
        ui.tooltip(|| {
            ui.text(entry.path.display().to_string());
            match &entry.error {
                Some(error) => ui.text_colored([1.0, 0.4, 0.4, 1.0], error),
                None => ui.text(format!("{} steps", entry.step_count)),
            }
            if !entry.tags.is_empty() {
                ui.text(format!("Tags: {}", entry.tags.join(", ")));
            }
            if let Some(modified) = entry.modified {
                ui.text_disabled(format!("Modified {}", modified.format("%Y-%m-%d %H:%M")));
            }
        });
    }

    opened
}
