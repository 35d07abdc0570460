use crate::controls::voice::{ADVANCE_PHRASES, RESET_PHRASES, RETREAT_PHRASES};
use crate::controls::{Key, KEY_BINDINGS};
use imgui::{Condition, Ui};
use winit::event::{ElementState, KeyEvent};
use winit::keyboard::{Key as WinitKey, KeyCode, ModifiersState, NamedKey, PhysicalKey};

/// Application-level keyboard shortcuts (not playback keys)
pub struct ShortcutManager {
    shortcuts: Vec<Shortcut>,
}

#[derive(Clone)]
pub struct Shortcut {
    pub key: PhysicalKey,
    pub ctrl: bool,
    pub shift: bool,
    pub action: ShortcutAction,
    pub description: String,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ShortcutAction {
    OpenPlay,
    OpenLibrary,
    ToggleAutoPlay,
    Quit,
}

impl ShortcutManager {
    pub fn new() -> Self {
        let mut manager = Self {
            shortcuts: Vec::new(),
        };
        manager.register_defaults();
        manager
    }

    fn register_defaults(&mut self) {
        self.register(Shortcut {
            key: PhysicalKey::Code(KeyCode::KeyO),
            ctrl: true,
            shift: false,
            action: ShortcutAction::OpenPlay,
            description: "Open Play".to_string(),
        });
        self.register(Shortcut {
            key: PhysicalKey::Code(KeyCode::KeyL),
            ctrl: true,
            shift: false,
            action: ShortcutAction::OpenLibrary,
            description: "Open Play Library".to_string(),
        });
        self.register(Shortcut {
            key: PhysicalKey::Code(KeyCode::KeyA),
            ctrl: true,
            shift: false,
            action: ShortcutAction::ToggleAutoPlay,
            description: "Toggle Auto-play".to_string(),
        });
        self.register(Shortcut {
            key: PhysicalKey::Code(KeyCode::KeyQ),
            ctrl: true,
            shift: false,
            action: ShortcutAction::Quit,
            description: "Quit".to_string(),
        });
    }

    fn register(&mut self, shortcut: Shortcut) {
        self.shortcuts.push(shortcut);
    }

    /// Process a key event and return the matching action (if any)
    pub fn process_event(&self, event: &KeyEvent, modifiers: ModifiersState) -> Option<ShortcutAction> {
        if event.state != ElementState::Pressed || event.repeat {
            return None;
        }
        self.lookup(event.physical_key, modifiers)
    }

    fn lookup(&self, key: PhysicalKey, modifiers: ModifiersState) -> Option<ShortcutAction> {
        self.shortcuts
            .iter()
            .find(|s| {
                s.key == key && s.ctrl == modifiers.control_key() && s.shift == modifiers.shift_key()
            })
            .map(|s| s.action)
    }

    /// Render a shortcuts help window
    pub fn render_help(&self, ui: &Ui, is_open: &mut bool, voice_active: bool) {
        ui.window("Keyboard Shortcuts")
            .size([360.0, 380.0], Condition::FirstUseEver)
            .position([520.0, 180.0], Condition::FirstUseEver)
            .opened(is_open)
            .build(|| {
                ui.text("Playback");
                for binding in KEY_BINDINGS {
                    ui.text(format!("  {:12} - {}", binding.keys, binding.description));
                }

                ui.separator();
                ui.text("Application");
                for shortcut in &self.shortcuts {
                    let mut shortcut_str = String::new();
                    if shortcut.ctrl {
                        shortcut_str.push_str("Ctrl+");
                    }
                    if shortcut.shift {
                        shortcut_str.push_str("Shift+");
                    }
                    shortcut_str.push_str(&key_to_string(shortcut.key));
                    ui.text(format!("  {:12} - {}", shortcut_str, shortcut.description));
                }

                ui.separator();
                if voice_active {
                    ui.text("Voice");
                } else {
                    ui.text_disabled("Voice (not available)");
                }
                ui.text(format!("  Next:  {}", ADVANCE_PHRASES.join(", ")));
                ui.text(format!("  Back:  {}", RETREAT_PHRASES.join(", ")));
                ui.text(format!("  Reset: {}", RESET_PHRASES.join(", ")));
            });
    }
}

impl Default for ShortcutManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Translate a winit key press into a playback key
///
/// Releases are ignored; auto-repeat is passed through so holding a key keeps stepping.
pub fn translate_key(event: &KeyEvent) -> Option<Key> {
    if event.state != ElementState::Pressed {
        return None;
    }
    Some(map_logical_key(&event.logical_key))
}

pub fn map_logical_key(key: &WinitKey) -> Key {
    match key {
        WinitKey::Named(NamedKey::Space) => Key::Space,
        WinitKey::Named(NamedKey::ArrowRight) => Key::ArrowRight,
        WinitKey::Named(NamedKey::ArrowLeft) => Key::ArrowLeft,
        WinitKey::Character(text) => Key::Character(text.to_string()),
        _ => Key::Other,
    }
}

fn key_to_string(key: PhysicalKey) -> String {
    match key {
        PhysicalKey::Code(code) => match code {
            KeyCode::KeyA => "A".to_string(),
            KeyCode::KeyL => "L".to_string(),
            KeyCode::KeyO => "O".to_string(),
            KeyCode::KeyQ => "Q".to_string(),
            _ => format!("{:?}", code),
        },
        _ => "?".to_string(),
    }
}
