use crate::controls::Command;

/// Platform-neutral key identity, as delivered by the windowing layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Space,
    ArrowRight,
    ArrowLeft,
    /// A key that produced text, e.g. `"r"` or `"R"`
    Character(String),
    Other,
}

/// A documented key binding, shown in the shortcuts window
#[derive(Debug, Clone, Copy)]
pub struct KeyBinding {
    pub keys: &'static str,
    pub command: Command,
    pub description: &'static str,
}

/// Bindings in display order
pub const KEY_BINDINGS: &[KeyBinding] = &[
    KeyBinding {
        keys: "Space / →",
        command: Command::Advance,
        description: "Next step",
    },
    KeyBinding {
        keys: "←",
        command: Command::Retreat,
        description: "Previous step",
    },
    KeyBinding {
        keys: "R",
        command: Command::Reset,
        description: "Back to the first step, stop auto-play",
    },
];

/// Map a pressed key to a playback command
pub fn key_command(key: &Key) -> Option<Command> {
    match key {
        Key::Space | Key::ArrowRight => Some(Command::Advance),
        Key::ArrowLeft => Some(Command::Retreat),
        Key::Character(text) => match text.as_str() {
            " " => Some(Command::Advance),
            t if t.eq_ignore_ascii_case("r") => Some(Command::Reset),
            _ => None,
        },
        Key::Other => None,
    }
}
