pub mod keyboard;
pub mod voice;

pub use keyboard::{key_command, Key, KeyBinding, KEY_BINDINGS};
pub use voice::{
    phrase_command, ProcessRecognizer, RecognitionEvent, RecognitionResult, ScriptedRecognizer,
    VoiceError, VoiceListener, VoiceRecognizer,
};

/// Abstract playback command, independent of where it came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Advance,
    Retreat,
    Reset,
}

/// Where a raw input came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSource {
    Button,
    Keyboard,
    Voice,
}

/// A raw input event, before normalization
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// A manual control was clicked; carries the control's label
    Button(String),
    /// A key was pressed
    Key(Key),
    /// The speech recognizer reported results
    Voice(RecognitionEvent),
}

impl InputEvent {
    pub fn source(&self) -> InputSource {
        match self {
            InputEvent::Button(_) => InputSource::Button,
            InputEvent::Key(_) => InputSource::Keyboard,
            InputEvent::Voice(_) => InputSource::Voice,
        }
    }
}

/// Optional input capabilities available in this environment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub keyboard: bool,
    pub voice: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            keyboard: true,
            voice: false,
        }
    }
}

/// Translates raw input events into playback commands
///
/// Buttons are always available. Keyboard and voice events are only
/// translated when the corresponding capability is present; otherwise they
/// are dropped without error.
#[derive(Debug, Clone, Default)]
pub struct InputAggregator {
    capabilities: Capabilities,
}

impl InputAggregator {
    pub fn new(capabilities: Capabilities) -> Self {
        Self { capabilities }
    }

    /// Enable or disable voice translation, e.g. once a recognizer is acquired
    pub fn set_voice(&mut self, available: bool) {
        self.capabilities.voice = available;
    }

    /// Normalize one raw event; `None` when it maps to nothing
    pub fn normalize(&self, event: &InputEvent) -> Option<Command> {
        match event {
            InputEvent::Button(label) => button_command(label),
            InputEvent::Key(key) if self.capabilities.keyboard => key_command(key),
            InputEvent::Voice(recognition) if self.capabilities.voice => {
                recognition.final_transcript().and_then(phrase_command)
            }
            _ => None,
        }
    }
}

/// Map a manual control label to a command
pub fn button_command(label: &str) -> Option<Command> {
    let label = label.trim();
    if label.eq_ignore_ascii_case("next") {
        Some(Command::Advance)
    } else if label.eq_ignore_ascii_case("prev") {
        Some(Command::Retreat)
    } else if label.eq_ignore_ascii_case("reset") {
        Some(Command::Reset)
    } else {
        None
    }
}
