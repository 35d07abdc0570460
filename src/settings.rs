use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

const APP_DIR: &str = "playboard";

/// Persistent viewer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerSettings {
    pub show_court: bool,
    pub show_controls: bool,
    pub show_library: bool,
    pub show_play_info: bool,
    pub show_shortcuts: bool,
    /// Whether the keyboard drives playback
    pub keyboard_enabled: bool,
    /// Speech recognizer command line; empty disables voice control
    pub voice_command: Vec<String>,
    pub library_dir: Option<PathBuf>,
    pub last_play: Option<PathBuf>,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            show_court: true,
            show_controls: true,
            show_library: true,
            show_play_info: false,
            show_shortcuts: false,
            keyboard_enabled: true,
            voice_command: Vec::new(),
            library_dir: None,
            last_play: None,
        }
    }
}

impl ViewerSettings {
    /// Directory holding settings and the window layout
    pub fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join(APP_DIR))
    }

    pub fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("settings.json"))
    }

    /// Load from the user config dir, falling back to defaults
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Ignoring settings: {:#}", e);
                Self::default()
            }
        }
    }

    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings: {:?}", path))?;
        serde_json::from_str(&contents).with_context(|| format!("Failed to parse settings: {:?}", path))
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path().context("No config directory")?;
        self.save_to(path)
    }

    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config dir: {:?}", parent))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("Failed to write settings: {:?}", path))
    }
}
