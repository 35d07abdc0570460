pub mod json;
pub mod library;

pub use json::parse_play;
pub use library::{LibraryEntry, PlayLibrary};

use crate::core::PlayDefinition;
use std::path::Path;
use thiserror::Error;

/// Errors produced while turning a play file into a [`PlayDefinition`]
#[derive(Debug, Error)]
pub enum PlayError {
    /// The document parsed, but `steps` is missing or not an ordered list
    #[error("Invalid play data: {0}")]
    InvalidPlayData(String),

    #[error("Malformed play document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to read play file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unknown play file format")]
    UnknownFormat,
}

/// Play file format detection result
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlayFormat {
    Json,
    Unknown,
}

/// Detect the format of a play file from its contents
pub fn detect_format(data: &[u8]) -> PlayFormat {
    let first = data.iter().find(|b| !b.is_ascii_whitespace());
    match first {
        Some(b'{') => PlayFormat::Json,
        _ => PlayFormat::Unknown,
    }
}

/// Load a play from a file, auto-detecting format
pub fn load_play<P: AsRef<Path>>(path: P) -> Result<PlayDefinition, PlayError> {
    let data = std::fs::read(path.as_ref())?;

    match detect_format(&data) {
        PlayFormat::Json => {
            let text = String::from_utf8_lossy(&data);
            parse_play(&text)
        }
        PlayFormat::Unknown => Err(PlayError::UnknownFormat),
    }
}
