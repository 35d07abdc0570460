use crate::content::PlayError;
use crate::core::frame::unresolved_links;
use crate::core::PlayDefinition;
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Parse a play from JSON text
///
/// Expected shape (camelCase keys):
/// - `title`: string
/// - `tags`: optional list of strings
/// - `video`: optional string
/// - `steps`: list of `{ label?, durationMs?, players, passes?, screens? }`
///
/// A document whose `steps` is missing or not a list is rejected with
/// [`PlayError::InvalidPlayData`]. Dangling pass/screen references are kept;
/// they are dropped later when frames are derived.
pub fn parse_play(text: &str) -> Result<PlayDefinition, PlayError> {
    let value: Value = serde_json::from_str(text)?;

    let root = value
        .as_object()
        .ok_or_else(|| PlayError::InvalidPlayData("play must be an object".to_string()))?;

    match root.get("steps") {
        Some(Value::Array(_)) => {}
        Some(other) => {
            return Err(PlayError::InvalidPlayData(format!(
                "steps must be a list, found {}",
                json_kind(other)
            )));
        }
        None => return Err(PlayError::InvalidPlayData("missing steps".to_string())),
    }

    let play: PlayDefinition = serde_json::from_value(value)?;
    check_steps(&play);

    debug!("Parsed play '{}' with {} steps", play.title, play.step_count());
    Ok(play)
}

/// Log suspicious but tolerated content
fn check_steps(play: &PlayDefinition) {
    for (index, step) in play.steps.iter().enumerate() {
        let mut seen = HashSet::new();
        for player in &step.players {
            if !seen.insert(player.id.as_str()) {
                warn!("Play '{}' step {}: duplicate player id '{}'", play.title, index + 1, player.id);
            }
        }

        let dangling = unresolved_links(step);
        if dangling > 0 {
            debug!(
                "Play '{}' step {}: {} pass/screen pairs reference missing players",
                play.title,
                index + 1,
                dangling
            );
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
