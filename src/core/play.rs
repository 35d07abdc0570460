use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Time a step stays on screen when the play data does not say otherwise
pub const DEFAULT_STEP_DURATION_MS: u64 = 1000;

/// Court width in court units
pub const COURT_WIDTH: f32 = 100.0;

/// Court height in court units
pub const COURT_HEIGHT: f32 = 94.0;

/// A basketball play: a titled, ordered sequence of formations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayDefinition {
    /// Display title
    pub title: String,

    /// Free-form tags used by the library filter
    #[serde(default)]
    pub tags: Vec<String>,

    /// Optional link to a video of the play
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<String>,

    /// Steps in playback order
    pub steps: Vec<Step>,
}

impl PlayDefinition {
    pub fn new(title: &str, steps: Vec<Step>) -> Self {
        Self {
            title: title.to_string(),
            tags: Vec::new(),
            video: None,
            steps,
        }
    }

    /// Number of steps in the play
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Highest valid step index (0 for an empty play)
    pub fn last_index(&self) -> usize {
        self.steps.len().saturating_sub(1)
    }

    /// Display duration of the step at `index`, default when the index is out of range
    pub fn step_duration(&self, index: usize) -> Duration {
        self.steps
            .get(index)
            .map(Step::duration)
            .unwrap_or(Duration::from_millis(DEFAULT_STEP_DURATION_MS))
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }
}

/// One formation within a play
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    /// Caption shown while this step is current
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Milliseconds before auto-play moves on; any JSON number is accepted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<f64>,

    pub players: Vec<Player>,

    #[serde(default)]
    pub passes: Vec<PlayerPair>,

    #[serde(default)]
    pub screens: Vec<PlayerPair>,
}

impl Step {
    /// Effective duration. Absent, non-positive or non-finite values fall
    /// back to the default; fractions are rounded to whole milliseconds.
    pub fn duration(&self) -> Duration {
        let ms = match self.duration_ms {
            Some(ms) if ms.is_finite() && ms > 0.0 => ms.round().max(1.0) as u64,
            _ => DEFAULT_STEP_DURATION_MS,
        };
        Duration::from_millis(ms)
    }

    /// Look up a player by id; a later duplicate shadows an earlier one
    pub fn player(&self, id: &str) -> Option<&Player> {
        self.players.iter().rev().find(|p| p.id == id)
    }
}

/// A player dot within a single step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    pub x: f32,
    pub y: f32,
}

impl Player {
    pub fn new(id: &str, x: f32, y: f32) -> Self {
        Self {
            id: id.to_string(),
            role: None,
            x,
            y,
        }
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// A `[from, to]` pair of player ids, used for passes and screens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerPair(pub String, pub String);

impl PlayerPair {
    pub fn new(from: &str, to: &str) -> Self {
        Self(from.to_string(), to.to_string())
    }

    pub fn from_id(&self) -> &str {
        &self.0
    }

    pub fn to_id(&self) -> &str {
        &self.1
    }
}

/// A position in court coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: Point) -> f32 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}
