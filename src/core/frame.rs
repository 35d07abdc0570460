use crate::core::play::{PlayDefinition, Player, PlayerPair, Point, Step, DEFAULT_STEP_DURATION_MS};
use std::collections::HashMap;
use std::time::Duration;

/// Render-ready snapshot of a single step
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Step index this frame was derived from (after clamping)
    pub index: usize,
    pub label: Option<String>,
    pub duration: Duration,
    pub players: Vec<Player>,
    /// Passes whose endpoints both exist in this step
    pub passes: Vec<ResolvedLink>,
    /// Screens whose endpoints both exist in this step
    pub screens: Vec<ResolvedLink>,
}

impl Frame {
    /// Frame shown for a play without steps
    pub fn empty() -> Self {
        Self {
            index: 0,
            label: None,
            duration: Duration::from_millis(DEFAULT_STEP_DURATION_MS),
            players: Vec::new(),
            passes: Vec::new(),
            screens: Vec::new(),
        }
    }

    pub fn player(&self, id: &str) -> Option<&Player> {
        self.players.iter().rev().find(|p| p.id == id)
    }
}

/// A pass or screen with both endpoints resolved to coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLink {
    pub from_id: String,
    pub to_id: String,
    pub from: Point,
    pub to: Point,
}

/// Where a player was in the previous frame and where it is now
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerMotion {
    pub id: String,
    /// `None` when the player was not on court in the previous frame
    pub from: Option<Point>,
    pub to: Point,
}

/// Derive the frame for `index` of `play`.
///
/// The index is clamped into the play's range, so callers may pass anything.
/// Passes and screens that mention a player missing from the step are dropped.
pub fn derive_frame(play: &PlayDefinition, index: usize) -> Frame {
    if play.is_empty() {
        return Frame::empty();
    }

    let index = index.min(play.last_index());
    let step = &play.steps[index];

    let lookup: HashMap<&str, Point> = step
        .players
        .iter()
        .map(|p| (p.id.as_str(), p.position()))
        .collect();

    Frame {
        index,
        label: step.label.clone(),
        duration: step.duration(),
        players: step.players.clone(),
        passes: resolve_links(&step.passes, &lookup),
        screens: resolve_links(&step.screens, &lookup),
    }
}

fn resolve_links(pairs: &[PlayerPair], lookup: &HashMap<&str, Point>) -> Vec<ResolvedLink> {
    pairs
        .iter()
        .filter_map(|pair| {
            let from = lookup.get(pair.from_id())?;
            let to = lookup.get(pair.to_id())?;
            Some(ResolvedLink {
                from_id: pair.from_id().to_string(),
                to_id: pair.to_id().to_string(),
                from: *from,
                to: *to,
            })
        })
        .collect()
}

/// Pair every player in `next` with its position in `prev`, matched by id
pub fn player_motions(prev: Option<&Frame>, next: &Frame) -> Vec<PlayerMotion> {
    next.players
        .iter()
        .map(|p| PlayerMotion {
            id: p.id.clone(),
            from: prev.and_then(|f| f.player(&p.id)).map(Player::position),
            to: p.position(),
        })
        .collect()
}

/// Count of pass/screen pairs in a step that reference unknown players
pub fn unresolved_links(step: &Step) -> usize {
    step.passes
        .iter()
        .chain(step.screens.iter())
        .filter(|pair| step.player(pair.from_id()).is_none() || step.player(pair.to_id()).is_none())
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_step_play() -> PlayDefinition {
        PlayDefinition::new(
            "Drift",
            vec![
                Step {
                    players: vec![Player::new("A", 10.0, 10.0)],
                    duration_ms: Some(500.0),
                    ..Default::default()
                },
                Step {
                    players: vec![Player::new("A", 50.0, 10.0)],
                    duration_ms: Some(500.0),
                    ..Default::default()
                },
            ],
        )
    }

    #[test]
    fn test_derive_frame_positions() {
        let play = two_step_play();

        let frame = derive_frame(&play, 0);
        assert_eq!(frame.player("A").unwrap().position(), Point::new(10.0, 10.0));

        let frame = derive_frame(&play, 1);
        assert_eq!(frame.player("A").unwrap().position(), Point::new(50.0, 10.0));
        assert_eq!(frame.duration, Duration::from_millis(500));
    }

    #[test]
    fn test_index_is_clamped() {
        let play = two_step_play();
        let frame = derive_frame(&play, 99);
        assert_eq!(frame.index, 1);
        assert_eq!(frame, derive_frame(&play, 1));
    }

    #[test]
    fn test_empty_play_yields_empty_frame() {
        let play = PlayDefinition::new("Nothing", Vec::new());
        assert_eq!(derive_frame(&play, 0), Frame::empty());
        assert_eq!(derive_frame(&play, 7), Frame::empty());
    }

    #[test]
    fn test_unresolved_pass_is_dropped() {
        let play = PlayDefinition::new(
            "Broken pass",
            vec![Step {
                players: vec![Player::new("A", 10.0, 10.0)],
                passes: vec![PlayerPair::new("A", "Z")],
                ..Default::default()
            }],
        );

        let frame = derive_frame(&play, 0);
        assert!(frame.passes.is_empty());
        assert_eq!(unresolved_links(&play.steps[0]), 1);
    }

    #[test]
    fn test_links_resolve_to_coordinates() {
        let play = PlayDefinition::new(
            "Pick and roll",
            vec![Step {
                label: Some("Screen then pass".to_string()),
                duration_ms: None,
                players: vec![Player::new("1", 50.0, 80.0), Player::new("5", 55.0, 72.0)],
                passes: vec![PlayerPair::new("1", "5")],
                screens: vec![PlayerPair::new("5", "1"), PlayerPair::new("5", "X")],
            }],
        );

        let frame = derive_frame(&play, 0);
        assert_eq!(frame.label.as_deref(), Some("Screen then pass"));
        assert_eq!(frame.duration, Duration::from_millis(DEFAULT_STEP_DURATION_MS));
        assert_eq!(frame.passes.len(), 1);
        assert_eq!(frame.passes[0].from, Point::new(50.0, 80.0));
        assert_eq!(frame.passes[0].to, Point::new(55.0, 72.0));
        assert_eq!(frame.screens.len(), 1);
        assert_eq!(frame.screens[0].from_id, "5");
    }

    #[test]
    fn test_derivation_is_idempotent() {
        let play = two_step_play();
        assert_eq!(derive_frame(&play, 1), derive_frame(&play, 1));
    }

    #[test]
    fn test_player_motions_match_by_id() {
        let play = PlayDefinition::new(
            "Swap",
            vec![
                Step {
                    players: vec![Player::new("A", 10.0, 10.0)],
                    ..Default::default()
                },
                Step {
                    players: vec![Player::new("A", 20.0, 30.0), Player::new("B", 5.0, 5.0)],
                    ..Default::default()
                },
            ],
        );
        let first = derive_frame(&play, 0);
        let second = derive_frame(&play, 1);

        let motions = player_motions(Some(&first), &second);
        assert_eq!(motions.len(), 2);
        assert_eq!(motions[0].from, Some(Point::new(10.0, 10.0)));
        assert_eq!(motions[0].to, Point::new(20.0, 30.0));
        assert_eq!(motions[1].from, None);

        let initial = player_motions(None, &first);
        assert_eq!(initial[0].from, None);
    }
}
