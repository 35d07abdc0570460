pub mod play;
pub mod frame;
pub mod video;

pub use play::{PlayDefinition, Player, PlayerPair, Point, Step, DEFAULT_STEP_DURATION_MS};
pub use frame::{derive_frame, player_motions, Frame, PlayerMotion, ResolvedLink};
pub use video::VideoSource;
