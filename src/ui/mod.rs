pub mod controls;
pub mod court;
pub mod dialogs;
pub mod library;
pub mod play_info;
pub mod shortcuts;
pub mod status;

pub use controls::ControlsWindow;
pub use court::CourtView;
pub use dialogs::FileDialogs;
pub use library::{LibraryAction, LibraryWindow};
pub use play_info::render_play_info;
pub use shortcuts::{translate_key, ShortcutAction, ShortcutManager};
pub use status::StatusLine;
