use rfd::FileDialog;
use std::path::{Path, PathBuf};

/// File dialog helper for playboard
pub struct FileDialogs;

impl FileDialogs {
    /// Open a file dialog for selecting a play file
    pub fn open_play_file(start_dir: Option<&Path>) -> Option<PathBuf> {
        let mut dialog = FileDialog::new()
            .add_filter("Play Files", &["json"])
            .add_filter("All Files", &["*"])
            .set_title("Open Play");
        if let Some(dir) = start_dir {
            dialog = dialog.set_directory(dir);
        }
        dialog.pick_file()
    }

    /// Open a folder dialog for selecting the play library
    pub fn pick_library_dir(start_dir: Option<&Path>) -> Option<PathBuf> {
        let mut dialog = FileDialog::new().set_title("Open Play Library");
        if let Some(dir) = start_dir {
            dialog = dialog.set_directory(dir);
        }
        dialog.pick_folder()
    }
}
