use crate::content::load_play;
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// A play file found in the library directory
#[derive(Debug, Clone)]
pub struct LibraryEntry {
    pub path: PathBuf,
    /// Play title, or the file stem when the file failed to load
    pub title: String,
    pub tags: Vec<String>,
    pub step_count: usize,
    pub modified: Option<DateTime<Local>>,
    /// Load error, if the file could not be parsed
    pub error: Option<String>,
}

impl LibraryEntry {
    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }
}

/// Directory of play files
#[derive(Debug, Default)]
pub struct PlayLibrary {
    root: Option<PathBuf>,
    entries: Vec<LibraryEntry>,
}

impl PlayLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan `dir` for `*.json` play files, replacing the current entries
    pub fn scan<P: AsRef<Path>>(&mut self, dir: P) -> Result<usize> {
        let dir = dir.as_ref();
        let read_dir = std::fs::read_dir(dir)
            .with_context(|| format!("Failed to read play library: {:?}", dir))?;

        let mut entries = Vec::new();
        for item in read_dir {
            let item = item.context("Failed to read library entry")?;
            let path = item.path();
            if !is_play_file(&path) {
                continue;
            }

            let modified = item
                .metadata()
                .and_then(|m| m.modified())
                .ok()
                .map(DateTime::<Local>::from);

            let entry = match load_play(&path) {
                Ok(play) => LibraryEntry {
                    path,
                    title: play.title.clone(),
                    tags: play.tags.clone(),
                    step_count: play.step_count(),
                    modified,
                    error: None,
                },
                Err(e) => {
                    warn!("Skipping play {:?}: {}", path, e);
                    LibraryEntry {
                        title: file_stem(&path),
                        path,
                        tags: Vec::new(),
                        step_count: 0,
                        modified,
                        error: Some(e.to_string()),
                    }
                }
            };
            entries.push(entry);
        }

        entries.sort_by(|a, b| a.title.to_lowercase().cmp(&b.title.to_lowercase()));
        info!("Play library {:?}: {} plays", dir, entries.len());

        self.root = Some(dir.to_path_buf());
        self.entries = entries;
        Ok(self.entries.len())
    }

    /// Re-scan the last scanned directory
    pub fn refresh(&mut self) -> Result<usize> {
        match self.root.clone() {
            Some(root) => self.scan(root),
            None => Ok(0),
        }
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn entries(&self) -> &[LibraryEntry] {
        &self.entries
    }

    /// All tags used by valid entries, sorted and de-duplicated
    pub fn tags(&self) -> Vec<String> {
        self.entries
            .iter()
            .flat_map(|e| e.tags.iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Entries carrying `tag` (if given) whose title contains `query`, case-insensitive
    pub fn filter(&self, tag: Option<&str>, query: &str) -> Vec<&LibraryEntry> {
        let query = query.trim().to_lowercase();
        self.entries
            .iter()
            .filter(|e| match tag {
                Some(tag) => e.tags.iter().any(|t| t.eq_ignore_ascii_case(tag)),
                None => true,
            })
            .filter(|e| query.is_empty() || e.title.to_lowercase().contains(&query))
            .collect()
    }
}

fn is_play_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_play(dir: &Path, name: &str, title: &str, tags: &[&str]) {
        let play = serde_json::json!({
            "title": title,
            "tags": tags,
            "steps": [{ "players": [{ "id": "1", "x": 50, "y": 80 }] }],
        });
        std::fs::write(dir.join(name), play.to_string()).unwrap();
    }

    #[test]
    fn test_scan_and_filter() {
        let dir = tempfile::tempdir().unwrap();
        write_play(dir.path(), "horns.json", "Horns Flare", &["half-court"]);
        write_play(dir.path(), "press.json", "2-2-1 Press", &["defense", "full-court"]);
        std::fs::write(dir.path().join("notes.txt"), "not a play").unwrap();
        std::fs::write(dir.path().join("broken.json"), r#"{"title": "Broken", "steps": 3}"#).unwrap();

        let mut library = PlayLibrary::new();
        let count = library.scan(dir.path()).unwrap();
        assert_eq!(count, 3);

        // Sorted by title, broken file listed under its stem
        let titles: Vec<&str> = library.entries().iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["2-2-1 Press", "broken", "Horns Flare"]);
        assert!(!library.entries()[1].is_valid());

        assert_eq!(library.tags(), vec!["defense", "full-court", "half-court"]);
        assert_eq!(library.filter(Some("DEFENSE"), "").len(), 1);
        assert_eq!(library.filter(None, "horns")[0].title, "Horns Flare");
        assert!(library.filter(Some("half-court"), "press").is_empty());
    }

    #[test]
    fn test_refresh_picks_up_new_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut library = PlayLibrary::new();
        assert_eq!(library.refresh().unwrap(), 0);

        library.scan(dir.path()).unwrap();
        assert!(library.entries().is_empty());

        write_play(dir.path(), "zone.json", "Zone Attack", &[]);
        assert_eq!(library.refresh().unwrap(), 1);
        assert_eq!(library.root(), Some(dir.path()));
    }

    #[test]
    fn test_scan_missing_directory() {
        let mut library = PlayLibrary::new();
        assert!(library.scan("/no/such/library").is_err());
    }
}
