//! Duplicate suppression for file selections.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

/// Identity of a selected file: two files with the same name, size and
/// modification time are treated as the same file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SelectionKey {
    pub name: String,
    pub size: u64,
    /// Milliseconds since the Unix epoch.
    pub last_modified: u64,
}

pub trait Selectable {
    fn selection_key(&self) -> SelectionKey;
}

impl Selectable for SelectionKey {
    fn selection_key(&self) -> SelectionKey {
        self.clone()
    }
}

/// A file found on disk, keyed by its file name and filesystem metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub path: PathBuf,
    key: SelectionKey,
}

impl SelectedFile {
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let metadata = fs::metadata(path)?;
        let last_modified = metadata
            .modified()
            .ok()
            .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
            .map(|duration| duration.as_millis() as u64)
            .unwrap_or(0);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Self {
            path: path.to_path_buf(),
            key: SelectionKey {
                name,
                size: metadata.len(),
                last_modified,
            },
        })
    }
}

impl Selectable for SelectedFile {
    fn selection_key(&self) -> SelectionKey {
        self.key.clone()
    }
}

/// Appends `incoming` to `existing`, skipping anything whose key is already
/// selected (including duplicates within `incoming`). Returns the merged
/// selection and how many items were skipped.
pub fn dedup_selection<T: Selectable>(existing: Vec<T>, incoming: Vec<T>) -> (Vec<T>, usize) {
    let mut seen: HashSet<SelectionKey> = existing.iter().map(Selectable::selection_key).collect();
    let mut merged = existing;
    let mut skipped = 0;

    for item in incoming {
        if seen.insert(item.selection_key()) {
            merged.push(item);
        } else {
            skipped += 1;
        }
    }
    (merged, skipped)
}
