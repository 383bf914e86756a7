//! Discovery of note files below a source directory.
//!
//! A note file is named `<identifier>.note.<extension>`. Several files sharing an identifier make
//! up one note; see [`assemble`](crate::assemble).

use crate::error::ZettelError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

static NOTE_FILE_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<name>.+)\.note\.(?P<ext>\w+)$").expect("note file pattern is valid")
});

/// The two halves of a note file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteFileName {
    pub name: String,
    pub extension: String,
}

impl NoteFileName {
    /// Split a bare file name. Returns `None` if it doesn't follow the naming convention,
    /// including identifiers that themselves contain `.note`.
    pub fn parse(file_name: &str) -> Option<NoteFileName> {
        let captures = NOTE_FILE_NAME.captures(file_name)?;
        let name = &captures["name"];
        if name.contains(".note") {
            tracing::debug!("Ignoring {file_name:?}: identifier contains \".note\"");
            return None;
        }
        Some(NoteFileName {
            name: name.to_string(),
            extension: captures["ext"].to_string(),
        })
    }

    pub fn from_path(path: &Path) -> Option<NoteFileName> {
        path.file_name()
            .and_then(|name| name.to_str())
            .and_then(NoteFileName::parse)
    }
}

/// Walk `root` and yield every note file at any depth, in file name order per directory.
///
/// The sequence is lazy: directories are read as the iterator advances. Calling this again walks
/// the tree afresh. Entries that can't be read are logged and skipped.
pub fn note_files(root: &Path) -> Result<impl Iterator<Item = PathBuf>, ZettelError> {
    if !root.exists() {
        return Err(ZettelError::PathNotFound(root.display().to_string()));
    }
    Ok(WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("Skipping unreadable entry while discovering notes: {e}");
                None
            }
        })
        .filter(|entry| !entry.file_type().is_dir())
        .map(|entry| entry.into_path())
        .filter(|path| NoteFileName::from_path(path).is_some()))
}

/// Collect [`note_files`] into a list.
pub fn find_note_files(root: &Path) -> Result<Vec<PathBuf>, ZettelError> {
    let files = note_files(root)?.collect::<Vec<PathBuf>>();
    tracing::debug!("Found {} note files in {:?}", files.len(), root);
    Ok(files)
}
