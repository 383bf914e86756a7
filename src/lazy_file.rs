use crate::error::ZettelError;
use once_cell::sync::OnceCell;
use std::{
    fmt,
    fs::read_to_string,
    path::{Path, PathBuf},
};

/// A text file whose content is read on first access and kept for the rest of the process.
///
/// The cell is either unread or holds the content from its single successful read; later calls
/// never touch the filesystem again, so every caller observes the same text. A failed read
/// leaves the cell unread.
pub struct LazyFile {
    path: PathBuf,
    content: OnceCell<String>,
}

impl LazyFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        LazyFile {
            path: path.into(),
            content: OnceCell::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Full content of the text file.
    pub fn content(&self) -> Result<&str, ZettelError> {
        self.content
            .get_or_try_init(|| {
                tracing::debug!("Reading {:?}", self.path);
                read_to_string(&self.path).map_err(|e| {
                    ZettelError::Io(format!("Failed to read {}: {e}", self.path.display()))
                })
            })
            .map(String::as_str)
    }

    pub fn is_read(&self) -> bool {
        self.content.get().is_some()
    }
}

impl fmt::Debug for LazyFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyFile")
            .field("path", &self.path)
            .field("read", &self.is_read())
            .finish()
    }
}
