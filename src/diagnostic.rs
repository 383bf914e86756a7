//! Non-fatal findings produced while assembling notes.
//!
//! Fatal conditions are [`ZettelError`](crate::ZettelError)s and abort the analysis pass. The
//! conditions here are reported through `tracing` when detected and kept on the
//! [`ProjectAnalysis`](crate::analysis::ProjectAnalysis) so callers can inspect them afterwards.

use serde::Serialize;
use std::{fmt, path::PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum AnalysisDiagnostic {
    /// The same identifier was found under two directories. The first directory stays
    /// authoritative; the offending file is still attached to that note.
    RepeatedName {
        name: String,
        /// Directory segments of the first occurrence.
        dir: Vec<String>,
        /// Directory segments of the conflicting occurrence.
        other_dir: Vec<String>,
        /// The conflicting file followed by the files already attached to the note.
        paths: Vec<PathBuf>,
    },
    /// No configured note type matches the note's extension set.
    Unclassified {
        name: String,
        extensions: Vec<String>,
    },
}

impl AnalysisDiagnostic {
    pub fn note_name(&self) -> &str {
        match self {
            AnalysisDiagnostic::RepeatedName { name, .. } => name,
            AnalysisDiagnostic::Unclassified { name, .. } => name,
        }
    }

    pub fn is_repeated_name(&self) -> bool {
        matches!(self, AnalysisDiagnostic::RepeatedName { .. })
    }

    pub fn is_unclassified(&self) -> bool {
        matches!(self, AnalysisDiagnostic::Unclassified { .. })
    }

    /// Emit the diagnostic as a tracing warning.
    pub(crate) fn log(&self) {
        match self {
            AnalysisDiagnostic::RepeatedName { name, paths, .. } => {
                tracing::warn!("┌ Repeated name \"{}\" occurs in different directories:", name);
                for path in paths {
                    tracing::warn!("├╴ {}", path.display());
                }
                tracing::warn!("└ Multi-file notes are expected to be in the same directory.");
            }
            AnalysisDiagnostic::Unclassified { .. } => tracing::warn!("{}", self),
        }
    }
}

impl fmt::Display for AnalysisDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisDiagnostic::RepeatedName {
                name,
                dir,
                other_dir,
                ..
            } => write!(
                f,
                "Repeated name \"{}\" in different directories: kept \"{}\", found again in \"{}\"",
                name,
                dir.join("/"),
                other_dir.join("/")
            ),
            AnalysisDiagnostic::Unclassified { name, extensions } => write!(
                f,
                "Unknown type of note \"{}\" with extensions: {}",
                name,
                extensions.join(", ")
            ),
        }
    }
}
