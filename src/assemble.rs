use crate::{
    diagnostic::AnalysisDiagnostic,
    discover::NoteFileName,
    lazy_file::LazyFile,
    note::{Classification, Note, NoteTypes},
};
use std::{
    collections::BTreeMap,
    path::{Component, Path, PathBuf},
};

/// Notes grouped from a list of note files, with the non-fatal findings made on the way.
#[derive(Debug, Default)]
pub struct Assembly {
    pub notes: BTreeMap<String, Note>,
    pub diagnostics: Vec<AnalysisDiagnostic>,
}

struct NoteShell {
    dir: Vec<String>,
    files: BTreeMap<String, LazyFile>,
}

/// Group note files by identifier and classify each group against `note_types`.
///
/// The first directory seen for an identifier is kept. A later file with the same identifier in
/// another directory is still attached to that note, and reported as
/// [`AnalysisDiagnostic::RepeatedName`]. A second file with an extension the note already has
/// replaces the first.
pub fn assemble_notes<P: AsRef<Path>>(
    paths: &[P],
    root: &Path,
    note_types: &NoteTypes,
) -> Assembly {
    let mut shells = BTreeMap::<String, NoteShell>::new();
    let mut diagnostics = Vec::new();

    for path in paths {
        let path: &Path = path.as_ref();
        let Some(NoteFileName { name, extension }) = NoteFileName::from_path(path) else {
            tracing::debug!("Skipping {:?}: not a note file", path);
            continue;
        };
        let dir = dir_segments(root, path);

        let shell = shells.entry(name.clone()).or_insert_with(|| NoteShell {
            dir: dir.clone(),
            files: BTreeMap::new(),
        });

        if shell.dir != dir {
            let diagnostic = AnalysisDiagnostic::RepeatedName {
                name: name.clone(),
                dir: shell.dir.clone(),
                other_dir: dir,
                paths: std::iter::once(path.to_path_buf())
                    .chain(shell.files.values().map(|f| f.path().to_path_buf()))
                    .collect(),
            };
            diagnostic.log();
            diagnostics.push(diagnostic);
        }

        if let Some(previous) = shell
            .files
            .insert(extension.clone(), LazyFile::new(path))
        {
            tracing::debug!(
                "Note \"{}\": {:?} replaces {:?} for extension {}",
                name,
                path,
                previous.path(),
                extension
            );
        }
    }

    let mut notes = BTreeMap::new();
    for (name, shell) in shells {
        let extensions = shell.files.keys().cloned().collect();
        let kind = match note_types.classify(&extensions) {
            Some(note_type) => Classification::Typed(note_type),
            None => {
                let diagnostic = AnalysisDiagnostic::Unclassified {
                    name: name.clone(),
                    extensions: extensions.into_iter().collect(),
                };
                diagnostic.log();
                diagnostics.push(diagnostic);
                Classification::Unclassified
            }
        };
        let note = Note::new(name.clone(), shell.dir, shell.files, kind);
        notes.insert(name, note);
    }

    tracing::debug!(
        "Assembled {} notes from {} files",
        notes.len(),
        paths.len()
    );
    Assembly { notes, diagnostics }
}

/// Directory of `path` relative to `root`, as ordered path segments.
fn dir_segments(root: &Path, path: &Path) -> Vec<String> {
    let parent = path.parent().unwrap_or(Path::new(""));
    let relative = match parent.strip_prefix(root) {
        Ok(relative) => relative.to_path_buf(),
        Err(_) => {
            tracing::warn!(
                "Note file {:?} is outside the source directory {:?}",
                path,
                root
            );
            PathBuf::from(parent)
        }
    };
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(segment) => Some(segment.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect()
}
