use crate::{
    assemble::{assemble_notes, Assembly},
    crossref::CrossRefs,
    diagnostic::AnalysisDiagnostic,
    discover::find_note_files,
    error::ZettelError,
    folder::NoteFolder,
    note::{Note, NoteTypes},
};
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    sync::Arc,
};

/// Notes, files and references found in a project by one analysis pass.
///
/// A snapshot is never modified after construction; a rebuild produces a new one.
#[derive(Debug, Default)]
pub struct ProjectAnalysis {
    /// Note files discovered below the source directory.
    pub files: Vec<PathBuf>,
    /// Notes by name.
    pub notes: BTreeMap<String, Arc<Note>>,
    /// Notes by the folder they were found in.
    pub tree: NoteFolder,
    /// Directed graph of cross references between notes.
    pub refs: CrossRefs,
    /// Non-fatal findings, in the order they were made.
    pub diagnostics: Vec<AnalysisDiagnostic>,
}

impl ProjectAnalysis {
    pub fn note(&self, name: &str) -> Option<&Arc<Note>> {
        self.notes.get(name)
    }

    /// Notes referenced by `note`, sorted by name.
    pub fn outgoing(&self, note: &Note) -> Vec<&Arc<Note>> {
        self.lookup(&note.refs().outgoing)
    }

    /// Notes referencing `note`, sorted by name.
    pub fn incoming(&self, note: &Note) -> Vec<&Arc<Note>> {
        self.lookup(&note.refs().incoming)
    }

    fn lookup(&self, names: &[String]) -> Vec<&Arc<Note>> {
        names.iter().filter_map(|name| self.notes.get(name)).collect()
    }
}

/// Discover, assemble, cross reference and arrange the notes below `src_dir`.
#[tracing::instrument(skip(note_types))]
pub fn analyse(src_dir: &Path, note_types: &NoteTypes) -> Result<ProjectAnalysis, ZettelError> {
    let files = find_note_files(src_dir)?;
    analyse_files(files, src_dir, note_types)
}

/// Analyse an already discovered list of note files.
pub fn analyse_files(
    files: Vec<PathBuf>,
    src_dir: &Path,
    note_types: &NoteTypes,
) -> Result<ProjectAnalysis, ZettelError> {
    let Assembly {
        mut notes,
        diagnostics,
    } = assemble_notes(&files, src_dir, note_types);

    let refs = CrossRefs::resolve(&notes)?;
    refs.attach(&mut notes);

    let notes = notes
        .into_iter()
        .map(|(name, note)| (name, Arc::new(note)))
        .collect::<BTreeMap<String, Arc<Note>>>();
    let tree = NoteFolder::from_notes(notes.values());

    tracing::debug!(
        "Analysed {} files: {} notes, {} cross references, {} diagnostics",
        files.len(),
        notes.len(),
        refs.edge_count(),
        diagnostics.len()
    );

    Ok(ProjectAnalysis {
        files,
        notes,
        tree,
        refs,
        diagnostics,
    })
}
