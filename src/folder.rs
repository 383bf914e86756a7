use crate::note::Note;
use std::{collections::BTreeMap, sync::Arc};

/// Notes arranged by the source directory they were found in.
///
/// This is a pure function of the note collection, used for tables of contents. Both maps are
/// keyed in lexicographic order, so renderers can walk them directly.
#[derive(Debug, Clone, Default)]
pub struct NoteFolder {
    notes: BTreeMap<String, Arc<Note>>,
    subfolders: BTreeMap<String, NoteFolder>,
}

impl NoteFolder {
    pub fn from_notes<'a>(notes: impl IntoIterator<Item = &'a Arc<Note>>) -> Self {
        let mut tree = NoteFolder::default();
        for note in notes {
            tree.insert(note.clone());
        }
        tree
    }

    /// Place `note` in the folder named by its directory segments, creating folders as needed.
    pub fn insert(&mut self, note: Arc<Note>) {
        let mut folder = self;
        for segment in note.dir() {
            folder = folder.subfolders.entry(segment.clone()).or_default();
        }
        folder.notes.insert(note.name().to_string(), note);
    }

    pub fn notes(&self) -> &BTreeMap<String, Arc<Note>> {
        &self.notes
    }

    pub fn subfolders(&self) -> &BTreeMap<String, NoteFolder> {
        &self.subfolders
    }

    /// Folder at the given path of segments below this one.
    pub fn folder<S: AsRef<str>>(&self, segments: &[S]) -> Option<&NoteFolder> {
        let mut folder = self;
        for segment in segments {
            folder = folder.subfolders.get(segment.as_ref())?;
        }
        Some(folder)
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty() && self.subfolders.is_empty()
    }

    /// Number of notes in this folder and all folders below it.
    pub fn note_count(&self) -> usize {
        self.notes.len()
            + self
                .subfolders
                .values()
                .map(NoteFolder::note_count)
                .sum::<usize>()
    }
}
