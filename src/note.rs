//! Notes and the note type table used to classify them.
//!
//! A note's classification is picked once, during assembly, by comparing the set of file
//! extensions it owns against each [`NoteType`]. The matched type's [`NoteBehavior`] then
//! supplies the title, cross reference extraction and rendering for that note.

use crate::{error::ZettelError, lazy_file::LazyFile, theme::RenderContext};
use once_cell::sync::OnceCell;
use serde::Serialize;
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    path::PathBuf,
    sync::Arc,
};

/// Tag reported for notes that match no configured note type.
pub const UNCLASSIFIED: &str = "unclassified";

/// Output of a renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Page {
    /// Structured markup; written with a leading `<!DOCTYPE html>`.
    Html(String),
    /// Written verbatim.
    Text(String),
}

impl Page {
    pub fn into_document(self) -> String {
        match self {
            Page::Html(markup) => format!("<!DOCTYPE html>{markup}"),
            Page::Text(text) => text,
        }
    }
}

/// Per-type behaviour attached to a [`NoteType`].
///
/// Only [`render`](NoteBehavior::render) is required. The defaults give a note its name as title,
/// no cross references and a description derived from its extensions.
pub trait NoteBehavior: Send + Sync {
    /// Short human readable description of the note, e.g. "markdown".
    fn description(&self, _note: &Note) -> Option<String> {
        None
    }

    /// The note's full title, as opposed to its name.
    fn title(&self, note: &Note) -> String {
        note.name().to_string()
    }

    /// Names of other notes this note references. `known` holds every note name in the project.
    ///
    /// Returning a name outside `known` fails the analysis pass.
    fn extract_refs(
        &self,
        _note: &Note,
        _known: &BTreeSet<String>,
    ) -> Result<BTreeSet<String>, ZettelError> {
        Ok(BTreeSet::new())
    }

    fn render(&self, note: &Note, ctx: &RenderContext<'_>) -> Result<Page, ZettelError>;
}

/// A note type descriptor: a tag, the exact extension combination it claims, and its behaviour.
pub struct NoteType {
    tag: String,
    extensions: BTreeSet<String>,
    behavior: Box<dyn NoteBehavior>,
}

impl NoteType {
    pub fn new<B, I, S>(tag: impl Into<String>, extensions: I, behavior: B) -> Self
    where
        B: NoteBehavior + 'static,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        NoteType {
            tag: tag.into(),
            extensions: extensions.into_iter().map(Into::into).collect(),
            behavior: Box::new(behavior),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn extensions(&self) -> &BTreeSet<String> {
        &self.extensions
    }

    pub fn behavior(&self) -> &dyn NoteBehavior {
        self.behavior.as_ref()
    }

    /// Exact set equality; neither a subset nor a superset matches.
    pub fn matches(&self, extensions: &BTreeSet<String>) -> bool {
        self.extensions.symmetric_difference(extensions).next().is_none()
    }
}

impl fmt::Debug for NoteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NoteType")
            .field("tag", &self.tag)
            .field("extensions", &self.extensions)
            .finish_non_exhaustive()
    }
}

/// Ordered table of note types. Lookups return the first matching entry, so overlapping
/// extension combinations resolve to whichever was registered first.
#[derive(Debug, Clone, Default)]
pub struct NoteTypes(Vec<Arc<NoteType>>);

impl NoteTypes {
    pub fn new() -> Self {
        NoteTypes(Vec::new())
    }

    pub fn with(mut self, note_type: NoteType) -> Self {
        self.push(note_type);
        self
    }

    pub fn push(&mut self, note_type: NoteType) {
        if let Some(existing) = self.0.iter().find(|t| t.matches(note_type.extensions())) {
            tracing::warn!(
                "Note type \"{}\" has the same extensions as \"{}\" and will never match",
                note_type.tag(),
                existing.tag()
            );
        }
        self.0.push(Arc::new(note_type));
    }

    pub fn classify(&self, extensions: &BTreeSet<String>) -> Option<Arc<NoteType>> {
        self.0.iter().find(|t| t.matches(extensions)).cloned()
    }

    pub fn get(&self, tag: &str) -> Option<Arc<NoteType>> {
        self.0.iter().find(|t| t.tag() == tag).cloned()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<NoteType>> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<NoteType> for NoteTypes {
    fn from_iter<T: IntoIterator<Item = NoteType>>(iter: T) -> Self {
        let mut types = NoteTypes::new();
        for note_type in iter {
            types.push(note_type);
        }
        types
    }
}

#[derive(Debug, Clone)]
pub enum Classification {
    Typed(Arc<NoteType>),
    Unclassified,
}

impl Classification {
    pub fn tag(&self) -> &str {
        match self {
            Classification::Typed(note_type) => note_type.tag(),
            Classification::Unclassified => UNCLASSIFIED,
        }
    }

    pub fn note_type(&self) -> Option<&NoteType> {
        match self {
            Classification::Typed(note_type) => Some(note_type.as_ref()),
            Classification::Unclassified => None,
        }
    }

    pub fn behavior(&self) -> Option<&dyn NoteBehavior> {
        self.note_type().map(NoteType::behavior)
    }
}

/// Names of the notes referenced by, and referencing, a note; sorted by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NoteRefs {
    pub outgoing: Vec<String>,
    pub incoming: Vec<String>,
}

/// One logical content item, backed by one file per extension.
///
/// Built once per analysis pass and read-only afterwards; the referenced notes are resolved
/// through the owning [`ProjectAnalysis`](crate::analysis::ProjectAnalysis).
pub struct Note {
    name: String,
    dir: Vec<String>,
    files: BTreeMap<String, LazyFile>,
    kind: Classification,
    refs: NoteRefs,
    title: OnceCell<String>,
}

impl Note {
    pub fn new(
        name: impl Into<String>,
        dir: Vec<String>,
        files: BTreeMap<String, LazyFile>,
        kind: Classification,
    ) -> Self {
        Note {
            name: name.into(),
            dir,
            files,
            kind,
            refs: NoteRefs::default(),
            title: OnceCell::new(),
        }
    }

    /// Unique ID of the note. This defines the permalink used to reference it.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Source directory segments relative to the project's source root.
    pub fn dir(&self) -> &[String] {
        &self.dir
    }

    pub fn files(&self) -> &BTreeMap<String, LazyFile> {
        &self.files
    }

    pub fn file(&self, extension: &str) -> Option<&LazyFile> {
        self.files.get(extension)
    }

    /// Content of the note's file with the given extension.
    pub fn content(&self, extension: &str) -> Result<&str, ZettelError> {
        self.file(extension)
            .ok_or_else(|| {
                ZettelError::NotFound(format!(
                    "Note \"{}\" has no .{} file",
                    self.name, extension
                ))
            })?
            .content()
    }

    pub fn extensions(&self) -> BTreeSet<String> {
        self.files.keys().cloned().collect()
    }

    pub fn kind(&self) -> &Classification {
        &self.kind
    }

    pub fn tag(&self) -> &str {
        self.kind.tag()
    }

    pub fn is_classified(&self) -> bool {
        matches!(self.kind, Classification::Typed(_))
    }

    /// Title from the note type, derived once and cached.
    pub fn title(&self) -> &str {
        self.title.get_or_init(|| match self.kind.behavior() {
            Some(behavior) => behavior.title(self),
            None => self.name.clone(),
        })
    }

    pub fn description(&self) -> String {
        self.kind
            .behavior()
            .and_then(|behavior| behavior.description(self))
            .unwrap_or_else(|| self.files.keys().cloned().collect::<Vec<_>>().join(", "))
    }

    pub fn refs(&self) -> &NoteRefs {
        &self.refs
    }

    pub(crate) fn set_refs(&mut self, refs: NoteRefs) {
        self.refs = refs;
    }

    pub fn extract_refs(&self, known: &BTreeSet<String>) -> Result<BTreeSet<String>, ZettelError> {
        match self.kind.behavior() {
            Some(behavior) => behavior.extract_refs(self, known),
            None => Ok(BTreeSet::new()),
        }
    }

    /// Serializable view of the note, used by diagnostic pages.
    pub fn summary(&self) -> NoteSummary {
        NoteSummary {
            name: self.name.clone(),
            title: self.title().to_string(),
            dir: self.dir.clone(),
            classification: self.tag().to_string(),
            files: self
                .files
                .iter()
                .map(|(ext, file)| (ext.clone(), file.path().to_path_buf()))
                .collect(),
            refs: self.refs.clone(),
        }
    }
}

impl fmt::Debug for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Note")
            .field("name", &self.name)
            .field("dir", &self.dir)
            .field("classification", &self.tag())
            .field("files", &self.files)
            .field("refs", &self.refs)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoteSummary {
    pub name: String,
    pub title: String,
    pub dir: Vec<String>,
    pub classification: String,
    pub files: BTreeMap<String, PathBuf>,
    pub refs: NoteRefs,
}
