//! Page rendering collaborators.
//!
//! A [`Theme`] supplies the table of note types (each carrying its own renderer) and renders the
//! index page. The build only writes what the theme returns; markup is opaque to it.
//!
//! ## Built-in Themes
//!
//! - [`minimal::Minimal`] - markdown, plain text, external URL and Typst PDF notes with a
//!   folder-by-folder index

use crate::{
    analysis::ProjectAnalysis,
    error::ZettelError,
    folder::NoteFolder,
    note::{Note, NoteTypes, Page},
};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use std::{path::Path, sync::Arc};

pub mod minimal;

/// Bytes escaped when a note name becomes one URL path segment. Non-ASCII is always escaped.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Percent-encode `name` for use as a single URL path segment.
pub fn encode_segment(name: &str) -> String {
    utf8_percent_encode(name, PATH_SEGMENT).to_string()
}

/// Site URL of the page for the note called `name`.
pub fn page_href(url_root: &str, name: &str) -> String {
    format!("{url_root}{}.html", encode_segment(name))
}

pub trait Theme: Send + Sync {
    /// Note types used to classify and render notes. Queried once per [`Project`](crate::project::Project).
    fn note_types(&self) -> NoteTypes;

    fn render_index(&self, ctx: &RenderContext<'_>) -> Result<Page, ZettelError>;

    /// Renderer for notes that matched no note type.
    fn render_unclassified(
        &self,
        note: &Note,
        _ctx: &RenderContext<'_>,
    ) -> Result<Page, ZettelError> {
        default_note_page(note)
    }
}

/// What a renderer may look at while producing a page.
#[derive(Clone, Copy)]
pub struct RenderContext<'a> {
    analysis: &'a ProjectAnalysis,
    build_dir: &'a Path,
    url_root: &'a str,
}

impl<'a> RenderContext<'a> {
    pub fn new(analysis: &'a ProjectAnalysis, build_dir: &'a Path, url_root: &'a str) -> Self {
        RenderContext {
            analysis,
            build_dir,
            url_root,
        }
    }

    pub fn analysis(&self) -> &'a ProjectAnalysis {
        self.analysis
    }

    pub fn tree(&self) -> &'a NoteFolder {
        &self.analysis.tree
    }

    /// Output directory of the build in progress.
    pub fn build_dir(&self) -> &'a Path {
        self.build_dir
    }

    pub fn url_root(&self) -> &'a str {
        self.url_root
    }

    pub fn note(&self, name: &str) -> Option<&'a Arc<Note>> {
        self.analysis.notes.get(name)
    }

    /// Notes referenced by `note`, sorted by name.
    pub fn outgoing(&self, note: &Note) -> Vec<&'a Arc<Note>> {
        self.analysis.outgoing(note)
    }

    /// Notes referencing `note`, sorted by name.
    pub fn incoming(&self, note: &Note) -> Vec<&'a Arc<Note>> {
        self.analysis.incoming(note)
    }

    /// Site URL of a note's page.
    pub fn href(&self, note: &Note) -> String {
        page_href(self.url_root, note.name())
    }
}

/// Page used when no renderer is available for a note: a dump of what was detected about it.
pub fn default_note_page(note: &Note) -> Result<Page, ZettelError> {
    tracing::warn!(
        "Default renderer used for {} note \"{}\"",
        note.description(),
        note.name()
    );
    let dump = serde_json::to_string_pretty(&note.summary())?;
    Ok(Page::Html(format!(
        "<main>This page was generated by the default note renderer.<pre>{}</pre></main>",
        escape_html(&dump)
    )))
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
