//! Shared test utilities for integration tests.
//!
//! Import from integration test files as:
//! ```ignore
//! mod common;
//! ```

use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
    sync::Arc,
};
use zettelbuilder::{
    config::ProjectConfig,
    note::{Note, NoteBehavior, NoteType, NoteTypes, Page},
    project::Project,
    theme::{RenderContext, Theme},
    ZettelError,
};

/// Initialize tracing for tests, respecting RUST_LOG env var.
///
/// Safe to call multiple times; subsequent calls are no-ops.
#[allow(dead_code)]
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

/// Write `files` (relative path, content) below `root`, creating directories as needed.
#[allow(dead_code)]
pub fn write_tree(root: &Path, files: &[(&str, &str)]) {
    for (path, content) in files {
        let path = root.join(path);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }
}

/// Every file below `root`, relative to it, with its content.
#[allow(dead_code)]
pub fn read_tree(root: &Path) -> Vec<(PathBuf, Vec<u8>)> {
    walkdir::WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            (
                e.path().strip_prefix(root).unwrap().to_path_buf(),
                std::fs::read(e.path()).unwrap(),
            )
        })
        .collect()
}

/// Markdown note: each `[[name]]` in the `.md` file references the note `name`.
pub struct WikiNote;

impl NoteBehavior for WikiNote {
    fn description(&self, _note: &Note) -> Option<String> {
        Some("wiki".to_string())
    }

    fn extract_refs(
        &self,
        note: &Note,
        _known: &BTreeSet<String>,
    ) -> Result<BTreeSet<String>, ZettelError> {
        let content = note.content("md")?;
        Ok(content
            .split("[[")
            .skip(1)
            .filter_map(|rest| rest.split_once("]]"))
            .map(|(name, _)| name.to_string())
            .collect())
    }

    fn render(&self, note: &Note, ctx: &RenderContext<'_>) -> Result<Page, ZettelError> {
        let outgoing = ctx
            .outgoing(note)
            .iter()
            .map(|n| n.name().to_string())
            .collect::<Vec<_>>();
        let incoming = ctx
            .incoming(note)
            .iter()
            .map(|n| n.name().to_string())
            .collect::<Vec<_>>();
        Ok(Page::Html(format!(
            "<p>{}</p><p>out: {}</p><p>in: {}</p>",
            note.name(),
            outgoing.join(","),
            incoming.join(",")
        )))
    }
}

/// A Typst source with its PDF. References nothing.
pub struct PdfNote;

impl NoteBehavior for PdfNote {
    fn render(&self, note: &Note, _ctx: &RenderContext<'_>) -> Result<Page, ZettelError> {
        Ok(Page::Text(format!("pdf {}", note.name())))
    }
}

/// A note whose rendering always fails.
pub struct BrokenNote;

impl NoteBehavior for BrokenNote {
    fn render(&self, _note: &Note, _ctx: &RenderContext<'_>) -> Result<Page, ZettelError> {
        Err(ZettelError::Custom("broken renderer".to_string()))
    }
}

/// Plain pages for `md` notes (`markdown`), `typ` + `pdf` notes (`typstpdf`) and a
/// failing `broken` type.
#[derive(Debug, Default)]
pub struct TestTheme;

impl Theme for TestTheme {
    fn note_types(&self) -> NoteTypes {
        NoteTypes::new()
            .with(NoteType::new("markdown", ["md"], WikiNote))
            .with(NoteType::new("typstpdf", ["typ", "pdf"], PdfNote))
            .with(NoteType::new("broken", ["broken"], BrokenNote))
    }

    fn render_index(&self, ctx: &RenderContext<'_>) -> Result<Page, ZettelError> {
        let names = ctx
            .analysis()
            .notes
            .keys()
            .cloned()
            .collect::<Vec<_>>();
        Ok(Page::Text(names.join("\n")))
    }
}

/// A project rooted at `root` with sources in `root/notes` and output in `root/site`.
#[allow(dead_code)]
pub fn test_project(root: &Path) -> Project {
    let config = ProjectConfig::default().resolved_against(root);
    Project::new(config, Arc::new(TestTheme))
}
