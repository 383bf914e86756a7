//! Building a project's output directory.
//!
//! A [`Project`] pairs a [`ProjectConfig`] with a [`Theme`] and produces a flat site: `index.html`
//! plus one `<name>.html` per note, next to the configured assets. Every build starts from an
//! empty output directory.

use crate::{
    analysis::{analyse, ProjectAnalysis},
    config::ProjectConfig,
    error::ZettelError,
    note::{NoteTypes, Page},
    theme::{RenderContext, Theme},
};
use parking_lot::RwLock;
use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::{Duration, Instant},
};
use walkdir::WalkDir;

/// Summary of a successful build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    pub notes: usize,
    /// Pages written, including the index.
    pub pages: usize,
    /// Asset files copied.
    pub assets: usize,
    pub elapsed: Duration,
}

pub struct Project {
    config: ProjectConfig,
    theme: Arc<dyn Theme>,
    note_types: NoteTypes,
    analysis: RwLock<Arc<ProjectAnalysis>>,
}

impl Project {
    pub fn new(config: ProjectConfig, theme: Arc<dyn Theme>) -> Self {
        let note_types = theme.note_types();
        Project {
            config,
            theme,
            note_types,
            analysis: RwLock::new(Arc::new(ProjectAnalysis::default())),
        }
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    pub fn note_types(&self) -> &NoteTypes {
        &self.note_types
    }

    /// The snapshot of the last successful build. Empty before the first one.
    pub fn analysis(&self) -> Arc<ProjectAnalysis> {
        self.analysis.read().clone()
    }

    /// Run a fresh analysis pass without writing anything.
    pub fn analyse(&self) -> Result<ProjectAnalysis, ZettelError> {
        analyse(&self.config.src_dir, &self.note_types)
    }

    /// Paths whose changes should trigger a rebuild: the source directory and asset sources.
    pub fn watch_paths(&self) -> Vec<PathBuf> {
        std::iter::once(self.config.src_dir.clone())
            .chain(self.config.copy_paths.keys().cloned())
            .collect()
    }

    /// Analyse the sources, then recreate the output directory with assets and pages.
    ///
    /// Analysis errors leave the previous output in place. Once the output directory has been
    /// cleared the build stops at the first failing copy, render or write, keeping whatever
    /// was already written. The new analysis replaces [`Project::analysis`] only once every
    /// page is written.
    #[tracing::instrument(skip_all)]
    pub async fn build(&self) -> Result<BuildReport, ZettelError> {
        let start = Instant::now();
        let analysis = Arc::new(self.analyse()?);
        let build_dir = &self.config.build_dir;

        if tokio::fs::try_exists(build_dir).await? {
            tokio::fs::remove_dir_all(build_dir).await?;
        }
        tokio::fs::create_dir_all(build_dir).await?;

        let mut assets = 0;
        for (src, dest) in self.config.copy_paths.iter() {
            assets += copy_asset(src, &build_dir.join(dest)).await?;
        }

        let ctx = RenderContext::new(&analysis, build_dir, &self.config.url_root);
        let index = self
            .theme
            .render_index(&ctx)
            .map_err(|e| ZettelError::render("index.html", e))?;
        write_page(build_dir, "index.html", index).await?;
        let mut pages = 1;

        for (name, note) in analysis.notes.iter() {
            let page_name = format!("{name}.html");
            let page = match note.kind().behavior() {
                Some(behavior) => behavior.render(note, &ctx),
                None => self.theme.render_unclassified(note, &ctx),
            }
            .map_err(|e| ZettelError::render(&page_name, e))?;
            write_page(build_dir, &page_name, page).await?;
            pages += 1;
        }

        let report = BuildReport {
            notes: analysis.notes.len(),
            pages,
            assets,
            elapsed: start.elapsed(),
        };
        *self.analysis.write() = analysis;
        tracing::debug!(
            "Wrote {} pages and {} assets to {:?}",
            report.pages,
            report.assets,
            build_dir
        );
        Ok(report)
    }
}

async fn write_page(build_dir: &Path, file_name: &str, page: Page) -> Result<(), ZettelError> {
    let path = build_dir.join(file_name);
    tracing::debug!("Writing {:?}", path);
    tokio::fs::write(&path, page.into_document())
        .await
        .map_err(|e| ZettelError::render(file_name, e))
}

/// Copy a file, or a directory tree, to `dest`. Returns the number of files copied.
async fn copy_asset(src: &Path, dest: &Path) -> Result<usize, ZettelError> {
    let copy_error = |from: &Path, to: &Path, message: String| ZettelError::AssetCopy {
        src: from.display().to_string(),
        dest: to.display().to_string(),
        message,
    };

    let metadata = tokio::fs::metadata(src)
        .await
        .map_err(|e| copy_error(src, dest, e.to_string()))?;
    if metadata.is_file() {
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| copy_error(src, dest, e.to_string()))?;
        }
        tokio::fs::copy(src, dest)
            .await
            .map_err(|e| copy_error(src, dest, e.to_string()))?;
        return Ok(1);
    }

    let entries = WalkDir::new(src)
        .sort_by_file_name()
        .into_iter()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| copy_error(src, dest, e.to_string()))?;
    let mut copied = 0;
    for entry in entries {
        let relative = entry.path().strip_prefix(src)?;
        let target = dest.join(relative);
        if entry.file_type().is_dir() {
            tokio::fs::create_dir_all(&target)
                .await
                .map_err(|e| copy_error(entry.path(), &target, e.to_string()))?;
        } else {
            tokio::fs::copy(entry.path(), &target)
                .await
                .map_err(|e| copy_error(entry.path(), &target, e.to_string()))?;
            copied += 1;
        }
    }
    tracing::debug!("Copied {} files from {:?} to {:?}", copied, src, dest);
    Ok(copied)
}
