//! Whole builds into an output directory.

mod common;

use common::{read_tree, test_project, write_tree};
use std::{path::PathBuf, sync::Arc};
use tempfile::tempdir;
use test_log::test;
use zettelbuilder::{
    config::ProjectConfig, project::Project, theme::minimal::Minimal, ZettelError,
};

#[test(tokio::test)]
async fn test_output_layout_is_flat() {
    let dir = tempdir().unwrap();
    write_tree(
        dir.path(),
        &[
            ("notes/x.note.md", "see [[y]]"),
            ("notes/deep/down/y.note.md", "nothing"),
            ("notes/c.note.typ", "= C"),
            ("notes/c.note.pdf", "%PDF"),
        ],
    );

    let project = test_project(dir.path());
    let report = project.build().await.unwrap();
    assert_eq!(report.notes, 3);
    assert_eq!(report.pages, 4);

    let site = dir.path().join("site");
    let files = read_tree(&site)
        .into_iter()
        .map(|(path, _)| path)
        .collect::<Vec<_>>();
    assert_eq!(
        files,
        ["c.html", "index.html", "x.html", "y.html"]
            .iter()
            .map(PathBuf::from)
            .collect::<Vec<_>>()
    );

    // Text pages are written verbatim, markup gets a document declaration.
    assert_eq!(
        std::fs::read_to_string(site.join("index.html")).unwrap(),
        "c\nx\ny"
    );
    assert_eq!(
        std::fs::read_to_string(site.join("y.html")).unwrap(),
        "<!DOCTYPE html><p>y</p><p>out: </p><p>in: x</p>"
    );
    assert_eq!(
        std::fs::read_to_string(site.join("c.html")).unwrap(),
        "pdf c"
    );
}

#[test(tokio::test)]
async fn test_repeated_builds_are_identical() {
    let dir = tempdir().unwrap();
    write_tree(
        dir.path(),
        &[
            ("notes/maths/a.note.md", "# A\n\nSee @b and [the proof](@c)."),
            ("notes/maths/b.note.md", "# B\n\nBack to @a."),
            ("notes/c.note.txt", "Proof <by> induction."),
            ("notes/link.note.url", "https://example.com/paper"),
            ("notes/lost.note.xyz", "?"),
            ("static/style.css", "body { margin: 0 }"),
        ],
    );
    let mut config = ProjectConfig::default();
    config
        .copy_paths
        .insert(PathBuf::from("static"), PathBuf::from("static"));
    let project = Project::new(config.resolved_against(dir.path()), Arc::new(Minimal));

    project.build().await.unwrap();
    let first = read_tree(&dir.path().join("site"));
    project.build().await.unwrap();
    let second = read_tree(&dir.path().join("site"));

    assert_eq!(first.len(), 7);
    assert_eq!(first, second);
}

#[test(tokio::test)]
async fn test_minimal_theme_pages() {
    let dir = tempdir().unwrap();
    write_tree(
        dir.path(),
        &[
            ("notes/maths/a.note.md", "# Alpha\n\nSee @b."),
            ("notes/b.note.url", "Read https://example.com/b today"),
            ("notes/paper.note.typ", "= Paper"),
            ("notes/paper.note.pdf", "%PDF-1.7"),
        ],
    );
    let project = Project::new(
        ProjectConfig::default().resolved_against(dir.path()),
        Arc::new(Minimal),
    );
    project.build().await.unwrap();
    let site = dir.path().join("site");

    let index = std::fs::read_to_string(site.join("index.html")).unwrap();
    assert!(index.starts_with("<!DOCTYPE html>"));
    assert!(index.contains("<strong>maths</strong>"));
    assert!(index.contains("example.com link"));
    assert!(index.contains(", links to <code>[b]</code>"));
    assert!(index.contains(", linked from <code>[a]</code>"));

    let b = std::fs::read_to_string(site.join("b.html")).unwrap();
    assert!(b.contains("<iframe class=\"page\" src=\"https://example.com/b\">"));
    assert!(b.contains("Incoming:"));

    assert_eq!(
        std::fs::read_to_string(site.join("paper.pdf")).unwrap(),
        "%PDF-1.7"
    );
    let paper = std::fs::read_to_string(site.join("paper.html")).unwrap();
    assert!(paper.contains("<object data=\"paper.pdf\""));
}

#[test(tokio::test)]
async fn test_render_failure_aborts_build() {
    let dir = tempdir().unwrap();
    write_tree(
        dir.path(),
        &[("notes/a.note.md", "fine"), ("notes/z.note.broken", "")],
    );

    let err = test_project(dir.path()).build().await.unwrap_err();
    let ZettelError::Render { page, message } = err else {
        panic!("expected a render error, got {err:?}");
    };
    assert_eq!(page, "z.html");
    assert!(message.contains("broken renderer"));
    // Pages written before the failure stay on disk.
    assert!(dir.path().join("site/a.html").exists());
    assert!(!dir.path().join("site/z.html").exists());
}

#[test(tokio::test)]
async fn test_snapshot_is_replaced_only_by_complete_builds() {
    let dir = tempdir().unwrap();
    write_tree(dir.path(), &[("notes/a.note.md", "fine")]);
    let project = test_project(dir.path());
    project.build().await.unwrap();
    let before = project.analysis();

    write_tree(dir.path(), &[("notes/z.note.broken", "")]);
    assert!(project.build().await.is_err());
    assert!(Arc::ptr_eq(&project.analysis(), &before));
    assert!(project.analysis().note("z").is_none());

    std::fs::remove_file(dir.path().join("notes/z.note.broken")).unwrap();
    write_tree(dir.path(), &[("notes/b.note.md", "see [[a]]")]);
    project.build().await.unwrap();
    assert!(!Arc::ptr_eq(&project.analysis(), &before));
    assert!(project.analysis().note("b").is_some());
}

#[test(tokio::test)]
async fn test_failed_analysis_keeps_previous_output() {
    let dir = tempdir().unwrap();
    write_tree(dir.path(), &[("notes/x.note.md", "alone")]);
    let project = test_project(dir.path());
    project.build().await.unwrap();
    let before = read_tree(&dir.path().join("site"));

    write_tree(dir.path(), &[("notes/x.note.md", "now see [[ghost]]")]);
    let err = project.build().await.unwrap_err();
    assert!(matches!(err, ZettelError::UndefinedCrossReference { .. }));
    assert_eq!(read_tree(&dir.path().join("site")), before);
    assert!(project.analysis().note("x").is_some());
}

#[test(tokio::test)]
async fn test_unclassified_notes_use_default_page() {
    let dir = tempdir().unwrap();
    write_tree(dir.path(), &[("notes/odd.note.xyz", "?")]);

    test_project(dir.path()).build().await.unwrap();
    let page = std::fs::read_to_string(dir.path().join("site/odd.html")).unwrap();
    assert!(page.starts_with("<!DOCTYPE html>"));
    assert!(page.contains("default note renderer"));
}
