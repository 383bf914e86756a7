//! The minimal theme: plain HTML pages with a cross reference footer and a folder index.
//!
//! Markdown notes reference each other with `@name` handles. `(@name)` inside a link target is
//! rewritten to the page URL, and a bare `@name` becomes a link labelled with the handle.

use crate::{
    error::ZettelError,
    folder::NoteFolder,
    note::{Note, NoteBehavior, NoteType, NoteTypes, Page},
    theme::{encode_segment, escape_html, page_href, RenderContext, Theme},
};
use once_cell::sync::Lazy;
use pulldown_cmark::{Options as MdOptions, Parser as MdParser};
use regex::{Captures, Regex};
use std::{collections::BTreeSet, fmt::Write};
use url::Url;

static NOTE_HANDLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@([-\w]+)").expect("note handle pattern is valid"));
static NOTE_HANDLE_TARGET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(@([-\w]+)\)").expect("note handle target pattern is valid"));
static HTTP_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"https?:\S*").expect("url pattern is valid"));

#[derive(Debug, Clone, Copy, Default)]
pub struct Minimal;

impl Theme for Minimal {
    fn note_types(&self) -> NoteTypes {
        NoteTypes::new()
            .with(NoteType::new("markdown", ["md"], MarkdownNote))
            .with(NoteType::new("plaintext", ["txt"], PlainTextNote))
            .with(NoteType::new("url", ["url"], ExternalUrlNote))
            .with(NoteType::new("typstpdf", ["typ", "pdf"], TypstPdfNote))
    }

    fn render_index(&self, ctx: &RenderContext<'_>) -> Result<Page, ZettelError> {
        let mut main = String::new();
        main.push_str("<main><h1>📑 Index</h1><p>This is the minimal theme.</p>");
        main.push_str("<h2>Notes by folder</h2>");
        toc(ctx.tree(), ctx, &mut main)?;
        main.push_str("</main>");
        Ok(Page::Html(base("<title>Index</title>", &main)))
    }
}

fn base(head: &str, body: &str) -> String {
    format!(
        "<html lang=\"en\"><head><meta charset=\"UTF-8\"/>\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\"/>\
         {head}</head><body>{body}</body></html>"
    )
}

fn note_link(note: &Note, ctx: &RenderContext<'_>) -> String {
    format!(
        "<span><a href=\"{}\"><code>[{}]</code></a> {}</span>",
        escape_html(&ctx.href(note)),
        escape_html(note.name()),
        escape_html(&note.description())
    )
}

fn note_page(
    note: &Note,
    ctx: &RenderContext<'_>,
    head: &str,
    content: &str,
) -> Result<Page, ZettelError> {
    let name = escape_html(note.name());
    let mut body = String::new();
    write!(
        body,
        "<p><b><a href=\"{}\">Index</a> / <span>{name}</span></b></p>",
        escape_html(ctx.url_root())
    )?;
    write!(body, "<h1>Note <code>[{name}]</code></h1><main>{content}</main>")?;
    body.push_str("<h2>Cross references</h2>");
    for (label, notes) in [
        ("Outgoing", ctx.outgoing(note)),
        ("Incoming", ctx.incoming(note)),
    ] {
        if notes.is_empty() {
            continue;
        }
        write!(body, "{label}:<ul>")?;
        for other in notes {
            write!(body, "<li>{}</li>", note_link(other, ctx))?;
        }
        body.push_str("</ul>");
    }
    let head = format!("<title>Notes | {name}</title>{head}");
    Ok(Page::Html(base(&head, &body)))
}

fn toc(folder: &NoteFolder, ctx: &RenderContext<'_>, out: &mut String) -> Result<(), ZettelError> {
    out.push_str("<ul>");
    for note in folder.notes().values() {
        write!(
            out,
            "<li><a href=\"{}\"><code>[{}]</code></a> <span>{}</span>",
            escape_html(&ctx.href(note)),
            escape_html(note.name()),
            escape_html(&note.description())
        )?;
        for (label, others) in [
            (", links to ", ctx.outgoing(note)),
            (", linked from ", ctx.incoming(note)),
        ] {
            if others.is_empty() {
                continue;
            }
            out.push_str(label);
            for other in others {
                write!(out, "<code>[{}]</code>", escape_html(other.name()))?;
            }
        }
        out.push_str("</li>");
    }
    for (name, subfolder) in folder.subfolders() {
        write!(out, "<li><strong>{}</strong>", escape_html(name))?;
        toc(subfolder, ctx, out)?;
        out.push_str("</li>");
    }
    out.push_str("</ul>");
    Ok(())
}

fn md_options() -> MdOptions {
    MdOptions::ENABLE_TABLES
        | MdOptions::ENABLE_FOOTNOTES
        | MdOptions::ENABLE_STRIKETHROUGH
        | MdOptions::ENABLE_TASKLISTS
        | MdOptions::ENABLE_HEADING_ATTRIBUTES
}

pub fn to_html(content: &str, output: &mut String) -> Result<(), ZettelError> {
    let parser = MdParser::new_ext(content, md_options());
    pulldown_cmark::html::write_html_fmt(output, parser)?;
    Ok(())
}

/// Replace `@name` handles with links to the named notes' pages.
pub fn link_note_handles(markdown: &str, url_root: &str) -> String {
    let targets = NOTE_HANDLE_TARGET.replace_all(markdown, |caps: &Captures| {
        format!("({})", page_href(url_root, &caps[1]))
    });
    NOTE_HANDLE
        .replace_all(&targets, |caps: &Captures| {
            format!("[{}]({})", &caps[0], page_href(url_root, &caps[1]))
        })
        .into_owned()
}

pub struct MarkdownNote;

impl NoteBehavior for MarkdownNote {
    fn description(&self, _note: &Note) -> Option<String> {
        Some("markdown".to_string())
    }

    /// The first top level heading, if there is one.
    fn title(&self, note: &Note) -> String {
        match note.content("md") {
            Ok(content) => content
                .lines()
                .find_map(|line| line.strip_prefix("# "))
                .map(|title| title.trim().to_string())
                .unwrap_or_else(|| note.name().to_string()),
            Err(e) => {
                tracing::warn!("Couldn't read title of \"{}\": {e}", note.name());
                note.name().to_string()
            }
        }
    }

    fn extract_refs(
        &self,
        note: &Note,
        _known: &BTreeSet<String>,
    ) -> Result<BTreeSet<String>, ZettelError> {
        Ok(NOTE_HANDLE
            .captures_iter(note.content("md")?)
            .map(|caps| caps[1].to_string())
            .collect())
    }

    fn render(&self, note: &Note, ctx: &RenderContext<'_>) -> Result<Page, ZettelError> {
        let markdown = link_note_handles(note.content("md")?, ctx.url_root());
        let mut html = String::from("<div class=\"markdown-body\">");
        to_html(&markdown, &mut html)?;
        html.push_str("</div>");
        note_page(note, ctx, "", &html)
    }
}

pub struct PlainTextNote;

impl NoteBehavior for PlainTextNote {
    fn description(&self, _note: &Note) -> Option<String> {
        Some("plain text".to_string())
    }

    fn render(&self, note: &Note, ctx: &RenderContext<'_>) -> Result<Page, ZettelError> {
        let content = format!("<pre>{}</pre>", escape_html(note.content("txt")?));
        note_page(note, ctx, "", &content)
    }
}

/// A note holding a link to an external page.
pub struct ExternalUrlNote;

impl ExternalUrlNote {
    fn url(note: &Note) -> Result<Url, ZettelError> {
        let file = note
            .file("url")
            .ok_or_else(|| ZettelError::NotFound(format!("{} has no .url file", note.name())))?;
        let found = HTTP_URL.find(file.content()?).ok_or_else(|| {
            ZettelError::Serialization(format!(
                "Couldn't parse URL in {}.",
                file.path().display()
            ))
        })?;
        Ok(Url::parse(found.as_str())?)
    }
}

impl NoteBehavior for ExternalUrlNote {
    fn description(&self, note: &Note) -> Option<String> {
        let url = ExternalUrlNote::url(note).ok()?;
        Some(format!("{} link", url.host_str().unwrap_or("external")))
    }

    fn render(&self, note: &Note, ctx: &RenderContext<'_>) -> Result<Page, ZettelError> {
        let href = escape_html(ExternalUrlNote::url(note)?.as_str());
        let content = format!(
            "<p>Link to <code>{href}</code>.</p><iframe class=\"page\" src=\"{href}\"></iframe>"
        );
        note_page(note, ctx, "", &content)
    }
}

/// A Typst source with its compiled PDF. The PDF is published next to the note's page.
pub struct TypstPdfNote;

impl NoteBehavior for TypstPdfNote {
    fn description(&self, _note: &Note) -> Option<String> {
        Some("typst pdf".to_string())
    }

    fn render(&self, note: &Note, ctx: &RenderContext<'_>) -> Result<Page, ZettelError> {
        let pdf = note
            .file("pdf")
            .ok_or_else(|| ZettelError::NotFound(format!("{} has no .pdf file", note.name())))?;
        let pdf_name = format!("{}.pdf", note.name());
        std::fs::copy(pdf.path(), ctx.build_dir().join(&pdf_name))
            .map_err(|e| ZettelError::render(&pdf_name, e))?;
        let content = format!(
            "<object data=\"{}\" type=\"application/pdf\"></object>",
            escape_html(&encode_segment(&pdf_name))
        );
        note_page(note, ctx, "", &content)
    }
}
