//! # zettelbuilder
//!
//! A static site builder for multi-file notes, with a live-reloading dev server.
//!
//! ## Overview
//!
//! A note is a set of files sharing an identifier: `maths/pythagoras.note.md` and
//! `maths/pythagoras.note.pdf` are two files of the note `pythagoras`. Each analysis pass
//!
//! 1. discovers every `<name>.note.<ext>` file below the source directory ([`discover`]),
//! 2. groups the files into notes and classifies each note by its exact set of extensions
//!    ([`assemble`], [`note`]),
//! 3. asks every note which other notes it references and validates the resulting graph
//!    ([`crossref`]),
//! 4. arranges the notes into a tree mirroring the source directories ([`folder`]).
//!
//! The resulting [`analysis::ProjectAnalysis`] is handed to a [`theme::Theme`], which renders
//! the index and one page per note. [`project::Project`] writes those pages into a flat output
//! directory, and (with the `service` feature) [`serve::DevServer`] keeps that directory in sync
//! with the sources while browsers reload on every successful rebuild.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use zettelbuilder::{config::ProjectConfig, project::Project, theme::minimal::Minimal};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), zettelbuilder::ZettelError> {
//!     let config = ProjectConfig::load("zettel.toml")?;
//!     let project = Project::new(config, Arc::new(Minimal));
//!     let report = project.build().await?;
//!     println!("{} notes, {} pages", report.notes, report.pages);
//!     Ok(())
//! }
//! ```
//!
//! ## Errors and Diagnostics
//!
//! Data quality problems that don't stop a build, a note name used in two directories or a note
//! matching no note type, are collected as [`diagnostic::AnalysisDiagnostic`]s and logged. A
//! reference to a note that doesn't exist fails the build with
//! [`ZettelError::UndefinedCrossReference`].

pub mod analysis;
pub mod assemble;
pub mod config;
pub mod crossref;
pub mod diagnostic;
pub mod discover;
pub mod error;
pub mod folder;
pub mod lazy_file;
pub mod note;
pub mod project;
#[cfg(feature = "service")]
pub mod serve;
pub mod theme;

pub use error::*;
