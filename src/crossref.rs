use crate::{
    error::ZettelError,
    note::{Note, NoteRefs},
};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Directed graph of cross references between notes, by note name.
///
/// Only notes with at least one edge in a direction have an entry for that direction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CrossRefs {
    /// Notes linked to by each note.
    pub outgoing: BTreeMap<String, BTreeSet<String>>,
    /// Notes linking to each note.
    pub incoming: BTreeMap<String, BTreeSet<String>>,
}

impl CrossRefs {
    /// Ask every note for its references and build the graph.
    ///
    /// A reference to a name that isn't a note fails with
    /// [`ZettelError::UndefinedCrossReference`] naming the referencing note and the unknown
    /// names. Notes are visited in name order, so the reported note is deterministic.
    pub fn resolve(notes: &BTreeMap<String, Note>) -> Result<CrossRefs, ZettelError> {
        let known = notes.keys().cloned().collect::<BTreeSet<String>>();
        let mut refs = CrossRefs::default();

        for (name, note) in notes.iter() {
            let targets = note.extract_refs(&known)?;
            let unknown = targets
                .difference(&known)
                .cloned()
                .collect::<Vec<String>>();
            if !unknown.is_empty() {
                return Err(ZettelError::UndefinedCrossReference {
                    note: name.clone(),
                    description: note.description(),
                    unknown,
                });
            }
            for target in targets.iter() {
                refs.incoming
                    .entry(target.clone())
                    .or_default()
                    .insert(name.clone());
            }
            if !targets.is_empty() {
                refs.outgoing.insert(name.clone(), targets);
            }
        }

        tracing::debug!(
            "Resolved {} cross references between {} notes",
            refs.edge_count(),
            notes.len()
        );
        Ok(refs)
    }

    pub fn outgoing(&self, name: &str) -> impl Iterator<Item = &str> {
        self.outgoing
            .get(name)
            .into_iter()
            .flatten()
            .map(String::as_str)
    }

    pub fn incoming(&self, name: &str) -> impl Iterator<Item = &str> {
        self.incoming
            .get(name)
            .into_iter()
            .flatten()
            .map(String::as_str)
    }

    pub fn edge_count(&self) -> usize {
        self.outgoing.values().map(BTreeSet::len).sum()
    }

    /// Every name mentioned by the graph, on either end of an edge.
    pub fn names(&self) -> BTreeSet<&str> {
        self.outgoing
            .iter()
            .chain(self.incoming.iter())
            .flat_map(|(name, others)| {
                std::iter::once(name.as_str()).chain(others.iter().map(String::as_str))
            })
            .collect()
    }

    /// Record each note's references on the note itself, sorted by name.
    pub(crate) fn attach(&self, notes: &mut BTreeMap<String, Note>) {
        for (name, note) in notes.iter_mut() {
            note.set_refs(NoteRefs {
                outgoing: self.outgoing(name).map(str::to_string).collect(),
                incoming: self.incoming(name).map(str::to_string).collect(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        lazy_file::LazyFile,
        note::{Classification, NoteBehavior, NoteType, Page},
        theme::RenderContext,
    };
    use std::{fs, path::Path, sync::Arc};
    use tempfile::tempdir;
    use test_log::test;

    /// Each line of the `.refs` file names a referenced note.
    struct LineRefs;

    impl NoteBehavior for LineRefs {
        fn extract_refs(
            &self,
            note: &Note,
            _known: &BTreeSet<String>,
        ) -> Result<BTreeSet<String>, ZettelError> {
            Ok(note
                .content("refs")?
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect())
        }

        fn render(&self, _note: &Note, _ctx: &RenderContext<'_>) -> Result<Page, ZettelError> {
            Ok(Page::Text(String::new()))
        }
    }

    fn notes(dir: &Path, contents: &[(&str, &str)]) -> BTreeMap<String, Note> {
        let note_type = Arc::new(NoteType::new("refs", ["refs"], LineRefs));
        contents
            .iter()
            .map(|(name, content)| {
                let path = dir.join(format!("{name}.note.refs"));
                fs::write(&path, content).unwrap();
                let files = BTreeMap::from([("refs".to_string(), LazyFile::new(path))]);
                let note = Note::new(
                    *name,
                    vec![],
                    files,
                    Classification::Typed(note_type.clone()),
                );
                (name.to_string(), note)
            })
            .collect()
    }

    #[test]
    fn test_graph_has_both_directions() {
        let dir = tempdir().unwrap();
        let mut notes = notes(dir.path(), &[("x", "y\n"), ("y", ""), ("w", "x\ny\n")]);
        let refs = CrossRefs::resolve(&notes).unwrap();

        assert_eq!(refs.outgoing("x").collect::<Vec<_>>(), vec!["y"]);
        assert_eq!(refs.outgoing("w").collect::<Vec<_>>(), vec!["x", "y"]);
        assert!(!refs.outgoing.contains_key("y"));
        assert_eq!(refs.incoming("y").collect::<Vec<_>>(), vec!["w", "x"]);
        assert_eq!(refs.edge_count(), 3);
        assert!(refs.names().iter().all(|n| notes.contains_key(*n)));

        refs.attach(&mut notes);
        assert_eq!(notes["y"].refs().incoming, vec!["w", "x"]);
        assert!(notes["y"].refs().outgoing.is_empty());
    }

    #[test]
    fn test_unknown_reference_is_fatal() {
        let dir = tempdir().unwrap();
        let notes = notes(dir.path(), &[("x", "y\nz\n"), ("y", "")]);
        let err = CrossRefs::resolve(&notes).unwrap_err();
        assert_eq!(
            err,
            ZettelError::UndefinedCrossReference {
                note: "x".to_string(),
                description: "refs".to_string(),
                unknown: vec!["z".to_string()],
            }
        );
    }

    #[test]
    fn test_unclassified_notes_have_no_refs() {
        let mut notes = BTreeMap::new();
        notes.insert(
            "u".to_string(),
            Note::new("u", vec![], BTreeMap::new(), Classification::Unclassified),
        );
        let refs = CrossRefs::resolve(&notes).unwrap();
        assert_eq!(refs, CrossRefs::default());
    }
}
