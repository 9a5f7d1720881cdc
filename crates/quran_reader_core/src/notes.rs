//! crates/quran_reader_core/src/notes.rs
//!
//! The local annotation store: keyed CRUD over the persisted note
//! collection. The in-memory collection is authoritative; every mutation
//! writes the whole collection back through the [`LocalStore`] port.
//! Mutate first, persist after: a failed write never corrupts memory.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::domain::Note;
use crate::ports::{LocalStore, PortResult};

/// How the notes browser wants its listing arranged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteQuery {
    /// Case-insensitive substring match on content or chapter name.
    pub filter: Option<String>,
    pub sort_by: NoteSort,
    pub descending: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NoteSort {
    #[default]
    CreatedAt,
    VerseNumber,
}

pub struct AnnotationStore {
    notes: Vec<Note>,
    store: Arc<dyn LocalStore>,
}

impl AnnotationStore {
    /// Loads the persisted collection. A load failure starts the session
    /// with an empty collection rather than failing startup; the caller
    /// decides whether to log it.
    pub async fn load(store: Arc<dyn LocalStore>) -> (Self, Option<crate::ports::PortError>) {
        match store.load_notes().await {
            Ok(notes) => (Self { notes, store }, None),
            Err(e) => (
                Self {
                    notes: Vec::new(),
                    store,
                },
                Some(e),
            ),
        }
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn find(&self, chapter_id: u16, verse_number: u16) -> Option<&Note> {
        self.notes
            .iter()
            .find(|n| n.chapter_id == chapter_id && n.verse_number == verse_number)
    }

    /// Saves `note`, replacing any existing note with the same
    /// (chapter, verse) key in place. The persistence error, if any, is
    /// returned for logging; the in-memory collection keeps the new note
    /// either way.
    pub async fn upsert(&mut self, note: Note) -> PortResult<()> {
        let key = (note.chapter_id, note.verse_number);
        match self
            .notes
            .iter_mut()
            .find(|n| (n.chapter_id, n.verse_number) == key)
        {
            Some(existing) => *existing = note,
            None => self.notes.push(note),
        }
        self.persist().await
    }

    pub async fn delete(&mut self, chapter_id: u16, verse_number: u16) -> PortResult<()> {
        let before = self.notes.len();
        self.notes
            .retain(|n| !(n.chapter_id == chapter_id && n.verse_number == verse_number));
        if self.notes.len() == before {
            return Ok(());
        }
        self.persist().await
    }

    /// The notes browser listing: chapters in corpus order, each with its
    /// filtered and sorted notes. Chapters left empty by the filter are
    /// omitted.
    pub fn grouped_by_chapter(&self, query: &NoteQuery) -> Vec<(String, Vec<&Note>)> {
        let needle = query
            .filter
            .as_deref()
            .map(str::to_lowercase)
            .filter(|s| !s.is_empty());

        let mut groups: BTreeMap<u16, (String, Vec<&Note>)> = BTreeMap::new();
        for note in &self.notes {
            if let Some(needle) = &needle {
                let matches = note.content.to_lowercase().contains(needle)
                    || note.chapter_name.to_lowercase().contains(needle);
                if !matches {
                    continue;
                }
            }
            groups
                .entry(note.chapter_id)
                .or_insert_with(|| (note.chapter_name.clone(), Vec::new()))
                .1
                .push(note);
        }

        let mut listing: Vec<(String, Vec<&Note>)> = groups.into_values().collect();
        for (_, notes) in &mut listing {
            notes.sort_by(|a, b| {
                let ordering = match query.sort_by {
                    NoteSort::CreatedAt => a.created_at.cmp(&b.created_at),
                    NoteSort::VerseNumber => a.verse_number.cmp(&b.verse_number),
                };
                if query.descending {
                    ordering.reverse()
                } else {
                    ordering
                }
            });
        }
        listing
    }

    async fn persist(&self) -> PortResult<()> {
        self.store.save_notes(&self.notes).await
    }
}
