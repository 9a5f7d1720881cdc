//! crates/quran_reader_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any transport or serialization format.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// One of the 114 top-level divisions of the corpus.
///
/// Fetched once per session from the content provider and read-only afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Chapter {
    pub id: u16,
    pub name: String,
    pub name_en: String,
    pub name_original: String,
    pub slug: String,
    pub verse_count: u16,
    /// Print page of the chapter's first verse.
    pub page_number: u16,
    pub audio: Option<AudioTrack>,
}

/// Recitation audio reference carried on chapters and search hits.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioTrack {
    pub mp3: String,
    pub duration: u32,
    pub mp3_en: String,
    pub duration_en: u32,
}

/// Attribution for one translation variant of the text.
#[derive(Debug, Clone, PartialEq)]
pub struct Translator {
    pub id: u32,
    pub name: String,
    pub language: String,
    pub description: Option<String>,
    pub url: Option<String>,
}

/// A numbered footnote attached to a translation, ordered by `number`.
#[derive(Debug, Clone, PartialEq)]
pub struct Footnote {
    pub id: u64,
    pub number: u16,
    pub text: String,
}

/// One translator's rendering of a verse.
#[derive(Debug, Clone, PartialEq)]
pub struct Translation {
    pub id: u64,
    pub text: String,
    pub translator: Translator,
    pub footnotes: Vec<Footnote>,
}

/// The smallest addressable unit of text.
///
/// The provider id is specific to the active translator; links and notes use
/// the stable natural key instead (see [`VerseKey`]).
#[derive(Debug, Clone, PartialEq)]
pub struct Verse {
    pub id: u64,
    pub chapter_id: u16,
    /// 1-based, unique within the chapter.
    pub verse_number: u16,
    /// Print page, monotonic non-decreasing across chapter boundaries.
    pub page: u16,
    pub juz_number: u8,
    pub text_original: String,
    pub transcription: String,
    pub transcription_en: String,
    pub translation: Option<Translation>,
}

impl Verse {
    pub fn key(&self) -> VerseKey {
        VerseKey {
            chapter_id: self.chapter_id,
            verse_number: self.verse_number,
        }
    }
}

/// The stable (chapter id, verse number) natural key of a verse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VerseKey {
    pub chapter_id: u16,
    pub verse_number: u16,
}

/// The two mutually exclusive presentation modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadingMode {
    /// Continuous reading by print page across chapter boundaries.
    Paginated,
    /// One chapter's verses as a discrete list.
    PerChapter,
}

/// The canonical "where the user is" record under synchronization.
///
/// Owned exclusively by the synchronizer; everything else reads it through
/// the synchronizer's accessor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadingPosition {
    pub mode: ReadingMode,
    /// Authoritative only in paginated mode. Page 0 is the empty start page.
    pub page_number: u16,
    /// Which chapter is currently in view or focus.
    pub chapter_id: u16,
    /// Set only when a specific verse is the navigation target.
    pub verse_number: Option<u16>,
}

impl ReadingPosition {
    pub fn initial(mode: ReadingMode) -> Self {
        Self {
            mode,
            page_number: 0,
            chapter_id: 1,
            verse_number: None,
        }
    }
}

/// A free-text annotation on a verse.
///
/// At most one note exists per natural key; saving again overwrites in place.
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    /// Client-generated, time-ordered.
    pub id: Uuid,
    pub chapter_id: u16,
    pub verse_number: u16,
    /// Denormalized for the notes browser listing.
    pub chapter_name: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// One ranked hit from the remote full-text search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub text: String,
    /// Provider-highlighted snippet, when the provider returned one.
    pub formatted_text: Option<String>,
    pub chapter_id: u16,
    pub chapter_name: String,
    pub chapter_name_en: String,
    pub chapter_audio: Option<AudioTrack>,
    pub verse_id: u64,
    pub verse_number: u16,
    pub page: u16,
    pub text_original: String,
    pub transcription: String,
    pub transcription_en: String,
}

/// Durable per-user settings, loaded once at startup and written back on
/// every mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct Preferences {
    pub language: String,
    pub dark_mode: bool,
    pub reading_mode: ReadingMode,
    pub translator_id: Option<u32>,
    /// Gates the first-run language prompt.
    pub language_chosen: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            dark_mode: false,
            reading_mode: ReadingMode::PerChapter,
            translator_id: None,
            language_chosen: false,
        }
    }
}
