//! services/reader/src/session/protocol.rs
//!
//! Defines the message protocol between the embedding frontend and the
//! reader engine.

use chrono::{DateTime, Utc};
use quran_reader_core::domain::{Chapter, Note, ReadingMode, ReadingPosition, SearchHit};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Wire form of the reading mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Paginated,
    PerChapter,
}

impl From<Mode> for ReadingMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Paginated => ReadingMode::Paginated,
            Mode::PerChapter => ReadingMode::PerChapter,
        }
    }
}

impl From<ReadingMode> for Mode {
    fn from(mode: ReadingMode) -> Self {
        match mode {
            ReadingMode::Paginated => Mode::Paginated,
            ReadingMode::PerChapter => Mode::PerChapter,
        }
    }
}

/// Wire form of the notes-browser sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NoteSortKey {
    #[default]
    CreatedAt,
    VerseNumber,
}

//=========================================================================================
// Messages Sent FROM the Frontend TO the Engine
//=========================================================================================

/// Represents the structured messages a frontend can send to the engine.
#[derive(Deserialize, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// The address changed: initial load, link click, back/forward.
    Navigate { path: String },

    /// The viewport scrolled. Carries no measurement; the engine samples the
    /// focus band itself, throttled, and only while it is not the one
    /// scrolling.
    Scrolled,

    /// Explicit navigation to a verse (search result, note, random verse).
    OpenVerse { chapter_id: u16, verse_number: u16 },

    OpenChapter { chapter_id: u16 },

    NextPage,

    PreviousPage,

    /// Manual page-number entry.
    GoToPage { page: u16 },

    SetMode { mode: Mode },

    SetTranslator { translator_id: u32 },

    SetLanguage { language: String },

    SetTheme { dark_mode: bool },

    /// The first-run language prompt was acknowledged.
    LanguagePromptSeen,

    /// Remote full-text search.
    Search { query: String },

    RandomVerse,

    /// Partial input in the chapter picker; answers with the filtered
    /// candidates.
    FilterChapters { input: String },

    /// A chapter was picked; answers with the verse numbers present for it
    /// in the current index, for the dependent verse picker.
    ListVerseNumbers { chapter_name: String },

    /// The chapter-name + verse-number quick-jump picker was submitted.
    QuickJump {
        chapter_name: String,
        verse_number: String,
    },

    SaveNote {
        chapter_id: u16,
        verse_number: u16,
        content: String,
    },

    DeleteNote { chapter_id: u16, verse_number: u16 },

    ListNotes {
        #[serde(default)]
        filter: Option<String>,
        #[serde(default)]
        sort_by: NoteSortKey,
        #[serde(default)]
        descending: bool,
    },
}

//=========================================================================================
// Messages Sent FROM the Engine TO the Frontend
//=========================================================================================

/// Represents the structured messages the engine can send to the frontend.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// The frontend should push a new history entry for `path`.
    RoutePushed { path: String },

    /// The frontend should replace the current history entry with `path`
    /// (stale-deep-link cleanup).
    RouteReplaced { path: String },

    /// The canonical reading position moved.
    PositionChanged {
        mode: Mode,
        page_number: u16,
        chapter_id: u16,
        verse_number: Option<u16>,
    },

    /// A verse fetch is in flight; show the loading affordance.
    LoadingStarted,

    LoadingFinished,

    /// The index was rebuilt; pagination bounds may have changed.
    ContentReady { verse_count: usize, max_page: u16 },

    /// The content provider failed; the position holds where it was.
    FetchFailed { message: String },

    SearchResults { hits: Vec<SearchHitPayload> },

    RandomVerseReady { hit: Option<SearchHitPayload> },

    ChapterCandidates { chapters: Vec<ChapterPayload> },

    VerseNumbers {
        chapter_name: String,
        verse_numbers: Vec<u16>,
    },

    Notes { groups: Vec<NoteGroupPayload> },

    NoteSaved { chapter_id: u16, verse_number: u16 },

    NoteDeleted { chapter_id: u16, verse_number: u16 },

    /// Emitted once at startup until a language has been chosen.
    LanguagePromptRequired,
}

impl ServerMessage {
    pub fn position(position: &ReadingPosition) -> Self {
        ServerMessage::PositionChanged {
            mode: position.mode.into(),
            page_number: position.page_number,
            chapter_id: position.chapter_id,
            verse_number: position.verse_number,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ChapterPayload {
    pub id: u16,
    pub name: String,
    pub name_en: String,
    pub verse_count: u16,
    pub page_number: u16,
}

impl From<&Chapter> for ChapterPayload {
    fn from(chapter: &Chapter) -> Self {
        Self {
            id: chapter.id,
            name: chapter.name.clone(),
            name_en: chapter.name_en.clone(),
            verse_count: chapter.verse_count,
            page_number: chapter.page_number,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SearchHitPayload {
    pub chapter_id: u16,
    pub chapter_name: String,
    pub chapter_name_en: String,
    pub verse_id: u64,
    pub verse_number: u16,
    pub page: u16,
    pub text: String,
    pub formatted_text: Option<String>,
    pub text_original: String,
    pub transcription: String,
    pub transcription_en: String,
    pub audio_mp3: Option<String>,
    pub audio_mp3_en: Option<String>,
}

impl From<&SearchHit> for SearchHitPayload {
    fn from(hit: &SearchHit) -> Self {
        Self {
            chapter_id: hit.chapter_id,
            chapter_name: hit.chapter_name.clone(),
            chapter_name_en: hit.chapter_name_en.clone(),
            verse_id: hit.verse_id,
            verse_number: hit.verse_number,
            page: hit.page,
            text: hit.text.clone(),
            formatted_text: hit.formatted_text.clone(),
            text_original: hit.text_original.clone(),
            transcription: hit.transcription.clone(),
            transcription_en: hit.transcription_en.clone(),
            audio_mp3: hit.chapter_audio.as_ref().map(|a| a.mp3.clone()),
            audio_mp3_en: hit.chapter_audio.as_ref().map(|a| a.mp3_en.clone()),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct NotePayload {
    pub id: Uuid,
    pub chapter_id: u16,
    pub verse_number: u16,
    pub chapter_name: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Note> for NotePayload {
    fn from(note: &Note) -> Self {
        Self {
            id: note.id,
            chapter_id: note.chapter_id,
            verse_number: note.verse_number,
            chapter_name: note.chapter_name.clone(),
            content: note.content.clone(),
            created_at: note.created_at,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct NoteGroupPayload {
    pub chapter_name: String,
    pub notes: Vec<NotePayload>,
}
