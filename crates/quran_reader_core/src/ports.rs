//! crates/quran_reader_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like the content
//! provider's REST API or the browser viewport.

use async_trait::async_trait;

use crate::domain::{Chapter, Note, Preferences, SearchHit, Translator, Verse, VerseKey};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., HTTP, disk).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The remote content provider: chapter/verse/translator catalogue plus
/// full-text search. All failures surface as [`PortError`]; callers treat
/// them as recoverable FetchFailures.
#[async_trait]
pub trait ContentService: Send + Sync {
    async fn fetch_chapters(&self) -> PortResult<Vec<Chapter>>;

    /// Verses of one chapter, optionally rendered by a specific translator.
    async fn fetch_chapter_verses(
        &self,
        chapter_id: u16,
        translator_id: Option<u32>,
    ) -> PortResult<Vec<Verse>>;

    async fn fetch_verse(
        &self,
        chapter_id: u16,
        verse_number: u16,
        translator_id: Option<u32>,
    ) -> PortResult<Verse>;

    async fn fetch_translators(&self) -> PortResult<Vec<Translator>>;

    /// Quick full-text search; ranking is the provider's concern.
    async fn search(&self, query: &str, language: &str) -> PortResult<Vec<SearchHit>>;

    async fn random_verse(&self, language: &str) -> PortResult<Option<SearchHit>>;
}

/// Durable local storage for the persisted collections.
///
/// Loads happen once at startup; every mutation writes the full collection
/// back. A load of something never saved returns the empty/default value,
/// not an error.
#[async_trait]
pub trait LocalStore: Send + Sync {
    async fn load_preferences(&self) -> PortResult<Preferences>;

    async fn save_preferences(&self, preferences: &Preferences) -> PortResult<()>;

    async fn load_notes(&self) -> PortResult<Vec<Note>>;

    async fn save_notes(&self, notes: &[Note]) -> PortResult<()>;
}

/// The physical viewport: element lookup, programmatic scrolling and the
/// transient emphasis pulse. Implemented by the embedding frontend.
#[async_trait]
pub trait Viewport: Send + Sync {
    /// Whether the content block for `target` is currently rendered.
    async fn is_rendered(&self, target: ScrollTarget) -> bool;

    /// Smoothly scroll the block for `target` into a centered position.
    async fn scroll_into_view(&self, target: ScrollTarget);

    /// Toggle the transient visual emphasis on the block for `target`.
    async fn set_emphasis(&self, target: ScrollTarget, emphasized: bool);

    /// The chapter whose content block sits nearest the top of the focus
    /// band, `band_height` pixels below the viewport top. `None` while
    /// nothing is rendered.
    async fn focused_chapter(&self, band_height: u32) -> Option<u16>;
}

/// What a programmatic scroll should land on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScrollTarget {
    Verse(VerseKey),
    /// The top of a print page (paginated mode after a page change).
    PageTop(u16),
    /// The heading of a chapter (per-chapter mode).
    ChapterTop(u16),
}
