//! services/reader/src/session/state.rs
//!
//! Defines the application's shared and session-specific states.

use quran_reader_core::domain::{Chapter, Preferences, Translator};
use quran_reader_core::index::VerseIndex;
use quran_reader_core::notes::AnnotationStore;
use quran_reader_core::ports::{ContentService, LocalStore, PortResult, Viewport};
use quran_reader_core::sync::Synchronizer;
use std::sync::Arc;
use tracing::warn;

//=========================================================================================
// AppState (Shared Adapters)
//=========================================================================================

/// The shared adapter set, created once at startup.
#[derive(Clone)]
pub struct AppState {
    pub content: Arc<dyn ContentService>,
    pub store: Arc<dyn LocalStore>,
    pub viewport: Arc<dyn Viewport>,
}

//=========================================================================================
// SessionState (One Reader Session)
//=========================================================================================

/// Which verse scope the index covers: one chapter in per-chapter mode, the
/// whole corpus in paginated mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Chapter(u16),
    Corpus,
}

/// The state of one reader session.
pub struct SessionState {
    pub preferences: Preferences,
    /// The translator verses are currently rendered by. Defaults from the
    /// saved id, else the first translator matching the UI language; only an
    /// explicit selection is persisted.
    pub active_translator: Option<u32>,
    pub chapters: Vec<Chapter>,
    pub translators: Vec<Translator>,
    pub index: VerseIndex,
    pub sync: Synchronizer,
    pub notes: AnnotationStore,
    /// Monotonic tag for verse fetches; only the newest generation's result
    /// is applied (last-request-wins).
    pub fetch_generation: u64,
    /// What the index holds, or what the in-flight fetch will make it hold.
    pub loaded_scope: Option<Scope>,
    pub last_scroll_sample: Option<tokio::time::Instant>,
}

impl SessionState {
    /// Creates a new `SessionState`: loads the persisted collections and
    /// fetches the chapter and translator catalogues. Persistence failures
    /// degrade to defaults; catalogue fetch failures are fatal to startup
    /// (there is nothing to read without them).
    pub async fn new(app: &AppState) -> PortResult<Self> {
        let preferences = match app.store.load_preferences().await {
            Ok(preferences) => preferences,
            Err(e) => {
                warn!(error = %e, "could not load preferences, starting with defaults");
                Preferences::default()
            }
        };

        let (notes, notes_error) = AnnotationStore::load(app.store.clone()).await;
        if let Some(e) = notes_error {
            warn!(error = %e, "could not load notes, starting empty");
        }

        let chapters = app.content.fetch_chapters().await?;
        let translators = app.content.fetch_translators().await?;

        let active_translator = preferences
            .translator_id
            .filter(|id| translators.iter().any(|t| t.id == *id))
            .or_else(|| {
                translators
                    .iter()
                    .find(|t| t.language == preferences.language)
                    .map(|t| t.id)
            });

        let sync = Synchronizer::new(preferences.reading_mode);

        Ok(Self {
            preferences,
            active_translator,
            chapters,
            translators,
            index: VerseIndex::empty(),
            sync,
            notes,
            fetch_generation: 0,
            loaded_scope: None,
            last_scroll_sample: None,
        })
    }
}
