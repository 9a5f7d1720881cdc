//! services/reader/src/session/engine.rs
//!
//! This is the main entry point and control loop for a reader session.
//! It consumes frontend messages and fetch completions from one channel,
//! feeds the core synchronizer, and executes the side effects it returns:
//! route commands to the frontend, scroll requests to the controller.

use crate::session::{
    protocol::{ClientMessage, NoteGroupPayload, NoteSortKey, ServerMessage},
    scroll::ScrollController,
    state::{AppState, Scope, SessionState},
};
use chrono::Utc;
use quran_reader_core::domain::{Note, ReadingMode, ReadingPosition, Verse};
use quran_reader_core::index::VerseIndex;
use quran_reader_core::notes::{NoteQuery, NoteSort};
use quran_reader_core::ports::PortResult;
use quran_reader_core::route::Route;
use quran_reader_core::search;
use quran_reader_core::sync::{SideEffect, SyncEvent, UserAction};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// The fixed focus band: a content block whose top sits above this line
/// counts as "in view".
const FOCUS_BAND_PX: u32 = 200;
/// Minimum spacing between two scroll samples. Throttling is a scheduling
/// choice; samples are advisory and may be dropped.
const SCROLL_SAMPLE_INTERVAL: Duration = Duration::from_millis(150);

/// Everything the engine's event loop consumes: frontend messages plus the
/// completions of its own spawned fetches.
#[derive(Debug)]
pub enum EngineEvent {
    Client(ClientMessage),
    VersesLoaded { generation: u64, verses: Vec<Verse> },
    FetchFailed { generation: u64, message: String },
}

pub struct ReaderEngine {
    app: Arc<AppState>,
    session: SessionState,
    scroll: ScrollController,
    /// Loops fetch completions back into the event stream.
    self_tx: mpsc::UnboundedSender<EngineEvent>,
    ui_tx: mpsc::UnboundedSender<ServerMessage>,
    last_emitted: Option<ReadingPosition>,
}

impl ReaderEngine {
    pub async fn new(
        app: Arc<AppState>,
        self_tx: mpsc::UnboundedSender<EngineEvent>,
        ui_tx: mpsc::UnboundedSender<ServerMessage>,
    ) -> PortResult<Self> {
        let session = SessionState::new(&app).await?;
        if !session.preferences.language_chosen {
            let _ = ui_tx.send(ServerMessage::LanguagePromptRequired);
        }
        let scroll = ScrollController::new(app.viewport.clone());
        Ok(Self {
            app,
            session,
            scroll,
            self_tx,
            ui_tx,
            last_emitted: None,
        })
    }

    /// The main loop: one event at a time, state transitions never overlap.
    pub async fn run(mut self, mut rx: mpsc::UnboundedReceiver<EngineEvent>) {
        info!("Reader session started.");
        while let Some(event) = rx.recv().await {
            self.handle(event).await;
        }
        info!("Reader session closed.");
    }

    pub async fn handle(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::Client(message) => self.handle_client(message).await,
            EngineEvent::VersesLoaded { generation, verses } => {
                self.verses_loaded(generation, verses)
            }
            EngineEvent::FetchFailed {
                generation,
                message,
            } => self.fetch_failed(generation, message),
        }
    }

    async fn handle_client(&mut self, message: ClientMessage) {
        match message {
            ClientMessage::Navigate { path } => self.navigate(&path).await,
            ClientMessage::Scrolled => self.sample_scroll().await,
            ClientMessage::OpenVerse {
                chapter_id,
                verse_number,
            } => self.open_verse(chapter_id, verse_number),
            ClientMessage::OpenChapter { chapter_id } => {
                self.ensure_scope(self.desired_scope(Some(chapter_id)));
                self.apply(SyncEvent::UserAction(UserAction::OpenChapter { chapter_id }));
            }
            ClientMessage::NextPage => self.apply(SyncEvent::UserAction(UserAction::NextPage)),
            ClientMessage::PreviousPage => {
                self.apply(SyncEvent::UserAction(UserAction::PreviousPage))
            }
            ClientMessage::GoToPage { page } => {
                self.apply(SyncEvent::UserAction(UserAction::GoToPage(page)))
            }
            ClientMessage::SetMode { mode } => self.set_mode(mode.into()).await,
            ClientMessage::SetTranslator { translator_id } => {
                self.set_translator(translator_id).await
            }
            ClientMessage::SetLanguage { language } => {
                self.session.preferences.language = language;
                self.session.preferences.language_chosen = true;
                self.persist_preferences().await;
            }
            ClientMessage::SetTheme { dark_mode } => {
                self.session.preferences.dark_mode = dark_mode;
                self.persist_preferences().await;
            }
            ClientMessage::LanguagePromptSeen => {
                self.session.preferences.language_chosen = true;
                self.persist_preferences().await;
            }
            ClientMessage::Search { query } => self.search(&query).await,
            ClientMessage::RandomVerse => self.random_verse().await,
            ClientMessage::FilterChapters { input } => self.filter_chapters(&input),
            ClientMessage::ListVerseNumbers { chapter_name } => {
                self.list_verse_numbers(chapter_name)
            }
            ClientMessage::QuickJump {
                chapter_name,
                verse_number,
            } => self.quick_jump(&chapter_name, &verse_number),
            ClientMessage::SaveNote {
                chapter_id,
                verse_number,
                content,
            } => self.save_note(chapter_id, verse_number, content).await,
            ClientMessage::DeleteNote {
                chapter_id,
                verse_number,
            } => self.delete_note(chapter_id, verse_number).await,
            ClientMessage::ListNotes {
                filter,
                sort_by,
                descending,
            } => self.list_notes(filter, sort_by, descending),
        }
    }

    //=====================================================================================
    // Route and Scroll Signals
    //=====================================================================================

    async fn navigate(&mut self, path: &str) {
        let route: Route = match path.parse() {
            Ok(route) => route,
            Err(e) => {
                debug!(error = %e, "ignoring unrecognized route");
                return;
            }
        };

        // A pinned translator in the deep link wins over the saved one.
        if let Route::Verse {
            translator_id: Some(translator_id),
            ..
        } = route
        {
            self.set_translator(translator_id).await;
        }

        let target_chapter = match route {
            Route::Home => None,
            Route::Chapter { chapter_id } => Some(chapter_id),
            Route::Verse { chapter_id, .. } => Some(chapter_id),
        };
        self.ensure_scope(self.desired_scope(target_chapter));
        self.apply(SyncEvent::RouteChanged(route));
    }

    /// One throttled scroll sample. Skipped entirely while the controller is
    /// the one scrolling, so programmatic scrolls never feed back into the
    /// synchronizer.
    async fn sample_scroll(&mut self) {
        if self.scroll.is_programmatic() {
            return;
        }
        let now = tokio::time::Instant::now();
        if let Some(last) = self.session.last_scroll_sample {
            if now.duration_since(last) < SCROLL_SAMPLE_INTERVAL {
                return;
            }
        }
        self.session.last_scroll_sample = Some(now);

        if let Some(chapter_id) = self.app.viewport.focused_chapter(FOCUS_BAND_PX).await {
            self.apply(SyncEvent::ScrollObserved { chapter_id });
        }
    }

    //=====================================================================================
    // User Actions
    //=====================================================================================

    fn open_verse(&mut self, chapter_id: u16, verse_number: u16) {
        self.ensure_scope(self.desired_scope(Some(chapter_id)));
        self.apply(SyncEvent::UserAction(UserAction::OpenVerse {
            chapter_id,
            verse_number,
            translator_id: self.session.active_translator,
        }));
    }

    async fn set_mode(&mut self, mode: ReadingMode) {
        if mode == self.session.preferences.reading_mode {
            return;
        }
        self.session.preferences.reading_mode = mode;
        self.persist_preferences().await;
        self.apply(SyncEvent::ModeChanged(mode));
        // The new mode reads a different scope; the rebuild drains whatever
        // the mode switch could not resolve against the old index.
        self.ensure_scope(self.desired_scope(None));
    }

    async fn set_translator(&mut self, translator_id: u32) {
        if self.session.active_translator == Some(translator_id) {
            return;
        }
        if !self
            .session
            .translators
            .iter()
            .any(|t| t.id == translator_id)
        {
            debug!(translator_id, "ignoring unknown translator");
            return;
        }
        self.session.active_translator = Some(translator_id);
        self.session.preferences.translator_id = Some(translator_id);
        self.persist_preferences().await;

        // The cached verse list belongs to the previous translator now.
        if let Some(scope) = self.session.loaded_scope {
            self.spawn_fetch(scope);
        }
    }

    fn filter_chapters(&mut self, input: &str) {
        let chapters = search::filter_chapters(&self.session.chapters, input)
            .into_iter()
            .map(Into::into)
            .collect();
        let _ = self
            .ui_tx
            .send(ServerMessage::ChapterCandidates { chapters });
    }

    fn list_verse_numbers(&mut self, chapter_name: String) {
        let verse_numbers = search::chapter_by_name(&self.session.chapters, &chapter_name)
            .map(|chapter| self.session.index.verse_numbers_in_chapter(chapter.id))
            .unwrap_or_default();
        let _ = self.ui_tx.send(ServerMessage::VerseNumbers {
            chapter_name,
            verse_numbers,
        });
    }

    fn quick_jump(&mut self, chapter_name: &str, verse_number: &str) {
        let resolved = search::resolve_submission(
            &self.session.chapters,
            &self.session.index,
            chapter_name,
            verse_number,
        )
        .map(|v| (v.chapter_id, v.verse_number));
        match resolved {
            Some((chapter_id, verse_number)) => self.open_verse(chapter_id, verse_number),
            None => debug!(chapter_name, verse_number, "quick jump did not resolve"),
        }
    }

    //=====================================================================================
    // Remote Search
    //=====================================================================================

    async fn search(&mut self, query: &str) {
        match self
            .app
            .content
            .search(query, &self.session.preferences.language)
            .await
        {
            Ok(hits) => {
                let hits = hits.iter().map(Into::into).collect();
                let _ = self.ui_tx.send(ServerMessage::SearchResults { hits });
            }
            Err(e) => {
                warn!(error = %e, "search failed");
                let _ = self.ui_tx.send(ServerMessage::FetchFailed {
                    message: e.to_string(),
                });
            }
        }
    }

    async fn random_verse(&mut self) {
        match self
            .app
            .content
            .random_verse(&self.session.preferences.language)
            .await
        {
            Ok(hit) => {
                let hit = hit.as_ref().map(Into::into);
                let _ = self.ui_tx.send(ServerMessage::RandomVerseReady { hit });
            }
            Err(e) => {
                warn!(error = %e, "random verse fetch failed");
                let _ = self.ui_tx.send(ServerMessage::FetchFailed {
                    message: e.to_string(),
                });
            }
        }
    }

    //=====================================================================================
    // Notes
    //=====================================================================================

    async fn save_note(&mut self, chapter_id: u16, verse_number: u16, content: String) {
        let chapter_name = match self.session.chapters.iter().find(|c| c.id == chapter_id) {
            Some(chapter) => chapter.name.clone(),
            None => {
                debug!(chapter_id, "ignoring note for an unknown chapter");
                return;
            }
        };
        let note = Note {
            id: Uuid::now_v7(),
            chapter_id,
            verse_number,
            chapter_name,
            content,
            created_at: Utc::now(),
        };
        if let Err(e) = self.session.notes.upsert(note).await {
            warn!(error = %e, "note kept in memory only");
        }
        let _ = self.ui_tx.send(ServerMessage::NoteSaved {
            chapter_id,
            verse_number,
        });
    }

    async fn delete_note(&mut self, chapter_id: u16, verse_number: u16) {
        if let Err(e) = self.session.notes.delete(chapter_id, verse_number).await {
            warn!(error = %e, "note deletion kept in memory only");
        }
        let _ = self.ui_tx.send(ServerMessage::NoteDeleted {
            chapter_id,
            verse_number,
        });
    }

    fn list_notes(&mut self, filter: Option<String>, sort_by: NoteSortKey, descending: bool) {
        let query = NoteQuery {
            filter,
            sort_by: match sort_by {
                NoteSortKey::CreatedAt => NoteSort::CreatedAt,
                NoteSortKey::VerseNumber => NoteSort::VerseNumber,
            },
            descending,
        };
        let groups = self
            .session
            .notes
            .grouped_by_chapter(&query)
            .into_iter()
            .map(|(chapter_name, notes)| NoteGroupPayload {
                chapter_name,
                notes: notes.into_iter().map(Into::into).collect(),
            })
            .collect();
        let _ = self.ui_tx.send(ServerMessage::Notes { groups });
    }

    //=====================================================================================
    // Verse Scope Fetching (last-request-wins)
    //=====================================================================================

    fn desired_scope(&self, target_chapter: Option<u16>) -> Scope {
        match self.session.preferences.reading_mode {
            ReadingMode::Paginated => Scope::Corpus,
            ReadingMode::PerChapter => Scope::Chapter(
                target_chapter.unwrap_or(self.session.sync.position().chapter_id),
            ),
        }
    }

    fn ensure_scope(&mut self, scope: Scope) {
        if self.session.loaded_scope == Some(scope) {
            return;
        }
        self.spawn_fetch(scope);
    }

    /// Starts a verse fetch for `scope` under a fresh generation tag. The
    /// corpus fans out one request per chapter and flattens, preserving
    /// chapter order.
    fn spawn_fetch(&mut self, scope: Scope) {
        self.session.fetch_generation += 1;
        let generation = self.session.fetch_generation;
        self.session.loaded_scope = Some(scope);
        let _ = self.ui_tx.send(ServerMessage::LoadingStarted);

        let chapter_ids: Vec<u16> = match scope {
            Scope::Corpus => self.session.chapters.iter().map(|c| c.id).collect(),
            Scope::Chapter(id) => vec![id],
        };
        let content = self.app.content.clone();
        let translator_id = self.session.active_translator;
        let tx = self.self_tx.clone();

        tokio::spawn(async move {
            let fetches = chapter_ids
                .iter()
                .map(|&id| content.fetch_chapter_verses(id, translator_id));
            let event = match futures::future::try_join_all(fetches).await {
                Ok(batches) => EngineEvent::VersesLoaded {
                    generation,
                    verses: batches.into_iter().flatten().collect(),
                },
                Err(e) => EngineEvent::FetchFailed {
                    generation,
                    message: e.to_string(),
                },
            };
            let _ = tx.send(event);
        });
    }

    fn verses_loaded(&mut self, generation: u64, verses: Vec<Verse>) {
        if generation != self.session.fetch_generation {
            debug!(generation, "discarding verses from a superseded fetch");
            return;
        }
        self.session.index = VerseIndex::build(verses);
        let effects = self.session.sync.index_rebuilt(&self.session.index);
        self.run_effects(effects);
        let _ = self.ui_tx.send(ServerMessage::ContentReady {
            verse_count: self.session.index.len(),
            max_page: self.session.index.max_page(),
        });
        let _ = self.ui_tx.send(ServerMessage::LoadingFinished);
        self.emit_position();
    }

    fn fetch_failed(&mut self, generation: u64, message: String) {
        if generation != self.session.fetch_generation {
            return;
        }
        // Last-known-good: the index and position stay where they are.
        warn!(message, "verse fetch failed");
        self.session.loaded_scope = None;
        let _ = self.ui_tx.send(ServerMessage::FetchFailed { message });
        let _ = self.ui_tx.send(ServerMessage::LoadingFinished);
    }

    //=====================================================================================
    // Transition Plumbing
    //=====================================================================================

    /// Feed one event to the synchronizer and execute what comes back. Route
    /// commands go out before the scroll request is queued, so the frontend
    /// never renders a position with a stale route.
    fn apply(&mut self, event: SyncEvent) {
        let effects = self.session.sync.apply(event, &self.session.index);
        self.run_effects(effects);
        self.emit_position();
    }

    fn run_effects(&mut self, effects: Vec<SideEffect>) {
        for effect in effects {
            match effect {
                SideEffect::PushRoute(route) => {
                    let _ = self.ui_tx.send(ServerMessage::RoutePushed {
                        path: route.to_string(),
                    });
                }
                SideEffect::ReplaceRoute(route) => {
                    let _ = self.ui_tx.send(ServerMessage::RouteReplaced {
                        path: route.to_string(),
                    });
                }
                SideEffect::ScrollTo(target) => self.scroll.request(target),
            }
        }
    }

    fn emit_position(&mut self) {
        let position = self.session.sync.position();
        if self.last_emitted.as_ref() == Some(position) {
            return;
        }
        self.last_emitted = Some(position.clone());
        let _ = self.ui_tx.send(ServerMessage::position(position));
    }

    async fn persist_preferences(&mut self) {
        if let Err(e) = self.app.store.save_preferences(&self.session.preferences).await {
            warn!(error = %e, "preferences kept in memory only");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use quran_reader_core::domain::{
        Chapter, Preferences, SearchHit, Translation, Translator, VerseKey,
    };
    use quran_reader_core::ports::{
        ContentService, LocalStore, PortError, ScrollTarget, Viewport,
    };
    use std::collections::HashSet;
    use std::sync::Mutex;

    fn chapter(id: u16, name: &str, page_number: u16) -> Chapter {
        Chapter {
            id,
            name: name.to_string(),
            name_en: name.to_string(),
            name_original: String::new(),
            slug: name.to_lowercase(),
            verse_count: 5,
            page_number,
            audio: None,
        }
    }

    fn verse(chapter_id: u16, verse_number: u16, page: u16, translator_id: u32) -> Verse {
        Verse {
            id: u64::from(chapter_id) * 1_000 + u64::from(verse_number),
            chapter_id,
            verse_number,
            page,
            juz_number: 1,
            text_original: String::new(),
            transcription: String::new(),
            transcription_en: String::new(),
            translation: Some(Translation {
                id: u64::from(translator_id),
                text: format!("{chapter_id}:{verse_number} by {translator_id}"),
                translator: Translator {
                    id: translator_id,
                    name: format!("Translator {translator_id}"),
                    language: "en".to_string(),
                    description: None,
                    url: None,
                },
                footnotes: Vec::new(),
            }),
        }
    }

    struct FakeContent;

    #[async_trait]
    impl ContentService for FakeContent {
        async fn fetch_chapters(&self) -> Result<Vec<Chapter>, PortError> {
            Ok(vec![chapter(1, "Fatiha", 1), chapter(2, "Bakara", 2)])
        }

        async fn fetch_chapter_verses(
            &self,
            chapter_id: u16,
            translator_id: Option<u32>,
        ) -> Result<Vec<Verse>, PortError> {
            let translator_id = translator_id.unwrap_or(0);
            let verses = match chapter_id {
                1 => (1..=3).map(|n| verse(1, n, 1, translator_id)).collect(),
                2 => (1..=5)
                    .map(|n| verse(2, n, if n <= 2 { 2 } else { 3 }, translator_id))
                    .collect(),
                _ => return Err(PortError::NotFound(format!("surah {chapter_id}"))),
            };
            Ok(verses)
        }

        async fn fetch_verse(
            &self,
            chapter_id: u16,
            verse_number: u16,
            translator_id: Option<u32>,
        ) -> Result<Verse, PortError> {
            Ok(verse(chapter_id, verse_number, 1, translator_id.unwrap_or(0)))
        }

        async fn fetch_translators(&self) -> Result<Vec<Translator>, PortError> {
            Ok(vec![
                Translator {
                    id: 10,
                    name: "English Translator".to_string(),
                    language: "en".to_string(),
                    description: None,
                    url: None,
                },
                Translator {
                    id: 20,
                    name: "Turkish Translator".to_string(),
                    language: "tr".to_string(),
                    description: None,
                    url: None,
                },
            ])
        }

        async fn search(&self, _query: &str, _language: &str) -> Result<Vec<SearchHit>, PortError> {
            Ok(Vec::new())
        }

        async fn random_verse(&self, _language: &str) -> Result<Option<SearchHit>, PortError> {
            Ok(None)
        }
    }

    #[derive(Default)]
    struct FakeStore {
        preferences: Mutex<Option<Preferences>>,
    }

    #[async_trait]
    impl LocalStore for FakeStore {
        async fn load_preferences(&self) -> Result<Preferences, PortError> {
            Ok(self.preferences.lock().unwrap().clone().unwrap_or_default())
        }

        async fn save_preferences(&self, preferences: &Preferences) -> Result<(), PortError> {
            *self.preferences.lock().unwrap() = Some(preferences.clone());
            Ok(())
        }

        async fn load_notes(&self) -> Result<Vec<Note>, PortError> {
            Ok(Vec::new())
        }

        async fn save_notes(&self, _notes: &[Note]) -> Result<(), PortError> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeViewport {
        rendered: Mutex<HashSet<ScrollTarget>>,
        render_everything: bool,
        focus: Mutex<Option<u16>>,
        scrolls: Mutex<Vec<ScrollTarget>>,
    }

    #[async_trait]
    impl Viewport for FakeViewport {
        async fn is_rendered(&self, target: ScrollTarget) -> bool {
            self.render_everything || self.rendered.lock().unwrap().contains(&target)
        }

        async fn scroll_into_view(&self, target: ScrollTarget) {
            self.scrolls.lock().unwrap().push(target);
        }

        async fn set_emphasis(&self, _target: ScrollTarget, _emphasized: bool) {}

        async fn focused_chapter(&self, _band_height: u32) -> Option<u16> {
            *self.focus.lock().unwrap()
        }
    }

    struct Harness {
        engine: ReaderEngine,
        rx: mpsc::UnboundedReceiver<EngineEvent>,
        ui_rx: mpsc::UnboundedReceiver<ServerMessage>,
        viewport: Arc<FakeViewport>,
    }

    impl Harness {
        async fn new(render_everything: bool) -> Self {
            let viewport = Arc::new(FakeViewport {
                render_everything,
                ..Default::default()
            });
            let app = Arc::new(AppState {
                content: Arc::new(FakeContent),
                store: Arc::new(FakeStore::default()),
                viewport: viewport.clone(),
            });
            let (self_tx, rx) = mpsc::unbounded_channel();
            let (ui_tx, ui_rx) = mpsc::unbounded_channel();
            let engine = ReaderEngine::new(app, self_tx, ui_tx).await.unwrap();
            Self {
                engine,
                rx,
                ui_rx,
                viewport,
            }
        }

        /// Feed the next spawned-fetch completion back into the engine.
        async fn pump_fetch(&mut self) {
            let event = self.rx.recv().await.expect("a fetch completion");
            self.engine.handle(event).await;
        }

        fn ui_messages(&mut self) -> Vec<ServerMessage> {
            let mut messages = Vec::new();
            while let Ok(message) = self.ui_rx.try_recv() {
                messages.push(message);
            }
            messages
        }
    }

    #[tokio::test(start_paused = true)]
    async fn deep_link_resolves_once_content_arrives() {
        let mut h = Harness::new(true).await;

        h.engine
            .handle(EngineEvent::Client(ClientMessage::Navigate {
                path: "/surah/2/verse/5".to_string(),
            }))
            .await;
        // The route transition is deferred until the chapter fetch lands.
        assert!(h.engine.session.sync.has_deferred());
        h.pump_fetch().await;

        let position = h.engine.session.sync.position();
        assert_eq!(position.mode, ReadingMode::PerChapter);
        assert_eq!(position.chapter_id, 2);
        assert_eq!(position.verse_number, Some(5));

        // Exactly one scroll request, and no route push for a route-driven
        // transition.
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(
            *h.viewport.scrolls.lock().unwrap(),
            vec![ScrollTarget::Verse(VerseKey {
                chapter_id: 2,
                verse_number: 5,
            })]
        );
        let messages = h.ui_messages();
        assert!(!messages
            .iter()
            .any(|m| matches!(m, ServerMessage::RoutePushed { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn superseded_fetch_results_are_discarded() {
        let mut h = Harness::new(true).await;

        h.engine
            .handle(EngineEvent::Client(ClientMessage::Navigate {
                path: "/surah/1".to_string(),
            }))
            .await;
        let stale = h.rx.recv().await.unwrap();

        // Switching translators mid-flight supersedes the first fetch.
        h.engine
            .handle(EngineEvent::Client(ClientMessage::SetTranslator {
                translator_id: 20,
            }))
            .await;

        h.engine.handle(stale).await;
        assert!(
            h.engine.session.index.is_empty(),
            "a stale response must not be applied"
        );

        h.pump_fetch().await;
        assert!(!h.engine.session.index.is_empty());
        let verse = h.engine.session.index.find_verse(1, 1).unwrap();
        assert_eq!(verse.translation.as_ref().unwrap().translator.id, 20);
    }

    #[tokio::test(start_paused = true)]
    async fn scroll_samples_are_ignored_while_the_controller_scrolls() {
        // Nothing renders, so the programmatic scroll stays in flight
        // retrying while the sample arrives.
        let mut h = Harness::new(false).await;
        h.engine
            .handle(EngineEvent::Client(ClientMessage::Navigate {
                path: "/surah/1".to_string(),
            }))
            .await;
        h.pump_fetch().await;
        assert!(h.engine.scroll.is_programmatic());

        *h.viewport.focus.lock().unwrap() = Some(2);
        h.engine.handle(EngineEvent::Client(ClientMessage::Scrolled)).await;
        assert_eq!(h.engine.session.sync.position().chapter_id, 1);

        // Once the controller gives up, user scrolling flows again.
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(!h.engine.scroll.is_programmatic());
        h.engine.handle(EngineEvent::Client(ClientMessage::Scrolled)).await;
        assert_eq!(h.engine.session.sync.position().chapter_id, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn quick_jump_resolves_and_pushes_the_route() {
        let mut h = Harness::new(true).await;
        h.engine
            .handle(EngineEvent::Client(ClientMessage::Navigate {
                path: "/".to_string(),
            }))
            .await;
        h.pump_fetch().await;
        h.ui_messages();

        h.engine
            .handle(EngineEvent::Client(ClientMessage::QuickJump {
                chapter_name: "Fatiha".to_string(),
                verse_number: "3".to_string(),
            }))
            .await;

        let position = h.engine.session.sync.position();
        assert_eq!(position.chapter_id, 1);
        assert_eq!(position.verse_number, Some(3));
        let messages = h.ui_messages();
        // The default translator for the preferred language rides along.
        assert!(messages.contains(&ServerMessage::RoutePushed {
            path: "/surah/1/verse/3/10".to_string(),
        }));

        // An unresolvable submission is a silent no-op.
        h.engine
            .handle(EngineEvent::Client(ClientMessage::QuickJump {
                chapter_name: "Nowhere".to_string(),
                verse_number: "1".to_string(),
            }))
            .await;
        assert_eq!(h.engine.session.sync.position().chapter_id, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn the_pickers_answer_from_catalogue_and_index() {
        let mut h = Harness::new(true).await;
        h.engine
            .handle(EngineEvent::Client(ClientMessage::Navigate {
                path: "/surah/1".to_string(),
            }))
            .await;
        h.pump_fetch().await;
        h.ui_messages();

        h.engine
            .handle(EngineEvent::Client(ClientMessage::FilterChapters {
                input: "fat".to_string(),
            }))
            .await;
        h.engine
            .handle(EngineEvent::Client(ClientMessage::ListVerseNumbers {
                chapter_name: "Fatiha".to_string(),
            }))
            .await;

        let messages = h.ui_messages();
        assert!(messages.iter().any(|m| matches!(
            m,
            ServerMessage::ChapterCandidates { chapters } if chapters.len() == 1 && chapters[0].id == 1
        )));
        assert!(messages.iter().any(|m| matches!(
            m,
            ServerMessage::VerseNumbers { verse_numbers, .. } if *verse_numbers == vec![1, 2, 3]
        )));
    }

    #[tokio::test(start_paused = true)]
    async fn mode_switch_refetches_the_corpus_scope() {
        let mut h = Harness::new(true).await;
        h.engine
            .handle(EngineEvent::Client(ClientMessage::Navigate {
                path: "/surah/2".to_string(),
            }))
            .await;
        h.pump_fetch().await;
        assert_eq!(h.engine.session.loaded_scope, Some(Scope::Chapter(2)));

        h.engine
            .handle(EngineEvent::Client(ClientMessage::SetMode {
                mode: crate::session::protocol::Mode::Paginated,
            }))
            .await;
        h.pump_fetch().await;

        assert_eq!(h.engine.session.loaded_scope, Some(Scope::Corpus));
        let position = h.engine.session.sync.position();
        assert_eq!(position.mode, ReadingMode::Paginated);
        assert_eq!(position.chapter_id, 2);
        assert_eq!(position.page_number, 2);
        // 3 verses of chapter 1 + 5 of chapter 2.
        assert_eq!(h.engine.session.index.len(), 8);
    }
}
