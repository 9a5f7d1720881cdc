//! crates/quran_reader_core/src/sync.rs
//!
//! The reading position synchronizer: a reducer that reconciles the three
//! sources of truth for "where the user is": the route, the in-memory
//! [`ReadingPosition`] and the scroll-derived viewport focus.
//!
//! Side effects are returned as data, never performed inline, so the whole
//! state machine runs (and is tested) without a viewport or a router.
//! Within one `apply` call the position mutation and its route effect are
//! produced together; the caller must execute the effects before yielding,
//! queuing scroll requests after the route ones.

use crate::domain::{ReadingMode, ReadingPosition, VerseKey};
use crate::index::VerseIndex;
use crate::ports::ScrollTarget;
use crate::route::Route;

//=========================================================================================
// Events, Side Effects and States
//=========================================================================================

/// One signal from any of the three sources of truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncEvent {
    /// The address changed under us: initial load, link click, back/forward.
    RouteChanged(Route),
    /// A throttled sample of the chapter nearest the viewport's focus band,
    /// taken while the user (not the controller) is scrolling.
    ScrollObserved { chapter_id: u16 },
    UserAction(UserAction),
    ModeChanged(ReadingMode),
}

/// Explicit navigation. These are the only transitions that may push a new
/// route entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAction {
    /// Search-result, note or random-verse click.
    OpenVerse {
        chapter_id: u16,
        verse_number: u16,
        translator_id: Option<u32>,
    },
    OpenChapter {
        chapter_id: u16,
    },
    NextPage,
    PreviousPage,
    /// Manual page-number entry. Out-of-range pages are ignored, not clamped
    /// to the nearest bound.
    GoToPage(u16),
}

/// What the caller must do after a transition, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SideEffect {
    PushRoute(Route),
    /// History replacement, used only for stale-deep-link cleanup.
    ReplaceRoute(Route),
    ScrollTo(ScrollTarget),
}

/// Which signal last moved the position and is waiting to be consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Idle,
    Route,
    Scroll,
    User,
}

//=========================================================================================
// The Synchronizer
//=========================================================================================

#[derive(Debug)]
pub struct Synchronizer {
    position: ReadingPosition,
    origin: Origin,
    /// The route the address bar currently shows, tracked for cleanup.
    route: Option<Route>,
    /// A transition that named content absent from the index, parked until
    /// the next rebuild. Retried once, then dropped.
    deferred: Option<SyncEvent>,
}

impl Synchronizer {
    pub fn new(mode: ReadingMode) -> Self {
        Self {
            position: ReadingPosition::initial(mode),
            origin: Origin::Idle,
            route: None,
            deferred: None,
        }
    }

    pub fn position(&self) -> &ReadingPosition {
        &self.position
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    pub fn has_deferred(&self) -> bool {
        self.deferred.is_some()
    }

    /// Run one transition. Returns the side effects to execute, in order.
    pub fn apply(&mut self, event: SyncEvent, index: &VerseIndex) -> Vec<SideEffect> {
        self.transition(event, index, true)
    }

    /// The index was rebuilt (fetch completed, translator switched, scope
    /// changed). Re-applies the deferred transition, if any; a second
    /// resolution failure drops it silently.
    pub fn index_rebuilt(&mut self, index: &VerseIndex) -> Vec<SideEffect> {
        match self.deferred.take() {
            Some(event) => self.transition(event, index, false),
            None => Vec::new(),
        }
    }

    fn transition(
        &mut self,
        event: SyncEvent,
        index: &VerseIndex,
        allow_defer: bool,
    ) -> Vec<SideEffect> {
        match event {
            SyncEvent::RouteChanged(route) => {
                self.route = Some(route);
                match route {
                    Route::Home => Vec::new(),
                    Route::Chapter { chapter_id } => {
                        self.navigate(event, chapter_id, None, index, allow_defer, None)
                    }
                    Route::Verse {
                        chapter_id,
                        verse_number,
                        ..
                    } => self.navigate(
                        event,
                        chapter_id,
                        Some(verse_number),
                        index,
                        allow_defer,
                        None,
                    ),
                }
            }
            SyncEvent::ScrollObserved { chapter_id } => self.observe_scroll(chapter_id, index),
            SyncEvent::UserAction(action) => self.user_action(event, action, index, allow_defer),
            SyncEvent::ModeChanged(mode) => self.switch_mode(event, mode, index, allow_defer),
        }
    }

    /// Route → position and user-driven verse/chapter opening share the same
    /// resolution: find the target in the index, derive the position in the
    /// current mode's terms, equality-guard, scroll. `push` carries the route
    /// to push for explicit navigation (route-originated transitions never
    /// push).
    fn navigate(
        &mut self,
        event: SyncEvent,
        chapter_id: u16,
        verse_number: Option<u16>,
        index: &VerseIndex,
        allow_defer: bool,
        push: Option<Route>,
    ) -> Vec<SideEffect> {
        let resolved = self.resolve(chapter_id, verse_number, self.position.mode, index);
        let (position, target) = match resolved {
            Some(resolved) => resolved,
            None => {
                if allow_defer {
                    self.deferred = Some(event);
                }
                return Vec::new();
            }
        };

        let explicit = push.is_some();
        // The primary anti-loop guard: an already-satisfied route is consumed
        // without a second scroll. Explicit actions re-pulse even in place.
        if !explicit && position == self.position {
            return Vec::new();
        }

        self.position = position;
        self.origin = if explicit { Origin::User } else { Origin::Route };

        let mut effects = Vec::new();
        if let Some(route) = push {
            self.route = Some(route);
            effects.push(SideEffect::PushRoute(route));
        }
        effects.push(SideEffect::ScrollTo(target));
        effects
    }

    /// Derive the position a (chapter, optional verse) target resolves to in
    /// `mode`. `None` when the index does not hold the target yet.
    fn resolve(
        &self,
        chapter_id: u16,
        verse_number: Option<u16>,
        mode: ReadingMode,
        index: &VerseIndex,
    ) -> Option<(ReadingPosition, ScrollTarget)> {
        let anchor = match verse_number {
            Some(n) => index.find_verse(chapter_id, n)?,
            None => index.first_verse_of_chapter(chapter_id)?,
        };

        let position = ReadingPosition {
            mode,
            // Authoritative in paginated mode, merely derived in per-chapter.
            page_number: anchor.page,
            chapter_id,
            verse_number,
        };
        let target = match verse_number {
            Some(n) => ScrollTarget::Verse(VerseKey {
                chapter_id,
                verse_number: n,
            }),
            None => ScrollTarget::ChapterTop(chapter_id),
        };
        Some((position, target))
    }

    /// Scroll → position: a pure observe-and-record step. Never scrolls and
    /// never pushes a route; the page does not change from scrolling alone.
    fn observe_scroll(&mut self, chapter_id: u16, index: &VerseIndex) -> Vec<SideEffect> {
        if chapter_id == self.position.chapter_id {
            return Vec::new();
        }

        self.position.chapter_id = chapter_id;
        self.position.verse_number = None;
        self.origin = Origin::Scroll;
        self.cleanup_stale_deep_link(index).into_iter().collect()
    }

    fn user_action(
        &mut self,
        event: SyncEvent,
        action: UserAction,
        index: &VerseIndex,
        allow_defer: bool,
    ) -> Vec<SideEffect> {
        match action {
            UserAction::OpenVerse {
                chapter_id,
                verse_number,
                translator_id,
            } => {
                let route = Route::Verse {
                    chapter_id,
                    verse_number,
                    translator_id,
                };
                self.navigate(
                    event,
                    chapter_id,
                    Some(verse_number),
                    index,
                    allow_defer,
                    Some(route),
                )
            }
            UserAction::OpenChapter { chapter_id } => self.navigate(
                event,
                chapter_id,
                None,
                index,
                allow_defer,
                Some(Route::Chapter { chapter_id }),
            ),
            UserAction::NextPage => {
                match self.position.page_number.checked_add(1) {
                    Some(page) => self.go_to_page(page, index),
                    None => Vec::new(),
                }
            }
            UserAction::PreviousPage => match self.position.page_number.checked_sub(1) {
                Some(page) => self.go_to_page(page, index),
                None => Vec::new(),
            },
            UserAction::GoToPage(page) => self.go_to_page(page, index),
        }
    }

    /// Pagination is clamped, not wrapped: anything outside `[0, max_page]`
    /// is a no-op. Page changes scroll to the page top and never push a
    /// route; an active verse deep link that stops matching is cleaned up.
    fn go_to_page(&mut self, page: u16, index: &VerseIndex) -> Vec<SideEffect> {
        if self.position.mode != ReadingMode::Paginated || page > index.max_page() {
            return Vec::new();
        }

        let mut position = self.position.clone();
        position.page_number = page;
        position.verse_number = None;
        // Page 0 is the empty start page; the chapter focus stays put there.
        if let Some(first) = index.first_verse_on_page(page) {
            position.chapter_id = first.chapter_id;
        }

        if position == self.position {
            return Vec::new();
        }

        self.position = position;
        self.origin = Origin::User;

        let mut effects: Vec<SideEffect> =
            self.cleanup_stale_deep_link(index).into_iter().collect();
        effects.push(SideEffect::ScrollTo(ScrollTarget::PageTop(page)));
        effects
    }

    /// Mode switch re-derives the position from the current chapter/verse in
    /// the new mode's terms: the page is recomputed when entering paginated
    /// mode and becomes advisory when leaving it.
    fn switch_mode(
        &mut self,
        event: SyncEvent,
        mode: ReadingMode,
        index: &VerseIndex,
        allow_defer: bool,
    ) -> Vec<SideEffect> {
        if mode == self.position.mode {
            return Vec::new();
        }

        let resolved = self.resolve(
            self.position.chapter_id,
            self.position.verse_number,
            mode,
            index,
        );
        let (position, target) = match resolved {
            Some(resolved) => resolved,
            None => {
                if allow_defer {
                    self.deferred = Some(event);
                }
                return Vec::new();
            }
        };

        self.position = position;
        self.origin = Origin::User;
        vec![SideEffect::ScrollTo(target)]
    }

    /// A verse deep link shown in the address bar while in paginated mode
    /// must keep matching the resolved page and chapter; once it stops, the
    /// route is reset to `/`.
    fn cleanup_stale_deep_link(&mut self, index: &VerseIndex) -> Option<SideEffect> {
        if self.position.mode != ReadingMode::Paginated {
            return None;
        }
        let (chapter_id, verse_number) = match self.route {
            Some(Route::Verse {
                chapter_id,
                verse_number,
                ..
            }) => (chapter_id, verse_number),
            _ => return None,
        };

        let still_matches = index
            .find_verse(chapter_id, verse_number)
            .map(|v| {
                v.page == self.position.page_number && chapter_id == self.position.chapter_id
            })
            .unwrap_or(false);
        if still_matches {
            return None;
        }

        self.route = Some(Route::Home);
        Some(SideEffect::ReplaceRoute(Route::Home))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::verse;

    fn corpus() -> VerseIndex {
        // Pages: 1 -> ch1 v1..v2, 2 -> ch1 v3 + ch2 v1..v2, 3 -> ch2 v3..v5.
        VerseIndex::build(vec![
            verse(1, 1, 1),
            verse(1, 2, 1),
            verse(1, 3, 2),
            verse(2, 1, 2),
            verse(2, 2, 2),
            verse(2, 3, 3),
            verse(2, 4, 3),
            verse(2, 5, 3),
        ])
    }

    #[test]
    fn route_to_position_resolves_a_verse_page() {
        let index = corpus();
        let mut sync = Synchronizer::new(ReadingMode::Paginated);

        let effects = sync.apply(
            SyncEvent::RouteChanged(Route::Verse {
                chapter_id: 2,
                verse_number: 3,
                translator_id: None,
            }),
            &index,
        );

        assert_eq!(
            sync.position(),
            &ReadingPosition {
                mode: ReadingMode::Paginated,
                page_number: 3,
                chapter_id: 2,
                verse_number: Some(3),
            }
        );
        assert_eq!(
            effects,
            vec![SideEffect::ScrollTo(ScrollTarget::Verse(VerseKey {
                chapter_id: 2,
                verse_number: 3,
            }))]
        );
        assert_eq!(sync.origin(), Origin::Route);
    }

    #[test]
    fn applying_the_same_route_twice_is_idempotent() {
        let index = corpus();
        let mut sync = Synchronizer::new(ReadingMode::Paginated);
        let route = Route::Verse {
            chapter_id: 2,
            verse_number: 3,
            translator_id: None,
        };

        let first = sync.apply(SyncEvent::RouteChanged(route), &index);
        let position = sync.position().clone();
        let second = sync.apply(SyncEvent::RouteChanged(route), &index);

        assert_eq!(first.len(), 1);
        assert!(second.is_empty(), "equality guard must suppress the rescroll");
        assert_eq!(sync.position(), &position);
    }

    #[test]
    fn deep_link_in_per_chapter_mode_scrolls_exactly_once() {
        let index = corpus();
        let mut sync = Synchronizer::new(ReadingMode::PerChapter);

        let effects = sync.apply(
            SyncEvent::RouteChanged(Route::Verse {
                chapter_id: 2,
                verse_number: 5,
                translator_id: None,
            }),
            &index,
        );

        assert_eq!(sync.position().mode, ReadingMode::PerChapter);
        assert_eq!(sync.position().chapter_id, 2);
        assert_eq!(sync.position().verse_number, Some(5));
        let scrolls = effects
            .iter()
            .filter(|e| matches!(e, SideEffect::ScrollTo(_)))
            .count();
        assert_eq!(scrolls, 1);
    }

    #[test]
    fn requesting_a_chapter_resolves_to_its_first_page() {
        // The §8 scenario: pages [{1: ch1}, {2: ch1, ch2}].
        let index = VerseIndex::build(vec![
            verse(1, 1, 1),
            verse(1, 2, 2),
            verse(2, 1, 2),
        ]);
        let mut sync = Synchronizer::new(ReadingMode::Paginated);

        sync.apply(
            SyncEvent::RouteChanged(Route::Chapter { chapter_id: 2 }),
            &index,
        );

        assert_eq!(sync.position().page_number, 2);
        assert_eq!(sync.position().chapter_id, 2);
    }

    #[test]
    fn every_valid_page_lands_on_its_first_verse_chapter() {
        let index = corpus();
        for page in 1..=index.max_page() {
            let mut sync = Synchronizer::new(ReadingMode::Paginated);
            sync.apply(SyncEvent::UserAction(UserAction::GoToPage(page)), &index);

            assert_eq!(sync.position().page_number, page);
            assert_eq!(
                sync.position().chapter_id,
                index.first_verse_on_page(page).unwrap().chapter_id
            );
        }
    }

    #[test]
    fn pagination_is_clamped_not_wrapped() {
        let index = corpus();
        let mut sync = Synchronizer::new(ReadingMode::Paginated);

        let past_end = sync.apply(
            SyncEvent::UserAction(UserAction::GoToPage(index.max_page() + 1)),
            &index,
        );
        assert!(past_end.is_empty());
        assert_eq!(sync.position().page_number, 0);

        let before_start = sync.apply(SyncEvent::UserAction(UserAction::PreviousPage), &index);
        assert!(before_start.is_empty());
        assert_eq!(sync.position().page_number, 0);
    }

    #[test]
    fn page_stepping_scrolls_to_the_page_top() {
        let index = corpus();
        let mut sync = Synchronizer::new(ReadingMode::Paginated);

        let effects = sync.apply(SyncEvent::UserAction(UserAction::NextPage), &index);

        assert_eq!(sync.position().page_number, 1);
        assert_eq!(effects, vec![SideEffect::ScrollTo(ScrollTarget::PageTop(1))]);
    }

    #[test]
    fn page_changes_are_noops_in_per_chapter_mode() {
        let index = corpus();
        let mut sync = Synchronizer::new(ReadingMode::PerChapter);

        assert!(sync
            .apply(SyncEvent::UserAction(UserAction::NextPage), &index)
            .is_empty());
        assert_eq!(sync.position().page_number, 0);
    }

    #[test]
    fn mode_switch_round_trip_preserves_the_chapter() {
        let index = corpus();
        let mut sync = Synchronizer::new(ReadingMode::PerChapter);
        sync.apply(
            SyncEvent::RouteChanged(Route::Chapter { chapter_id: 2 }),
            &index,
        );

        sync.apply(SyncEvent::ModeChanged(ReadingMode::Paginated), &index);
        assert_eq!(sync.position().mode, ReadingMode::Paginated);
        assert_eq!(sync.position().page_number, 2);

        sync.apply(SyncEvent::ModeChanged(ReadingMode::PerChapter), &index);
        assert_eq!(sync.position().mode, ReadingMode::PerChapter);
        assert_eq!(sync.position().chapter_id, 2);
    }

    #[test]
    fn scroll_observation_records_without_scrolling() {
        let index = corpus();
        let mut sync = Synchronizer::new(ReadingMode::Paginated);
        sync.apply(SyncEvent::UserAction(UserAction::GoToPage(2)), &index);

        let effects = sync.apply(SyncEvent::ScrollObserved { chapter_id: 2 }, &index);

        assert_eq!(sync.position().chapter_id, 2);
        assert_eq!(sync.position().page_number, 2, "page must not change from scrolling");
        assert!(effects.is_empty());
        assert_eq!(sync.origin(), Origin::Scroll);
    }

    #[test]
    fn scrolling_away_from_a_deep_link_resets_the_route() {
        let index = corpus();
        let mut sync = Synchronizer::new(ReadingMode::Paginated);
        sync.apply(
            SyncEvent::RouteChanged(Route::Verse {
                chapter_id: 1,
                verse_number: 3,
                translator_id: None,
            }),
            &index,
        );

        let effects = sync.apply(SyncEvent::ScrollObserved { chapter_id: 2 }, &index);

        assert_eq!(effects, vec![SideEffect::ReplaceRoute(Route::Home)]);
    }

    #[test]
    fn paging_away_from_a_deep_link_resets_the_route() {
        let index = corpus();
        let mut sync = Synchronizer::new(ReadingMode::Paginated);
        sync.apply(
            SyncEvent::RouteChanged(Route::Verse {
                chapter_id: 1,
                verse_number: 1,
                translator_id: None,
            }),
            &index,
        );

        let effects = sync.apply(SyncEvent::UserAction(UserAction::NextPage), &index);

        assert_eq!(
            effects,
            vec![
                SideEffect::ReplaceRoute(Route::Home),
                SideEffect::ScrollTo(ScrollTarget::PageTop(2)),
            ]
        );
    }

    #[test]
    fn open_verse_pushes_the_route_before_the_scroll() {
        let index = corpus();
        let mut sync = Synchronizer::new(ReadingMode::Paginated);

        let effects = sync.apply(
            SyncEvent::UserAction(UserAction::OpenVerse {
                chapter_id: 1,
                verse_number: 3,
                translator_id: Some(105),
            }),
            &index,
        );

        assert_eq!(
            effects,
            vec![
                SideEffect::PushRoute(Route::Verse {
                    chapter_id: 1,
                    verse_number: 3,
                    translator_id: Some(105),
                }),
                SideEffect::ScrollTo(ScrollTarget::Verse(VerseKey {
                    chapter_id: 1,
                    verse_number: 3,
                })),
            ]
        );
        assert_eq!(sync.origin(), Origin::User);
    }

    #[test]
    fn unresolvable_targets_defer_until_the_index_rebuild() {
        let mut sync = Synchronizer::new(ReadingMode::PerChapter);
        let empty = VerseIndex::empty();

        let effects = sync.apply(
            SyncEvent::RouteChanged(Route::Verse {
                chapter_id: 2,
                verse_number: 5,
                translator_id: None,
            }),
            &empty,
        );
        assert!(effects.is_empty());
        assert!(sync.has_deferred());
        assert_eq!(sync.position().chapter_id, 1, "position held until resolvable");

        let effects = sync.index_rebuilt(&corpus());
        assert!(!sync.has_deferred());
        assert_eq!(sync.position().chapter_id, 2);
        assert_eq!(sync.position().verse_number, Some(5));
        assert_eq!(effects.len(), 1);
    }

    #[test]
    fn a_deferred_transition_is_retried_only_once() {
        let mut sync = Synchronizer::new(ReadingMode::PerChapter);
        let empty = VerseIndex::empty();

        sync.apply(
            SyncEvent::RouteChanged(Route::Chapter { chapter_id: 99 }),
            &empty,
        );
        assert!(sync.has_deferred());

        // The rebuild still lacks chapter 99: a resolution miss, dropped.
        let effects = sync.index_rebuilt(&corpus());
        assert!(effects.is_empty());
        assert!(!sync.has_deferred());
        assert_eq!(sync.position().chapter_id, 1);
    }

    #[test]
    fn home_route_leaves_the_position_alone() {
        let index = corpus();
        let mut sync = Synchronizer::new(ReadingMode::Paginated);
        sync.apply(SyncEvent::UserAction(UserAction::GoToPage(3)), &index);
        let before = sync.position().clone();

        let effects = sync.apply(SyncEvent::RouteChanged(Route::Home), &index);

        assert!(effects.is_empty());
        assert_eq!(sync.position(), &before);
    }
}
