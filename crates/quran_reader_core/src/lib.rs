pub mod domain;
pub mod index;
pub mod notes;
pub mod ports;
pub mod route;
pub mod search;
pub mod sync;

#[cfg(test)]
pub(crate) mod testing;

pub use domain::{
    AudioTrack, Chapter, Footnote, Note, Preferences, ReadingMode, ReadingPosition, SearchHit,
    Translation, Translator, Verse, VerseKey,
};
pub use index::VerseIndex;
pub use notes::{AnnotationStore, NoteQuery, NoteSort};
pub use ports::{ContentService, LocalStore, PortError, PortResult, ScrollTarget, Viewport};
pub use route::Route;
pub use sync::{Origin, SideEffect, SyncEvent, Synchronizer, UserAction};
