//! crates/quran_reader_core/src/testing.rs
//!
//! Fixture helpers shared by the crate's unit tests.

use crate::domain::Verse;

/// A minimal verse for index/synchronizer tests; the id encodes the key so
/// fixtures stay unique without bookkeeping.
pub fn verse(chapter_id: u16, verse_number: u16, page: u16) -> Verse {
    Verse {
        id: u64::from(chapter_id) * 1_000 + u64::from(verse_number),
        chapter_id,
        verse_number,
        page,
        juz_number: 1,
        text_original: format!("verse {chapter_id}:{verse_number}"),
        transcription: String::new(),
        transcription_en: String::new(),
        translation: None,
    }
}
