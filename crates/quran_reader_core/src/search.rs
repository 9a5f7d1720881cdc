//! crates/quran_reader_core/src/search.rs
//!
//! Chapter-name autocomplete and (chapter, verse-number) resolution for the
//! quick-jump picker. Remote full-text search lives behind the
//! [`crate::ports::ContentService`] port; this module only narrows local
//! candidates and resolves a submission against the live index.

use crate::domain::{Chapter, Verse};
use crate::index::VerseIndex;

/// Chapters whose localized name contains `input`, case-insensitively.
/// Empty input leaves the candidate set unfiltered.
pub fn filter_chapters<'a>(chapters: &'a [Chapter], input: &str) -> Vec<&'a Chapter> {
    let needle = input.trim().to_lowercase();
    if needle.is_empty() {
        return chapters.iter().collect();
    }
    chapters
        .iter()
        .filter(|c| c.name.to_lowercase().contains(&needle))
        .collect()
}

/// The chapter picked from the dropdown: an exact (case-insensitive) name
/// match, the way the picker commits a selection.
pub fn chapter_by_name<'a>(chapters: &'a [Chapter], name: &str) -> Option<&'a Chapter> {
    let name = name.trim();
    chapters.iter().find(|c| c.name.eq_ignore_ascii_case(name))
}

/// Resolve a picker submission to a concrete verse. Any miss (unknown
/// chapter name, unparsable or absent verse number) is `None`; the caller
/// treats it as a silent no-op.
pub fn resolve_submission<'a>(
    chapters: &[Chapter],
    index: &'a VerseIndex,
    chapter_name: &str,
    verse_number: &str,
) -> Option<&'a Verse> {
    let chapter = chapter_by_name(chapters, chapter_name)?;
    let verse_number: u16 = verse_number.trim().parse().ok()?;
    index.find_verse(chapter.id, verse_number)
}
