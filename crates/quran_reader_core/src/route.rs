//! crates/quran_reader_core/src/route.rs
//!
//! The small, fixed route grammar shared with the embedding frontend:
//!
//! ```text
//! /
//! /surah/{chapterId}
//! /surah/{chapterId}/verse/{verseNumber}
//! /surah/{chapterId}/verse/{verseNumber}/{translatorId}
//! ```

use std::fmt;
use std::str::FromStr;

/// A parsed deep link into the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Home,
    Chapter {
        chapter_id: u16,
    },
    Verse {
        chapter_id: u16,
        verse_number: u16,
        /// Present only when the link pins a specific translation.
        translator_id: Option<u32>,
    },
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Unrecognized route: {0}")]
pub struct RouteParseError(pub String);

impl FromStr for Route {
    type Err = RouteParseError;

    fn from_str(path: &str) -> Result<Self, Self::Err> {
        let segments: Vec<&str> = path
            .trim()
            .trim_start_matches('/')
            .trim_end_matches('/')
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();

        let unrecognized = || RouteParseError(path.to_string());

        match segments.as_slice() {
            [] => Ok(Route::Home),
            ["surah", chapter] => {
                let chapter_id = chapter.parse().map_err(|_| unrecognized())?;
                Ok(Route::Chapter { chapter_id })
            }
            ["surah", chapter, "verse", verse] => Ok(Route::Verse {
                chapter_id: chapter.parse().map_err(|_| unrecognized())?,
                verse_number: verse.parse().map_err(|_| unrecognized())?,
                translator_id: None,
            }),
            ["surah", chapter, "verse", verse, translator] => Ok(Route::Verse {
                chapter_id: chapter.parse().map_err(|_| unrecognized())?,
                verse_number: verse.parse().map_err(|_| unrecognized())?,
                translator_id: Some(translator.parse().map_err(|_| unrecognized())?),
            }),
            _ => Err(unrecognized()),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Home => write!(f, "/"),
            Route::Chapter { chapter_id } => write!(f, "/surah/{chapter_id}"),
            Route::Verse {
                chapter_id,
                verse_number,
                translator_id: None,
            } => write!(f, "/surah/{chapter_id}/verse/{verse_number}"),
            Route::Verse {
                chapter_id,
                verse_number,
                translator_id: Some(translator_id),
            } => write!(f, "/surah/{chapter_id}/verse/{verse_number}/{translator_id}"),
        }
    }
}
