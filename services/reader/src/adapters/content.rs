//! services/reader/src/adapters/content.rs
//!
//! This module contains the content provider adapter, which is the concrete
//! implementation of the `ContentService` port from the `core` crate. It
//! speaks the provider's REST dialect over `reqwest` and maps the JSON
//! envelopes onto the pure domain types.

use async_trait::async_trait;
use quran_reader_core::domain::{
    AudioTrack, Chapter, Footnote, SearchHit, Translation, Translator, Verse,
};
use quran_reader_core::ports::{ContentService, PortError, PortResult};
use serde::de::DeserializeOwned;
use serde::Deserialize;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A content adapter that implements the `ContentService` port against the
/// provider's REST API.
#[derive(Clone)]
pub struct RestContentAdapter {
    client: reqwest::Client,
    base_url: String,
}

impl RestContentAdapter {
    /// Creates a new `RestContentAdapter`. The base url must not end with a
    /// slash.
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Fetches one JSON document. Non-2xx responses become `PortError`s; the
    /// caller decides how to degrade.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> PortResult<T> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(PortError::NotFound(url));
        }
        let response = response
            .error_for_status()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        response
            .json::<T>()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))
    }
}

//=========================================================================================
// "Impure" Wire Record Structs
//=========================================================================================

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Deserialize)]
struct AudioRecord {
    mp3: String,
    duration: u32,
    mp3_en: String,
    duration_en: u32,
}
impl AudioRecord {
    fn to_domain(self) -> AudioTrack {
        AudioTrack {
            mp3: self.mp3,
            duration: self.duration,
            mp3_en: self.mp3_en,
            duration_en: self.duration_en,
        }
    }
}

#[derive(Deserialize)]
struct ChapterRecord {
    id: u16,
    name: String,
    name_en: String,
    name_original: String,
    slug: String,
    verse_count: u16,
    page_number: u16,
    audio: Option<AudioRecord>,
}
impl ChapterRecord {
    fn to_domain(self) -> Chapter {
        Chapter {
            id: self.id,
            name: self.name,
            name_en: self.name_en,
            name_original: self.name_original,
            slug: self.slug,
            verse_count: self.verse_count,
            page_number: self.page_number,
            audio: self.audio.map(AudioRecord::to_domain),
        }
    }
}

#[derive(Deserialize)]
struct TranslatorRecord {
    id: u32,
    name: String,
    language: String,
    description: Option<String>,
    url: Option<String>,
}
impl TranslatorRecord {
    fn to_domain(self) -> Translator {
        Translator {
            id: self.id,
            name: self.name,
            language: self.language,
            description: self.description,
            url: self.url,
        }
    }
}

#[derive(Deserialize)]
struct FootnoteRecord {
    id: u64,
    number: u16,
    text: String,
}

#[derive(Deserialize)]
struct TranslationRecord {
    id: u64,
    text: String,
    author: TranslatorRecord,
    footnotes: Option<Vec<FootnoteRecord>>,
}
impl TranslationRecord {
    fn to_domain(self) -> Translation {
        let mut footnotes: Vec<Footnote> = self
            .footnotes
            .unwrap_or_default()
            .into_iter()
            .map(|f| Footnote {
                id: f.id,
                number: f.number,
                text: f.text,
            })
            .collect();
        footnotes.sort_by_key(|f| f.number);
        Translation {
            id: self.id,
            text: self.text,
            translator: self.author.to_domain(),
            footnotes,
        }
    }
}

#[derive(Deserialize)]
struct VerseRecord {
    id: u64,
    surah_id: u16,
    verse_number: u16,
    page: u16,
    juz_number: u8,
    verse: String,
    transcription: String,
    #[serde(default)]
    transcription_en: String,
    translation: Option<TranslationRecord>,
}
impl VerseRecord {
    fn to_domain(self) -> Verse {
        Verse {
            id: self.id,
            chapter_id: self.surah_id,
            verse_number: self.verse_number,
            page: self.page,
            juz_number: self.juz_number,
            text_original: self.verse,
            transcription: self.transcription,
            transcription_en: self.transcription_en,
            translation: self.translation.map(TranslationRecord::to_domain),
        }
    }
}

#[derive(Deserialize)]
struct ChapterVersesRecord {
    verses: Vec<VerseRecord>,
}

#[derive(Deserialize)]
struct SearchHitChapterRecord {
    id: u16,
    name: String,
    name_en: String,
    audio: Option<AudioRecord>,
}

#[derive(Deserialize)]
struct SearchHitVerseRecord {
    id: u64,
    page: u16,
    verse: String,
    verse_number: u16,
    transcription: String,
    #[serde(default)]
    transcription_en: String,
}

#[derive(Deserialize)]
struct FormattedRecord {
    text: String,
}

#[derive(Deserialize)]
struct SearchHitRecord {
    text: String,
    surah: SearchHitChapterRecord,
    verse: SearchHitVerseRecord,
    #[serde(rename = "_formatted")]
    formatted: Option<FormattedRecord>,
}
impl SearchHitRecord {
    fn to_domain(self) -> SearchHit {
        SearchHit {
            text: self.text,
            formatted_text: self.formatted.map(|f| f.text),
            chapter_id: self.surah.id,
            chapter_name: self.surah.name,
            chapter_name_en: self.surah.name_en,
            chapter_audio: self.surah.audio.map(AudioRecord::to_domain),
            verse_id: self.verse.id,
            verse_number: self.verse.verse_number,
            page: self.verse.page,
            text_original: self.verse.verse,
            transcription: self.verse.transcription,
            transcription_en: self.verse.transcription_en,
        }
    }
}

#[derive(Deserialize)]
struct SearchDataRecord {
    hits: Vec<SearchHitRecord>,
}

//=========================================================================================
// `ContentService` Trait Implementation
//=========================================================================================

fn author_query(translator_id: Option<u32>) -> Vec<(&'static str, String)> {
    translator_id
        .map(|id| vec![("author", id.to_string())])
        .unwrap_or_default()
}

#[async_trait]
impl ContentService for RestContentAdapter {
    async fn fetch_chapters(&self) -> PortResult<Vec<Chapter>> {
        let envelope: Envelope<Vec<ChapterRecord>> = self.get_json("/surahs", &[]).await?;
        Ok(envelope
            .data
            .into_iter()
            .map(ChapterRecord::to_domain)
            .collect())
    }

    async fn fetch_chapter_verses(
        &self,
        chapter_id: u16,
        translator_id: Option<u32>,
    ) -> PortResult<Vec<Verse>> {
        let envelope: Envelope<ChapterVersesRecord> = self
            .get_json(&format!("/surah/{chapter_id}"), &author_query(translator_id))
            .await?;
        Ok(envelope
            .data
            .verses
            .into_iter()
            .map(VerseRecord::to_domain)
            .collect())
    }

    async fn fetch_verse(
        &self,
        chapter_id: u16,
        verse_number: u16,
        translator_id: Option<u32>,
    ) -> PortResult<Verse> {
        let envelope: Envelope<VerseRecord> = self
            .get_json(
                &format!("/surah/{chapter_id}/verse/{verse_number}"),
                &author_query(translator_id),
            )
            .await?;
        Ok(envelope.data.to_domain())
    }

    async fn fetch_translators(&self) -> PortResult<Vec<Translator>> {
        let envelope: Envelope<Vec<TranslatorRecord>> = self.get_json("/authors", &[]).await?;
        Ok(envelope
            .data
            .into_iter()
            .map(TranslatorRecord::to_domain)
            .collect())
    }

    async fn search(&self, query: &str, language: &str) -> PortResult<Vec<SearchHit>> {
        let envelope: Envelope<SearchDataRecord> = self
            .get_json(
                "/search",
                &[
                    ("q", query.to_string()),
                    ("type", "quick".to_string()),
                    ("lang", language.to_string()),
                ],
            )
            .await?;
        Ok(envelope
            .data
            .hits
            .into_iter()
            .map(SearchHitRecord::to_domain)
            .collect())
    }

    async fn random_verse(&self, language: &str) -> PortResult<Option<SearchHit>> {
        let envelope: Envelope<SearchDataRecord> = self
            .get_json("/random-search", &[("lang", language.to_string())])
            .await?;
        Ok(envelope
            .data
            .hits
            .into_iter()
            .next()
            .map(SearchHitRecord::to_domain))
    }
}
