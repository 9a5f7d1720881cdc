//! services/reader/src/adapters/store.rs
//!
//! This module contains the local storage adapter, the concrete
//! implementation of the `LocalStore` port. Each persisted collection lives
//! in one JSON document under the data directory and is rewritten whole on
//! every mutation, through a temp-file rename so a failed write never leaves
//! a half-document behind.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quran_reader_core::domain::{Note, Preferences, ReadingMode};
use quran_reader_core::ports::{LocalStore, PortError, PortResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

const PREFERENCES_FILE: &str = "preferences.json";
const NOTES_FILE: &str = "notes.json";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A storage adapter that implements the `LocalStore` port over JSON files.
#[derive(Clone)]
pub struct JsonFileStore {
    data_dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    async fn load_document<T: DeserializeOwned + Default>(&self, file: &str) -> PortResult<T> {
        let path = self.data_dir.join(file);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            // Never saved yet: the empty/default collection.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(T::default()),
            Err(e) => return Err(PortError::Unexpected(e.to_string())),
        };
        serde_json::from_slice(&bytes)
            .map_err(|e| PortError::Unexpected(format!("{}: {}", path.display(), e)))
    }

    async fn save_document<T: Serialize>(&self, file: &str, document: &T) -> PortResult<()> {
        let bytes = serde_json::to_vec_pretty(document)
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        tokio::fs::create_dir_all(&self.data_dir)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let path = self.data_dir.join(file);
        let tmp = self.data_dir.join(format!("{file}.tmp"));
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))
    }
}

//=========================================================================================
// "Impure" Document Record Structs
//=========================================================================================

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ReadingModeRecord {
    Paginated,
    PerChapter,
}

impl ReadingModeRecord {
    fn to_domain(&self) -> ReadingMode {
        match self {
            ReadingModeRecord::Paginated => ReadingMode::Paginated,
            ReadingModeRecord::PerChapter => ReadingMode::PerChapter,
        }
    }

    fn from_domain(mode: ReadingMode) -> Self {
        match mode {
            ReadingMode::Paginated => ReadingModeRecord::Paginated,
            ReadingMode::PerChapter => ReadingModeRecord::PerChapter,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct PreferencesRecord {
    language: String,
    dark_mode: bool,
    reading_mode: ReadingModeRecord,
    translator_id: Option<u32>,
    language_chosen: bool,
}

impl Default for PreferencesRecord {
    fn default() -> Self {
        Self::from_domain(&Preferences::default())
    }
}

impl PreferencesRecord {
    fn to_domain(self) -> Preferences {
        Preferences {
            language: self.language,
            dark_mode: self.dark_mode,
            reading_mode: self.reading_mode.to_domain(),
            translator_id: self.translator_id,
            language_chosen: self.language_chosen,
        }
    }

    fn from_domain(preferences: &Preferences) -> Self {
        Self {
            language: preferences.language.clone(),
            dark_mode: preferences.dark_mode,
            reading_mode: ReadingModeRecord::from_domain(preferences.reading_mode),
            translator_id: preferences.translator_id,
            language_chosen: preferences.language_chosen,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct NoteRecord {
    id: Uuid,
    chapter_id: u16,
    verse_number: u16,
    chapter_name: String,
    content: String,
    created_at: DateTime<Utc>,
}

impl NoteRecord {
    fn to_domain(self) -> Note {
        Note {
            id: self.id,
            chapter_id: self.chapter_id,
            verse_number: self.verse_number,
            chapter_name: self.chapter_name,
            content: self.content,
            created_at: self.created_at,
        }
    }

    fn from_domain(note: &Note) -> Self {
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

//=========================================================================================
// `LocalStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl LocalStore for JsonFileStore {
    async fn load_preferences(&self) -> PortResult<Preferences> {
        let record: PreferencesRecord = self.load_document(PREFERENCES_FILE).await?;
        Ok(record.to_domain())
    }

    async fn save_preferences(&self, preferences: &Preferences) -> PortResult<()> {
        self.save_document(PREFERENCES_FILE, &PreferencesRecord::from_domain(preferences))
            .await
    }

    async fn load_notes(&self) -> PortResult<Vec<Note>> {
        let records: Vec<NoteRecord> = self.load_document(NOTES_FILE).await?;
        Ok(records.into_iter().map(NoteRecord::to_domain).collect())
    }

    async fn save_notes(&self, notes: &[Note]) -> PortResult<()> {
        let records: Vec<NoteRecord> = notes.iter().map(NoteRecord::from_domain).collect();
        self.save_document(NOTES_FILE, &records).await
    }
}
