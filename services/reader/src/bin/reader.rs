//! services/reader/src/bin/reader.rs
//!
//! A line-oriented driver for the reader engine: frontend messages go in on
//! stdin (either raw JSON or a short command form), engine messages come out
//! on stdout as JSON lines. The real frontend speaks the same protocol.

use async_trait::async_trait;
use quran_reader_core::ports::{ScrollTarget, Viewport};
use reader_lib::{
    adapters::{JsonFileStore, RestContentAdapter},
    config::Config,
    error::AppError,
    session::{AppState, ClientMessage, EngineEvent, ReaderEngine},
};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// A viewport for terminal use: every target counts as rendered and scrolls
/// are just logged, so the whole engine path runs without a browser.
struct HeadlessViewport;

#[async_trait]
impl Viewport for HeadlessViewport {
    async fn is_rendered(&self, _target: ScrollTarget) -> bool {
        true
    }

    async fn scroll_into_view(&self, target: ScrollTarget) {
        info!(?target, "scrolled into view");
    }

    async fn set_emphasis(&self, target: ScrollTarget, emphasized: bool) {
        debug!(?target, emphasized, "emphasis toggled");
    }

    async fn focused_chapter(&self, _band_height: u32) -> Option<u16> {
        None
    }
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    info!("Configuration loaded. Starting reader session...");

    // --- 2. Initialize Service Adapters ---
    let http_client = reqwest::Client::builder()
        .timeout(config.http_timeout)
        .build()?;
    let content = Arc::new(RestContentAdapter::new(
        http_client,
        config.api_base_url.clone(),
    ));
    let store = Arc::new(JsonFileStore::new(config.data_dir.clone()));

    // --- 3. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        content,
        store,
        viewport: Arc::new(HeadlessViewport),
    });

    // --- 4. Start the Engine ---
    let (engine_tx, engine_rx) = mpsc::unbounded_channel();
    let (ui_tx, mut ui_rx) = mpsc::unbounded_channel();
    let engine = ReaderEngine::new(app_state, engine_tx.clone(), ui_tx).await?;
    tokio::spawn(engine.run(engine_rx));

    tokio::spawn(async move {
        while let Some(message) = ui_rx.recv().await {
            match serde_json::to_string(&message) {
                Ok(json) => println!("{json}"),
                Err(e) => debug!(error = %e, "could not serialize a server message"),
            }
        }
    });

    // Land on the start page like a fresh browser tab would.
    let _ = engine_tx.send(EngineEvent::Client(ClientMessage::Navigate {
        path: "/".to_string(),
    }));

    // --- 5. Read Frontend Messages From Stdin ---
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }
        if line == "quit" || line == "exit" {
            break;
        }
        match parse_line(&line) {
            Some(message) => {
                let _ = engine_tx.send(EngineEvent::Client(message));
            }
            None => eprintln!("unrecognized input: {line}"),
        }
    }

    info!("Reader session closed.");
    Ok(())
}

/// Accepts either a raw JSON `ClientMessage` or a short command form.
fn parse_line(line: &str) -> Option<ClientMessage> {
    if line.starts_with('{') {
        return serde_json::from_str(line).ok();
    }

    let mut parts = line.split_whitespace();
    let command = parts.next()?;

    match command {
        "open" => Some(ClientMessage::Navigate {
            path: parts.next()?.to_string(),
        }),
        "next" => Some(ClientMessage::NextPage),
        "prev" => Some(ClientMessage::PreviousPage),
        "page" => Some(ClientMessage::GoToPage {
            page: parts.next()?.parse().ok()?,
        }),
        "mode" => {
            let mode = serde_json::from_value(serde_json::Value::String(
                parts.next()?.to_string(),
            ))
            .ok()?;
            Some(ClientMessage::SetMode { mode })
        }
        "translator" => Some(ClientMessage::SetTranslator {
            translator_id: parts.next()?.parse().ok()?,
        }),
        "lang" => Some(ClientMessage::SetLanguage {
            language: parts.next()?.to_string(),
        }),
        "search" => Some(ClientMessage::Search {
            query: parts.collect::<Vec<_>>().join(" "),
        }),
        "random" => Some(ClientMessage::RandomVerse),
        "chapters" => Some(ClientMessage::FilterChapters {
            input: parts.collect::<Vec<_>>().join(" "),
        }),
        "verses" => Some(ClientMessage::ListVerseNumbers {
            chapter_name: parts.collect::<Vec<_>>().join(" "),
        }),
        "jump" => {
            let chapter_name = parts.next()?.to_string();
            let verse_number = parts.next()?.to_string();
            Some(ClientMessage::QuickJump {
                chapter_name,
                verse_number,
            })
        }
        "note" => {
            let chapter_id = parts.next()?.parse().ok()?;
            let verse_number = parts.next()?.parse().ok()?;
            let content = parts.collect::<Vec<_>>().join(" ");
            Some(ClientMessage::SaveNote {
                chapter_id,
                verse_number,
                content,
            })
        }
        "delnote" => Some(ClientMessage::DeleteNote {
            chapter_id: parts.next()?.parse().ok()?,
            verse_number: parts.next()?.parse().ok()?,
        }),
        "notes" => {
            let filter = parts.collect::<Vec<_>>().join(" ");
            let filter = (!filter.is_empty()).then_some(filter);
            Some(ClientMessage::ListNotes {
                filter,
                sort_by: Default::default(),
                descending: false,
            })
        }
        _ => None,
    }
}
