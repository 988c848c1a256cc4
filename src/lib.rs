//! Vocab Deck - turn vocabulary lists into Anki decks
//!
//! Each word is enriched with a pronunciation, definition and example from a
//! dictionary service, spoken through a text-to-speech endpoint, and packaged
//! with its audio into an importable `.apkg`.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                    Interfaces                        │
//! │        HTTP form (axum)    │    CLI (clap)           │
//! └────────────────────┬────────────────────────────────┘
//!                      │  words + deck name
//! ┌────────────────────▼────────────────────────────────┐
//! │                   Pipeline                           │
//! │  CardBuilder ─► record.json ─► DeckPackager          │
//! └──────┬──────────────────┬───────────────────────────┘
//!        │                  │
//! ┌──────▼──────┐    ┌──────▼──────┐
//! │ Dictionary  │    │     TTS     │
//! └─────────────┘    └─────────────┘
//! ```

pub mod api;
pub mod config;
pub mod deck;
pub mod dictionary;
pub mod error;
pub mod ingest;
pub mod package;
pub mod pipeline;
pub mod voice;

pub use config::Config;
pub use deck::{BuildReport, Card, CardBuilder, DeckRecord};
pub use dictionary::{DictionaryClient, WordData, WordLookup};
pub use error::{Error, Result};
pub use package::{DeckPackager, PackageReport};
pub use pipeline::{Pipeline, PipelineOutcome, Workspace};
pub use voice::{GoogleTts, SpeechSynthesizer};
