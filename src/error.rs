//! Error types for vocab-deck

use thiserror::Error;

/// Result type alias for vocab-deck operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building and packaging decks
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Rejected request input (deck name, word list, upload)
    #[error("{0}")]
    Input(String),

    /// Dictionary lookup produced no usable entry
    #[error("word not found: {0}")]
    NotFound(String),

    /// Text-to-speech error
    #[error("TTS error: {0}")]
    Tts(String),

    /// Every word in the request failed enrichment or synthesis
    #[error("no valid words could be processed ({} failed)", failed.len())]
    NoCardsBuilt {
        /// Words that failed, in input order
        failed: Vec<String>,
    },

    /// Intermediate record could not be read or has the wrong shape
    #[error("record error: {0}")]
    Record(String),

    /// Deck package could not be assembled
    #[error("package error: {0}")]
    Package(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    /// `SQLite` error
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Archive error
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// CSV parsing error
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}
