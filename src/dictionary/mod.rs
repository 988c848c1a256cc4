//! Dictionary lookups
//!
//! Resolves a word into the text fields of a card using a
//! dictionaryapi.dev-compatible endpoint.

mod entry;

use async_trait::async_trait;

pub use entry::{Definition, Entry, Meaning, Phonetic, UNKNOWN_PART_OF_SPEECH, WordData};

use crate::{Error, Result};

/// Source of card text for a word
#[async_trait]
pub trait WordLookup: Send + Sync {
    /// Look up a word
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` when the word has no usable entry or the
    /// lookup fails, and `Error::Input` for a blank word
    async fn lookup(&self, word: &str) -> Result<WordData>;
}

/// HTTP client for the dictionary entries endpoint
#[derive(Clone)]
pub struct DictionaryClient {
    client: reqwest::Client,
    base_url: String,
}

impl DictionaryClient {
    /// Create a client for `base_url` (e.g. `https://api.dictionaryapi.dev/api/v2/entries/en`)
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn entry_url(&self, word: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(word)
        )
    }

    /// Fetch the raw entries for a word
    ///
    /// # Errors
    ///
    /// Returns error on transport failure, non-success status or malformed body
    pub async fn fetch_entries(&self, word: &str) -> Result<Vec<Entry>> {
        let response = self.client.get(self.entry_url(word)).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(Error::NotFound(format!("{word} (dictionary returned {status})")));
        }

        Ok(response.json::<Vec<Entry>>().await?)
    }
}

#[async_trait]
impl WordLookup for DictionaryClient {
    async fn lookup(&self, word: &str) -> Result<WordData> {
        let word = word.trim();
        if word.is_empty() {
            return Err(Error::Input("word must not be empty".to_string()));
        }

        let entries = self.fetch_entries(word).await.map_err(|e| {
            tracing::warn!(word = %word, error = %e, "dictionary lookup failed");
            Error::NotFound(word.to_string())
        })?;

        let Some(entry) = entries.first() else {
            tracing::warn!(word = %word, "dictionary returned no entries");
            return Err(Error::NotFound(word.to_string()));
        };

        let data = WordData::from_entry(word, entry);
        tracing::debug!(
            word = %word,
            part_of_speech = %data.part_of_speech,
            degraded = data.is_degraded(),
            "word enriched"
        );
        Ok(data)
    }
}
