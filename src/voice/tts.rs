//! Text-to-speech (TTS) processing

use std::path::Path;

use async_trait::async_trait;

use crate::config::TtsConfig;
use crate::{Error, Result};

/// Longest text the translate TTS endpoint accepts per request
pub const MAX_CHUNK_CHARS: usize = 200;

/// Turns text into playable audio
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize text to speech
    ///
    /// # Returns
    ///
    /// Audio bytes (MP3 format)
    ///
    /// # Errors
    ///
    /// Returns error if the text is blank or synthesis fails
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>>;

    /// Synthesize text and write the audio to `destination`
    ///
    /// Parent directories are created; an existing file is overwritten.
    ///
    /// # Errors
    ///
    /// Returns error if synthesis or the file write fails
    async fn synthesize_to_file(&self, text: &str, destination: &Path) -> Result<()> {
        let audio = self.synthesize(text).await?;
        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(destination, &audio).await?;
        tracing::debug!(path = %destination.display(), bytes = audio.len(), "wrote audio");
        Ok(())
    }
}

/// Synthesizes speech through the Google Translate TTS endpoint
#[derive(Clone)]
pub struct GoogleTts {
    client: reqwest::Client,
    host: String,
    lang: String,
    slow: bool,
}

impl GoogleTts {
    /// Create a synthesizer from TTS configuration
    #[must_use]
    pub fn new(client: reqwest::Client, config: &TtsConfig) -> Self {
        Self {
            client,
            host: config.host.trim_end_matches('/').to_string(),
            lang: config.lang.clone(),
            slow: config.slow,
        }
    }

    fn query<'a>(&'a self, chunk: &'a str) -> Vec<(&'static str, &'a str)> {
        vec![
            ("ie", "UTF-8"),
            ("q", chunk),
            ("tl", self.lang.as_str()),
            ("total", "1"),
            ("idx", "0"),
            ("client", "tw-ob"),
            ("prev", "input"),
            ("ttsspeed", if self.slow { "0.24" } else { "1" }),
        ]
    }

    async fn fetch_chunk(&self, chunk: &str) -> Result<Vec<u8>> {
        let url = format!("{}/translate_tts", self.host);
        let textlen = chunk.chars().count().to_string();

        let response = self
            .client
            .get(&url)
            .query(&self.query(chunk))
            .query(&[("textlen", textlen.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!("translate TTS error {status}: {body}")));
        }

        let audio = response.bytes().await?;
        Ok(audio.to_vec())
    }
}

#[async_trait]
impl SpeechSynthesizer for GoogleTts {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        let chunks = split_text(text, MAX_CHUNK_CHARS);
        if chunks.is_empty() {
            return Err(Error::Tts("cannot synthesize empty text".to_string()));
        }

        // MP3 frames are self-delimiting, so chunk responses concatenate
        let mut audio = Vec::new();
        for chunk in &chunks {
            audio.extend(self.fetch_chunk(chunk).await?);
        }
        Ok(audio)
    }
}

/// Split text into chunks of at most `max_chars` characters on whitespace
///
/// A single token longer than `max_chars` is cut at the character limit.
#[must_use]
pub fn split_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for token in text.split_whitespace() {
        let len = token.chars().count();

        if len > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let chars: Vec<char> = token.chars().collect();
            chunks.extend(chars.chunks(max_chars).map(|c| c.iter().collect::<String>()));
            continue;
        }

        if current.is_empty() {
            current.push_str(token);
            current_len = len;
        } else if current_len + 1 + len <= max_chars {
            current.push(' ');
            current.push_str(token);
            current_len += 1 + len;
        } else {
            chunks.push(std::mem::replace(&mut current, token.to_string()));
            current_len = len;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_one_chunk() {
        assert_eq!(split_text("  hello   world ", 200), vec!["hello world"]);
    }

    #[test]
    fn blank_text_has_no_chunks() {
        assert!(split_text(" \n\t ", 200).is_empty());
    }

    #[test]
    fn long_text_splits_on_whitespace() {
        let chunks = split_text("aaa bbb ccc ddd", 7);
        assert_eq!(chunks, vec!["aaa bbb", "ccc ddd"]);
    }

    #[test]
    fn oversized_token_is_hard_split() {
        let chunks = split_text("hi abcdefghij yo", 4);
        assert_eq!(chunks, vec!["hi", "abcd", "efgh", "ij", "yo"]);
    }

    #[test]
    fn chunks_respect_limit_in_chars_not_bytes() {
        let text = "é".repeat(250);
        let chunks = split_text(&text, MAX_CHUNK_CHARS);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].chars().count(), 200);
        assert_eq!(chunks[1].chars().count(), 50);
    }

    #[tokio::test]
    async fn empty_text_is_rejected_before_any_request() {
        let config = crate::Config::default();
        let tts = GoogleTts::new(reqwest::Client::new(), &config.tts);
        let err = tts.synthesize("   ").await.unwrap_err();
        assert!(matches!(err, Error::Tts(_)));
    }
}
