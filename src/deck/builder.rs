//! Card building
//!
//! Enriches each word through a [`WordLookup`], speaks the word, definition
//! and example through a [`SpeechSynthesizer`], and collects the results.
//! A word that fails at any step is recorded and skipped; it never aborts the
//! rest of the batch.

use std::path::Path;
use std::sync::Arc;

use futures::StreamExt;

use super::{AudioRefs, Card, DeckRecord};
use crate::dictionary::WordLookup;
use crate::ingest;
use crate::voice::SpeechSynthesizer;
use crate::{Error, Result};

/// Outcome of building cards for a word list
#[derive(Debug, Clone)]
pub struct BuildReport {
    /// Trimmed deck name
    pub deck_name: String,
    /// Successful cards, in input order
    pub cards: Vec<Card>,
    /// Words that failed lookup or synthesis, in input order
    pub failed: Vec<String>,
    /// Successful words whose definition or example is placeholder text
    pub degraded: Vec<String>,
}

impl BuildReport {
    /// The intermediate record for packaging
    #[must_use]
    pub fn record(&self) -> DeckRecord {
        DeckRecord::new(self.deck_name.clone(), self.cards.clone())
    }
}

struct BuiltCard {
    card: Card,
    degraded: bool,
}

/// Builds audio-backed cards from words
#[derive(Clone)]
pub struct CardBuilder {
    lookup: Arc<dyn WordLookup>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    max_concurrent_words: usize,
}

impl CardBuilder {
    /// Create a builder that processes one word at a time
    #[must_use]
    pub fn new(lookup: Arc<dyn WordLookup>, synthesizer: Arc<dyn SpeechSynthesizer>) -> Self {
        Self {
            lookup,
            synthesizer,
            max_concurrent_words: 1,
        }
    }

    /// Allow up to `limit` words in flight at once (clamped to at least 1)
    ///
    /// Output order stays the input order regardless of the limit.
    #[must_use]
    pub fn max_concurrent_words(mut self, limit: usize) -> Self {
        self.max_concurrent_words = limit.max(1);
        self
    }

    /// Build cards for `words`, writing audio clips into `audio_dir`
    ///
    /// Words are trimmed and deduplicated first (case-sensitive, first
    /// occurrence wins).
    ///
    /// # Errors
    ///
    /// Returns `Error::Input` for an empty deck name or word list and
    /// `Error::NoCardsBuilt` when every word fails
    pub async fn build(
        &self,
        words: &[String],
        deck_name: &str,
        audio_dir: &Path,
    ) -> Result<BuildReport> {
        let deck_name = deck_name.trim();
        if deck_name.is_empty() {
            return Err(Error::Input("Deck name is required.".to_string()));
        }

        let words = ingest::dedupe(words);
        if words.is_empty() {
            return Err(Error::Input(
                "Please enter at least one word or upload a valid file.".to_string(),
            ));
        }

        tracing::info!(
            deck = %deck_name,
            words = words.len(),
            concurrency = self.max_concurrent_words,
            "building cards"
        );

        let outcomes: Vec<(String, Result<BuiltCard>)> = futures::stream::iter(words)
            .map(|word| {
                let builder = self.clone();
                let audio_dir = audio_dir.to_path_buf();
                async move {
                    let outcome = builder.build_card(&word, &audio_dir).await;
                    (word, outcome)
                }
            })
            .buffered(self.max_concurrent_words)
            .collect()
            .await;

        let mut cards = Vec::new();
        let mut failed = Vec::new();
        let mut degraded = Vec::new();

        for (word, outcome) in outcomes {
            match outcome {
                Ok(built) => {
                    if built.degraded {
                        degraded.push(word);
                    }
                    cards.push(built.card);
                }
                Err(e) => {
                    tracing::warn!(word = %word, error = %e, "skipping word");
                    failed.push(word);
                }
            }
        }

        if cards.is_empty() {
            return Err(Error::NoCardsBuilt { failed });
        }

        tracing::info!(
            deck = %deck_name,
            cards = cards.len(),
            failed = failed.len(),
            degraded = degraded.len(),
            "cards built"
        );

        Ok(BuildReport {
            deck_name: deck_name.to_string(),
            cards,
            failed,
            degraded,
        })
    }

    /// Enrich one word and synthesize its three clips, in order
    async fn build_card(&self, word: &str, audio_dir: &Path) -> Result<BuiltCard> {
        let data = self.lookup.lookup(word).await?;
        let audio = AudioRefs::for_word(word);

        self.synthesizer
            .synthesize_to_file(word, &audio_dir.join(&audio.word))
            .await?;
        self.synthesizer
            .synthesize_to_file(&data.definition, &audio_dir.join(&audio.definition))
            .await?;
        self.synthesizer
            .synthesize_to_file(&data.example, &audio_dir.join(&audio.example))
            .await?;

        Ok(BuiltCard {
            degraded: data.is_degraded(),
            card: Card {
                word: word.to_string(),
                pronunciation: data.pronunciation,
                definition: data.definition,
                example: data.example,
                part_of_speech: data.part_of_speech,
                audio,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::dictionary::WordData;

    struct StubLookup {
        missing: HashSet<&'static str>,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl WordLookup for StubLookup {
        async fn lookup(&self, word: &str) -> Result<WordData> {
            self.calls.lock().unwrap().push(word.to_string());
            if self.missing.contains(word) {
                return Err(Error::NotFound(word.to_string()));
            }
            Ok(WordData {
                pronunciation: format!("/{word}/"),
                definition: format!("Meaning of {word}."),
                example: format!("Use {word} here."),
                part_of_speech: "noun".to_string(),
                has_definition: true,
                has_example: true,
            })
        }
    }

    struct StubSpeech {
        fail_on: Option<&'static str>,
    }

    #[async_trait]
    impl SpeechSynthesizer for StubSpeech {
        async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
            if self.fail_on == Some(text) {
                return Err(Error::Tts("stub failure".to_string()));
            }
            Ok(text.as_bytes().to_vec())
        }
    }

    fn stub_builder(missing: &[&'static str], fail_on: Option<&'static str>) -> (CardBuilder, Arc<StubLookup>) {
        let lookup = Arc::new(StubLookup {
            missing: missing.iter().copied().collect(),
            calls: Mutex::new(Vec::new()),
        });
        let builder = CardBuilder::new(lookup.clone(), Arc::new(StubSpeech { fail_on }));
        (builder, lookup)
    }

    fn words(list: &[&str]) -> Vec<String> {
        list.iter().map(ToString::to_string).collect()
    }

    #[tokio::test]
    async fn duplicates_are_looked_up_once() {
        let dir = tempfile::tempdir().unwrap();
        let (builder, lookup) = stub_builder(&[], None);

        let report = builder
            .build(&words(&["cat", "cat", "dog"]), "Pets", dir.path())
            .await
            .unwrap();

        assert_eq!(*lookup.calls.lock().unwrap(), vec!["cat", "dog"]);
        assert_eq!(report.cards.len(), 2);
    }

    #[tokio::test]
    async fn failures_are_skipped_and_order_kept() {
        let dir = tempfile::tempdir().unwrap();
        let (builder, _) = stub_builder(&["qwxz"], Some("Meaning of dog."));

        let report = builder
            .build(&words(&["cat", "qwxz", "dog", "fox"]), " Pets ", dir.path())
            .await
            .unwrap();

        let built: Vec<&str> = report.cards.iter().map(|c| c.word.as_str()).collect();
        assert_eq!(built, vec!["cat", "fox"]);
        assert_eq!(report.failed, vec!["qwxz", "dog"]);
        assert_eq!(report.deck_name, "Pets");
    }

    #[tokio::test]
    async fn audio_files_are_written() {
        let dir = tempfile::tempdir().unwrap();
        let (builder, _) = stub_builder(&[], None);

        let report = builder
            .build(&words(&["cat"]), "Pets", dir.path())
            .await
            .unwrap();

        let card = &report.cards[0];
        assert_eq!(
            std::fs::read(dir.path().join(&card.audio.definition)).unwrap(),
            b"Meaning of cat."
        );
        assert!(dir.path().join("cat_word.mp3").exists());
        assert!(dir.path().join("cat_ex.mp3").exists());
    }

    #[tokio::test]
    async fn words_differing_only_in_reserved_characters_keep_their_own_audio() {
        let dir = tempfile::tempdir().unwrap();
        let (builder, _) = stub_builder(&[], None);
        let builder = builder.max_concurrent_words(2);

        let report = builder
            .build(&words(&["a/b", "a_b"]), "Deck", dir.path())
            .await
            .unwrap();

        let [first, second] = [&report.cards[0].audio, &report.cards[1].audio];
        for name in first.file_names() {
            assert!(!second.file_names().contains(&name), "{name} is shared");
        }
        assert_eq!(std::fs::read(dir.path().join(&first.word)).unwrap(), b"a/b");
        assert_eq!(std::fs::read(dir.path().join(&second.word)).unwrap(), b"a_b");
    }

    #[tokio::test]
    async fn all_failures_is_aggregate_error() {
        let dir = tempfile::tempdir().unwrap();
        let (builder, _) = stub_builder(&["a", "b"], None);

        let err = builder
            .build(&words(&["a", "b"]), "Deck", dir.path())
            .await
            .unwrap_err();

        match err {
            Error::NoCardsBuilt { failed } => assert_eq!(failed, vec!["a", "b"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn blank_inputs_are_rejected_before_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let (builder, lookup) = stub_builder(&[], None);

        let err = builder.build(&words(&["cat"]), "  ", dir.path()).await.unwrap_err();
        assert!(matches!(err, Error::Input(_)));

        let err = builder.build(&words(&[" ", ""]), "Deck", dir.path()).await.unwrap_err();
        assert!(matches!(err, Error::Input(_)));

        assert!(lookup.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn concurrent_build_keeps_input_order() {
        let dir = tempfile::tempdir().unwrap();
        let (builder, _) = stub_builder(&["c"], None);
        let builder = builder.max_concurrent_words(4);

        let report = builder
            .build(&words(&["a", "b", "c", "d", "e"]), "Deck", dir.path())
            .await
            .unwrap();

        let built: Vec<&str> = report.cards.iter().map(|c| c.word.as_str()).collect();
        assert_eq!(built, vec!["a", "b", "d", "e"]);
        assert_eq!(report.failed, vec!["c"]);
    }
}
