//! Deck packaging
//!
//! Turns a [`DeckRecord`] plus the audio directory it refers to into an
//! importable `.apkg` archive. Missing audio never fails packaging: the
//! card keeps its sound reference and the file is reported as missing.

pub mod apkg;
pub mod model;
pub mod schema;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

pub use apkg::MediaFile;
pub use model::{Deck, Note, NoteModel};

use crate::deck::{DeckRecord, is_plain_file_name, record};
use crate::{Error, Result};

/// Result of packaging a record
#[derive(Debug, Clone)]
pub struct PackageReport {
    pub archive_path: PathBuf,
    pub deck_name: String,
    pub note_count: usize,
    pub media_count: usize,
    /// Referenced audio files that were not found, in card order
    pub missing_media: Vec<String>,
}

/// Packages deck records whose audio lives in one directory
#[derive(Debug, Clone)]
pub struct DeckPackager {
    media_dir: PathBuf,
}

impl DeckPackager {
    #[must_use]
    pub fn new(media_dir: impl Into<PathBuf>) -> Self {
        Self {
            media_dir: media_dir.into(),
        }
    }

    #[must_use]
    pub fn media_dir(&self) -> &Path {
        &self.media_dir
    }

    /// Load the record at `record_path` and package it to `output`
    ///
    /// # Errors
    ///
    /// Returns error if the record is unreadable or the archive cannot be written
    pub fn package(&self, record_path: &Path, output: &Path) -> Result<PackageReport> {
        let record = record::load(record_path)?;
        self.package_record(&record, output)
    }

    /// Package an in-memory record to `output`, replacing any existing archive
    ///
    /// # Errors
    ///
    /// Returns error if the deck name is empty or the archive cannot be written
    pub fn package_record(&self, record: &DeckRecord, output: &Path) -> Result<PackageReport> {
        let deck_name = record.deck_name.trim();
        if deck_name.is_empty() {
            return Err(Error::Package("deck name is empty".to_string()));
        }

        let mut deck = Deck::new(deck_name, NoteModel::word_model());
        for card in &record.cards {
            deck.add_note(Note::from_card(card));
        }

        let (media, missing_media) = self.collect_media(record)?;
        apkg::write(&deck, &media, output)?;

        tracing::info!(
            deck = %deck_name,
            notes = deck.notes.len(),
            media = media.len(),
            missing = missing_media.len(),
            path = %output.display(),
            "packaged deck"
        );

        Ok(PackageReport {
            archive_path: output.to_path_buf(),
            deck_name: deck_name.to_string(),
            note_count: deck.notes.len(),
            media_count: media.len(),
            missing_media,
        })
    }

    /// Read every referenced audio file once, noting the ones that are absent
    fn collect_media(&self, record: &DeckRecord) -> Result<(Vec<MediaFile>, Vec<String>)> {
        let mut seen = HashSet::new();
        let mut media = Vec::new();
        let mut missing = Vec::new();

        let names = record.cards.iter().flat_map(|card| card.audio.file_names());
        for name in names {
            if !seen.insert(name) {
                continue;
            }
            if !is_plain_file_name(name) {
                tracing::warn!(file = %name, "ignoring audio reference outside media directory");
                missing.push(name.to_string());
                continue;
            }

            match std::fs::read(self.media_dir.join(name)) {
                Ok(data) => media.push(MediaFile {
                    name: name.to_string(),
                    data,
                }),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    tracing::warn!(file = %name, "audio file missing, packaging without it");
                    missing.push(name.to_string());
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok((media, missing))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use super::*;
    use crate::deck::{AudioRefs, Card};

    fn card(word: &str) -> Card {
        Card {
            word: word.to_string(),
            pronunciation: String::new(),
            definition: format!("Definition of {word}."),
            example: format!("Example of {word}."),
            part_of_speech: "noun".to_string(),
            audio: AudioRefs::for_word(word),
        }
    }

    fn write_audio(dir: &Path, word: &str) {
        for name in AudioRefs::for_word(word).file_names() {
            std::fs::write(dir.join(name), b"mp3").unwrap();
        }
    }

    fn media_index(path: &Path) -> serde_json::Value {
        let mut archive = zip::ZipArchive::new(std::fs::File::open(path).unwrap()).unwrap();
        let mut raw = String::new();
        archive
            .by_name(apkg::MEDIA_INDEX_ENTRY)
            .unwrap()
            .read_to_string(&mut raw)
            .unwrap();
        serde_json::from_str(&raw).unwrap()
    }

    #[test]
    fn packages_every_card_with_its_audio() {
        let dir = tempfile::tempdir().unwrap();
        write_audio(dir.path(), "cat");
        write_audio(dir.path(), "dog");
        let record = DeckRecord::new("Pets", vec![card("cat"), card("dog")]);
        let output = dir.path().join("deck.apkg");

        let report = DeckPackager::new(dir.path())
            .package_record(&record, &output)
            .unwrap();

        assert_eq!(report.note_count, 2);
        assert_eq!(report.media_count, 6);
        assert!(report.missing_media.is_empty());
        assert_eq!(media_index(&output)["0"], "cat_word.mp3");
    }

    #[test]
    fn missing_audio_is_reported_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write_audio(dir.path(), "cat");
        std::fs::remove_file(dir.path().join("cat_ex.mp3")).unwrap();
        let record = DeckRecord::new("Pets", vec![card("cat")]);
        let output = dir.path().join("deck.apkg");

        let report = DeckPackager::new(dir.path())
            .package_record(&record, &output)
            .unwrap();

        assert_eq!(report.note_count, 1);
        assert_eq!(report.media_count, 2);
        assert_eq!(report.missing_media, vec!["cat_ex.mp3"]);
        assert!(output.exists());
    }

    #[test]
    fn traversal_references_are_not_read() {
        let dir = tempfile::tempdir().unwrap();
        let mut bad = card("cat");
        bad.audio.word = "../secret.mp3".to_string();
        let record = DeckRecord::new("Pets", vec![bad]);

        let report = DeckPackager::new(dir.path())
            .package_record(&record, &dir.path().join("deck.apkg"))
            .unwrap();

        assert!(report.missing_media.contains(&"../secret.mp3".to_string()));
    }

    #[test]
    fn repackaging_replaces_the_archive() {
        let dir = tempfile::tempdir().unwrap();
        write_audio(dir.path(), "cat");
        write_audio(dir.path(), "dog");
        let output = dir.path().join("deck.apkg");
        let packager = DeckPackager::new(dir.path());

        packager
            .package_record(&DeckRecord::new("Pets", vec![card("cat"), card("dog")]), &output)
            .unwrap();
        packager
            .package_record(&DeckRecord::new("Pets", vec![card("cat")]), &output)
            .unwrap();

        assert_eq!(media_index(&output).as_object().unwrap().len(), 3);
    }

    #[test]
    fn package_reads_record_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        write_audio(dir.path(), "cat");
        let record_path = dir.path().join("record.json");
        record::save(&DeckRecord::new("Pets", vec![card("cat")]), &record_path).unwrap();

        let report = DeckPackager::new(dir.path())
            .package(&record_path, &dir.path().join("deck.apkg"))
            .unwrap();

        assert_eq!(report.deck_name, "Pets");
    }

    #[test]
    fn blank_deck_name_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let record = DeckRecord::new("  ", vec![card("cat")]);

        let err = DeckPackager::new(dir.path())
            .package_record(&record, &dir.path().join("deck.apkg"))
            .unwrap_err();

        assert!(matches!(err, Error::Package(_)));
    }
}
