//! Shared test utilities

#![allow(dead_code)]

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use vocab_deck::{CardBuilder, Error, Pipeline, Result, SpeechSynthesizer, WordData, WordLookup};

/// Dictionary that knows every word except the ones listed as missing
#[derive(Default)]
pub struct FakeDictionary {
    pub missing: HashSet<String>,
    pub without_example: HashSet<String>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeDictionary {
    pub fn missing(words: &[&str]) -> Self {
        Self {
            missing: words.iter().map(ToString::to_string).collect(),
            ..Self::default()
        }
    }
}

#[async_trait]
impl WordLookup for FakeDictionary {
    async fn lookup(&self, word: &str) -> Result<WordData> {
        self.calls.lock().unwrap().push(word.to_string());
        if self.missing.contains(word) {
            return Err(Error::NotFound(word.to_string()));
        }
        let has_example = !self.without_example.contains(word);
        Ok(WordData {
            pronunciation: format!("/{word}/"),
            definition: format!("Definition of {word}."),
            example: if has_example {
                format!("An example with {word}.")
            } else {
                format!("No example found for {word}.")
            },
            part_of_speech: "noun".to_string(),
            has_definition: true,
            has_example,
        })
    }
}

/// Speech synthesizer that returns a fake MP3 header followed by the text
#[derive(Default)]
pub struct FakeSpeech {
    pub fail_on: HashSet<String>,
}

#[async_trait]
impl SpeechSynthesizer for FakeSpeech {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        if self.fail_on.contains(text) {
            return Err(Error::Tts(format!("refused: {text}")));
        }
        let mut audio = b"ID3".to_vec();
        audio.extend_from_slice(text.as_bytes());
        Ok(audio)
    }
}

/// Pipeline over the fakes, storing workspaces under `data_dir`
pub fn fake_pipeline(data_dir: &Path, dictionary: FakeDictionary, speech: FakeSpeech) -> Pipeline {
    let builder = CardBuilder::new(Arc::new(dictionary), Arc::new(speech));
    Pipeline::new(builder, data_dir.join("requests"))
}

pub fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(ToString::to_string).collect()
}

/// Multipart form body and its content type
pub fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &[u8])>) -> (String, Vec<u8>) {
    const BOUNDARY: &str = "vocab-deck-test-boundary";
    let mut body = Vec::new();

    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }

    if let Some((file_name, data)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"wordFile\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    (format!("multipart/form-data; boundary={BOUNDARY}"), body)
}

/// Contents of a produced `.apkg`
pub struct ArchiveContents {
    pub deck_names: Vec<String>,
    pub sort_fields: Vec<String>,
    pub card_count: i64,
    pub media: serde_json::Map<String, serde_json::Value>,
}

/// Open an `.apkg` and read back its notes, cards and media index
pub fn read_archive(path: &Path) -> ArchiveContents {
    let mut archive = zip::ZipArchive::new(std::fs::File::open(path).unwrap()).unwrap();

    let mut media = String::new();
    archive
        .by_name("media")
        .unwrap()
        .read_to_string(&mut media)
        .unwrap();
    let media: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&media).unwrap();

    let mut collection = Vec::new();
    archive
        .by_name("collection.anki2")
        .unwrap()
        .read_to_end(&mut collection)
        .unwrap();
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("collection.anki2");
    std::fs::write(&db_path, collection).unwrap();

    let conn = rusqlite::Connection::open(&db_path).unwrap();
    let mut stmt = conn.prepare("SELECT sfld FROM notes ORDER BY id").unwrap();
    let sort_fields = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .unwrap()
        .collect::<std::result::Result<Vec<_>, _>>()
        .unwrap();
    let card_count = conn
        .query_row("SELECT COUNT(*) FROM cards", [], |row| row.get(0))
        .unwrap();
    let decks: String = conn
        .query_row("SELECT decks FROM col", [], |row| row.get(0))
        .unwrap();
    let decks: serde_json::Value = serde_json::from_str(&decks).unwrap();
    let deck_names = decks
        .as_object()
        .unwrap()
        .values()
        .filter_map(|d| d["name"].as_str().map(ToString::to_string))
        .collect();

    ArchiveContents {
        deck_names,
        sort_fields,
        card_count,
        media,
    }
}
