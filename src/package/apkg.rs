//! `.apkg` archive writer
//!
//! An `.apkg` is a zip holding `collection.anki2` (an `SQLite` collection),
//! a `media` JSON index mapping entry numbers to file names, and one entry
//! per media file named by its number.

use std::io::Write;
use std::path::Path;

use rusqlite::{Connection, params};
use serde_json::{Map, Value, json};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::model::{Deck, deck_json};
use super::schema::{self, SCHEMA_VERSION};
use crate::{Error, Result};

/// Collection file name inside the archive
pub const COLLECTION_ENTRY: &str = "collection.anki2";

/// Media index name inside the archive
pub const MEDIA_INDEX_ENTRY: &str = "media";

/// Id of Anki's built-in default deck
const DEFAULT_DECK_ID: i64 = 1;

/// A media file to embed in the archive
#[derive(Debug, Clone)]
pub struct MediaFile {
    pub name: String,
    pub data: Vec<u8>,
}

/// Write `deck` and `media` as an `.apkg` to `output`
///
/// The archive is assembled in a temporary file next to `output` and moved
/// into place, so an existing archive is replaced whole.
///
/// # Errors
///
/// Returns error if the collection or archive cannot be written
pub fn write(deck: &Deck, media: &[MediaFile], output: &Path) -> Result<()> {
    let scratch = tempfile::tempdir()?;
    let collection_path = scratch.path().join(COLLECTION_ENTRY);
    {
        let mut conn = Connection::open(&collection_path)?;
        schema::init(&conn)?;
        write_collection(&mut conn, deck, chrono::Utc::now().timestamp_millis())?;
    }
    let collection = std::fs::read(&collection_path)?;

    let parent = output
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent)?;

    let staged = tempfile::NamedTempFile::new_in(parent)?;
    {
        let mut zip = ZipWriter::new(staged.as_file());
        let options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        zip.start_file(COLLECTION_ENTRY, options)?;
        zip.write_all(&collection)?;

        let index: Map<String, Value> = media
            .iter()
            .enumerate()
            .map(|(i, file)| (i.to_string(), Value::String(file.name.clone())))
            .collect();
        zip.start_file(MEDIA_INDEX_ENTRY, options)?;
        zip.write_all(&serde_json::to_vec(&index)?)?;

        // MP3 data is already compressed
        let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        for (i, file) in media.iter().enumerate() {
            zip.start_file(i.to_string(), stored)?;
            zip.write_all(&file.data)?;
        }

        zip.finish()?;
    }

    staged
        .persist(output)
        .map_err(|e| Error::Package(format!("failed to move archive into place: {}", e.error)))?;
    Ok(())
}

/// Populate the collection tables for a single deck
fn write_collection(conn: &mut Connection, deck: &Deck, now_millis: i64) -> Result<()> {
    let now_secs = now_millis / 1000;
    let model_id = deck.model.id.to_string();

    let models = json!({ model_id.clone(): deck.model.to_json(deck.id, now_secs) });
    let decks = json!({
        DEFAULT_DECK_ID.to_string(): deck_json(DEFAULT_DECK_ID, "Default", now_secs),
        deck.id.to_string(): deck.to_json(now_secs),
    });

    let tx = conn.transaction()?;

    tx.execute(
        "INSERT INTO col VALUES (1, ?1, ?2, ?2, ?3, 0, 0, 0, ?4, ?5, ?6, ?7, '{}')",
        params![
            now_secs,
            now_millis,
            SCHEMA_VERSION,
            collection_conf(&model_id).to_string(),
            models.to_string(),
            decks.to_string(),
            deck_conf().to_string(),
        ],
    )?;

    for (position, note) in (0_i64..).zip(&deck.notes) {
        let id = now_millis + position;
        tx.execute(
            "INSERT INTO notes VALUES (?1, ?2, ?3, ?4, -1, '', ?5, ?6, ?7, 0, '')",
            params![
                id,
                note.guid,
                deck.model.id,
                now_secs,
                note.joined_fields(),
                note.sort_field(),
                note.checksum(),
            ],
        )?;
        tx.execute(
            "INSERT INTO cards VALUES (?1, ?2, ?3, 0, ?4, -1, 0, 0, ?5, 0, 0, 0, 0, 0, 0, 0, 0, '')",
            params![id, id, deck.id, now_secs, position],
        )?;
    }

    tx.commit()?;
    Ok(())
}

fn collection_conf(model_id: &str) -> Value {
    json!({
        "activeDecks": [DEFAULT_DECK_ID],
        "curDeck": DEFAULT_DECK_ID,
        "curModel": model_id,
        "newSpread": 0,
        "collapseTime": 1200,
        "timeLim": 0,
        "estTimes": true,
        "dueCounts": true,
        "nextPos": 1,
        "sortType": "noteFld",
        "sortBackwards": false,
        "addToCur": true,
    })
}

fn deck_conf() -> Value {
    json!({
        "1": {
            "id": 1,
            "name": "Default",
            "mod": 0,
            "usn": 0,
            "maxTaken": 60,
            "autoplay": true,
            "replayq": true,
            "timer": 0,
            "new": {
                "bury": true,
                "delays": [1, 10],
                "initialFactor": 2500,
                "ints": [1, 4, 7],
                "order": 1,
                "perDay": 20,
                "separate": true,
            },
            "rev": {
                "bury": true,
                "ease4": 1.3,
                "fuzz": 0.05,
                "ivlFct": 1,
                "maxIvl": 36500,
                "minSpace": 1,
                "perDay": 100,
            },
            "lapse": {
                "delays": [10],
                "leechAction": 0,
                "leechFails": 8,
                "minInt": 1,
                "mult": 0,
            },
        }
    })
}
