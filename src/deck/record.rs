//! Intermediate deck record persistence
//!
//! The record decouples card building from packaging: it is written once per
//! request and can be packaged again later without touching the network.
//! Only the versioned shape is read by [`load`]; older unversioned files go
//! through [`migrate_legacy`] once.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{Card, DEFAULT_DECK_NAME};
use crate::{Error, Result};

/// Current record format version
pub const RECORD_VERSION: u32 = 1;

/// Deck name plus ordered cards, as stored between building and packaging
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckRecord {
    pub version: u32,
    pub deck_name: String,
    pub cards: Vec<Card>,
}

impl DeckRecord {
    /// Create a current-version record
    #[must_use]
    pub fn new(deck_name: impl Into<String>, cards: Vec<Card>) -> Self {
        Self {
            version: RECORD_VERSION,
            deck_name: deck_name.into(),
            cards,
        }
    }
}

/// Every shape a record file has had
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredRecord {
    Current(DeckRecord),
    Unversioned {
        #[serde(rename = "deckName", default)]
        deck_name: Option<String>,
        cards: Vec<Card>,
    },
    BareList(Vec<Card>),
}

fn read_stored(path: &Path) -> Result<StoredRecord> {
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content)
        .map_err(|e| Error::Record(format!("{}: unrecognized record: {e}", path.display())))
}

/// Write a record as pretty-printed JSON, replacing any existing file
///
/// # Errors
///
/// Returns error if the record cannot be serialized or written
pub fn save(record: &DeckRecord, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(record)?;
    std::fs::write(path, json)?;
    tracing::debug!(path = %path.display(), cards = record.cards.len(), "saved deck record");
    Ok(())
}

/// Read a current-version record
///
/// # Errors
///
/// Returns error if the file cannot be read, is not a record, uses a legacy
/// shape, or has an empty deck name
pub fn load(path: &Path) -> Result<DeckRecord> {
    match read_stored(path)? {
        StoredRecord::Current(record) => {
            if record.version != RECORD_VERSION {
                return Err(Error::Record(format!(
                    "{}: unsupported record version {}",
                    path.display(),
                    record.version
                )));
            }
            if record.deck_name.trim().is_empty() {
                return Err(Error::Record(format!(
                    "{}: deck name is empty",
                    path.display()
                )));
            }
            Ok(record)
        }
        StoredRecord::Unversioned { .. } | StoredRecord::BareList(_) => Err(Error::Record(format!(
            "{}: legacy record format, run `vocab-deck migrate-record` first",
            path.display()
        ))),
    }
}

/// Rewrite a legacy record file in the current shape
///
/// A bare card list gets the default deck name. Files already in the current
/// shape are returned unchanged and not rewritten.
///
/// # Errors
///
/// Returns error if the file cannot be read, parsed or written
pub fn migrate_legacy(path: &Path) -> Result<DeckRecord> {
    let record = match read_stored(path)? {
        StoredRecord::Current(record) => {
            tracing::info!(path = %path.display(), "record already current");
            return Ok(record);
        }
        StoredRecord::Unversioned { deck_name, cards } => {
            let deck_name = deck_name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_DECK_NAME.to_string());
            DeckRecord::new(deck_name, cards)
        }
        StoredRecord::BareList(cards) => DeckRecord::new(DEFAULT_DECK_NAME, cards),
    };

    save(&record, path)?;
    tracing::info!(
        path = %path.display(),
        deck = %record.deck_name,
        cards = record.cards.len(),
        "migrated legacy record"
    );
    Ok(record)
}
