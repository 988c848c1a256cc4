//! Anki note model, deck and note types

use serde_json::{Value, json};
use sha1::Sha1;
use sha2::{Digest, Sha256};

use crate::deck::Card;

/// Stable id of the vocabulary note model
pub const WORD_MODEL_ID: i64 = 1_607_392_319;

/// Note model name
pub const WORD_MODEL_NAME: &str = "Word Model";

/// Field order of the vocabulary note model
pub const WORD_MODEL_FIELDS: [&str; 7] = [
    "Word",
    "Pronunciation",
    "Definition",
    "Example",
    "WordAudio",
    "DefAudio",
    "ExAudio",
];

const FRONT_TEMPLATE: &str = r#"{{Word}}<br><div style="color: #666; font-size: 0.9em;">{{Pronunciation}}</div><br>{{WordAudio}}"#;

const BACK_TEMPLATE: &str = r#"{{FrontSide}}<hr id="answer"><div style="margin-bottom: 10px;"><strong>Definition:</strong><br>{{Definition}}</div>{{DefAudio}}<br><div style="margin-top: 15px;"><strong>Example:</strong><br><em>{{Example}}</em></div>{{ExAudio}}"#;

const CARD_CSS: &str = ".card {\n font-family: arial;\n font-size: 20px;\n text-align: center;\n color: black;\n background-color: white;\n}\n";

const LATEX_PRE: &str = "\\documentclass[12pt]{article}\n\\special{papersize=3in,5in}\n\\usepackage[utf8]{inputenc}\n\\usepackage{amssymb,amsmath}\n\\pagestyle{empty}\n\\setlength{\\parindent}{0in}\n\\begin{document}\n";

const LATEX_POST: &str = "\\end{document}";

/// Card template of a note model
#[derive(Debug, Clone)]
pub struct Template {
    pub name: &'static str,
    pub front: &'static str,
    pub back: &'static str,
}

/// Note type: field names plus card templates
#[derive(Debug, Clone)]
pub struct NoteModel {
    pub id: i64,
    pub name: &'static str,
    pub fields: &'static [&'static str],
    pub templates: Vec<Template>,
    pub css: &'static str,
}

impl NoteModel {
    /// The vocabulary model: word, pronunciation, definition, example and three audio fields
    #[must_use]
    pub fn word_model() -> Self {
        Self {
            id: WORD_MODEL_ID,
            name: WORD_MODEL_NAME,
            fields: &WORD_MODEL_FIELDS,
            templates: vec![Template {
                name: "Card 1",
                front: FRONT_TEMPLATE,
                back: BACK_TEMPLATE,
            }],
            css: CARD_CSS,
        }
    }

    /// Model entry for the collection's `models` column
    #[must_use]
    pub fn to_json(&self, deck_id: i64, modified_secs: i64) -> Value {
        let fields: Vec<Value> = self
            .fields
            .iter()
            .enumerate()
            .map(|(ord, name)| {
                json!({
                    "name": name,
                    "ord": ord,
                    "sticky": false,
                    "rtl": false,
                    "font": "Arial",
                    "size": 20,
                    "media": [],
                })
            })
            .collect();

        let templates: Vec<Value> = self
            .templates
            .iter()
            .enumerate()
            .map(|(ord, t)| {
                json!({
                    "name": t.name,
                    "ord": ord,
                    "qfmt": t.front,
                    "afmt": t.back,
                    "bqfmt": "",
                    "bafmt": "",
                    "did": null,
                    "bfont": "",
                    "bsize": 0,
                })
            })
            .collect();

        // The front shows Word, Pronunciation and WordAudio; any one of them
        // being non-empty is enough to generate the card
        let required = json!([[0, "any", [0, 1, 4]]]);

        json!({
            "id": self.id,
            "name": self.name,
            "type": 0,
            "mod": modified_secs,
            "usn": -1,
            "sortf": 0,
            "did": deck_id,
            "tmpls": templates,
            "flds": fields,
            "css": self.css,
            "latexPre": LATEX_PRE,
            "latexPost": LATEX_POST,
            "latexsvg": false,
            "req": required,
            "tags": [],
            "vers": [],
        })
    }
}

/// A note: one value per model field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub guid: String,
    pub fields: Vec<String>,
}

impl Note {
    /// Bind a card's text fields and sound references to the word model
    #[must_use]
    pub fn from_card(card: &Card) -> Self {
        let fields = vec![
            card.word.clone(),
            card.pronunciation.clone(),
            card.definition.clone(),
            card.example.clone(),
            sound_tag(&card.audio.word),
            sound_tag(&card.audio.definition),
            sound_tag(&card.audio.example),
        ];
        Self {
            guid: guid_for(&[&card.word]),
            fields,
        }
    }

    /// Fields joined with Anki's 0x1f separator
    #[must_use]
    pub fn joined_fields(&self) -> String {
        self.fields.join("\u{1f}")
    }

    /// Sort field (the first field, without markup)
    #[must_use]
    pub fn sort_field(&self) -> String {
        self.fields.first().map(|f| strip_html(f)).unwrap_or_default()
    }

    /// Duplicate-detection checksum over the sort field
    #[must_use]
    pub fn checksum(&self) -> i64 {
        field_checksum(&self.sort_field())
    }
}

/// A deck and the notes it holds
#[derive(Debug, Clone)]
pub struct Deck {
    pub id: i64,
    pub name: String,
    pub model: NoteModel,
    pub notes: Vec<Note>,
}

impl Deck {
    /// Create an empty deck whose id is derived from its name
    #[must_use]
    pub fn new(name: impl Into<String>, model: NoteModel) -> Self {
        let name = name.into();
        Self {
            id: deck_id_for(&name),
            name,
            model,
            notes: Vec::new(),
        }
    }

    pub fn add_note(&mut self, note: Note) {
        self.notes.push(note);
    }

    /// Deck entry for the collection's `decks` column
    #[must_use]
    pub fn to_json(&self, modified_secs: i64) -> Value {
        deck_json(self.id, &self.name, modified_secs)
    }
}

pub(crate) fn deck_json(id: i64, name: &str, modified_secs: i64) -> Value {
    json!({
        "id": id,
        "name": name,
        "mod": modified_secs,
        "usn": -1,
        "desc": "",
        "dyn": 0,
        "conf": 1,
        "collapsed": false,
        "extendNew": 10,
        "extendRev": 50,
        "newToday": [0, 0],
        "revToday": [0, 0],
        "lrnToday": [0, 0],
        "timeToday": [0, 0],
    })
}

/// `[sound:name]` reference understood by Anki's player
#[must_use]
pub fn sound_tag(file_name: &str) -> String {
    format!("[sound:{file_name}]")
}

/// Deck id derived from the deck name
///
/// Kept below 2^53 so JSON consumers read it exactly, and above the default
/// deck's id.
#[must_use]
pub fn deck_id_for(name: &str) -> i64 {
    let digest = Sha256::digest(name.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    let id = u64::from_be_bytes(bytes) & ((1 << 52) - 1);
    #[allow(clippy::cast_possible_wrap)]
    let id = id as i64;
    id + (1 << 30)
}

const BASE91_TABLE: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789!#$%&()*+,-./:;<=>?@[]^_`{|}~";

/// Stable note guid from the given values (base91 of a SHA-256 prefix)
#[must_use]
pub fn guid_for(values: &[&str]) -> String {
    let digest = Sha256::digest(values.join("__").as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    let mut num = u64::from_be_bytes(bytes);

    let base = BASE91_TABLE.len() as u64;
    let mut out = Vec::new();
    while num > 0 {
        #[allow(clippy::cast_possible_truncation)]
        out.push(BASE91_TABLE[(num % base) as usize]);
        num /= base;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

/// First 32 bits of the SHA-1 of the field, as Anki stores in `notes.csum`
#[must_use]
pub fn field_checksum(field: &str) -> i64 {
    let digest = Sha1::digest(field.as_bytes());
    i64::from(u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]))
}

/// Remove HTML tags from a field value
#[must_use]
pub fn strip_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut in_tag = false;
    for c in value.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            c if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::AudioRefs;

    fn cat() -> Card {
        Card {
            word: "cat".to_string(),
            pronunciation: "/kæt/".to_string(),
            definition: "A small feline.".to_string(),
            example: "The cat sat.".to_string(),
            part_of_speech: "noun".to_string(),
            audio: AudioRefs::for_word("cat"),
        }
    }

    #[test]
    fn note_binds_fields_in_model_order() {
        let note = Note::from_card(&cat());
        assert_eq!(note.fields.len(), WORD_MODEL_FIELDS.len());
        assert_eq!(note.fields[0], "cat");
        assert_eq!(note.fields[3], "The cat sat.");
        assert_eq!(note.fields[4], "[sound:cat_word.mp3]");
        assert_eq!(note.fields[5], "[sound:cat_def.mp3]");
        assert_eq!(note.fields[6], "[sound:cat_ex.mp3]");
        assert_eq!(note.joined_fields().split('\u{1f}').count(), 7);
    }

    #[test]
    fn guid_is_stable_per_word() {
        let a = Note::from_card(&cat());
        let b = Note::from_card(&cat());
        assert_eq!(a.guid, b.guid);
        assert!(!a.guid.is_empty());
        assert_ne!(a.guid, guid_for(&["dog"]));
    }

    #[test]
    fn deck_id_depends_only_on_name() {
        assert_eq!(deck_id_for("Animals"), deck_id_for("Animals"));
        assert_ne!(deck_id_for("Animals"), deck_id_for("Plants"));
        assert!(deck_id_for("") > 1);
        assert!(deck_id_for("Animals") < (1_i64 << 53));
    }

    #[test]
    fn checksum_matches_sha1_prefix() {
        // sha1("cat") = 9d989e8d27dc9e0ec3389fc855f142c3d40f0c50
        assert_eq!(field_checksum("cat"), 0x9d98_9e8d);
    }

    #[test]
    fn strips_markup_from_sort_field() {
        assert_eq!(strip_html("<b>bold</b> text"), "bold text");
        assert_eq!(strip_html("a > b"), "a > b");
    }

    #[test]
    fn model_json_lists_fields_and_template() {
        let json = NoteModel::word_model().to_json(42, 0);
        assert_eq!(json["flds"].as_array().unwrap().len(), 7);
        assert_eq!(json["flds"][6]["name"], "ExAudio");
        assert_eq!(json["tmpls"][0]["name"], "Card 1");
        assert_eq!(json["did"], 42);
    }
}
