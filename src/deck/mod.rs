//! Cards and the intermediate deck record
//!
//! A [`Card`] is built once per successfully enriched word and never changes
//! afterwards. The ordered cards plus the deck name form a [`DeckRecord`], which
//! is written to disk between card building and packaging.

pub mod builder;
pub mod record;

use std::fmt::Write;

use serde::{Deserialize, Serialize};

pub use builder::{BuildReport, CardBuilder};
pub use record::{DeckRecord, RECORD_VERSION};

/// Deck name given to records that predate named decks
pub const DEFAULT_DECK_NAME: &str = "My Vocab Deck";

/// A fully enriched, audio-backed flashcard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub word: String,
    #[serde(default)]
    pub pronunciation: String,
    #[serde(default)]
    pub definition: String,
    #[serde(default)]
    pub example: String,
    #[serde(default)]
    pub part_of_speech: String,
    pub audio: AudioRefs,
}

/// Audio file names for the three spoken fields of a card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioRefs {
    pub word: String,
    pub definition: String,
    pub example: String,
}

impl AudioRefs {
    /// File names derived from the word (`{word}_word.mp3`, `{word}_def.mp3`, `{word}_ex.mp3`)
    #[must_use]
    pub fn for_word(word: &str) -> Self {
        Self {
            word: AudioField::Word.file_name(word),
            definition: AudioField::Definition.file_name(word),
            example: AudioField::Example.file_name(word),
        }
    }

    /// All three file names in field order
    #[must_use]
    pub fn file_names(&self) -> [&str; 3] {
        [&self.word, &self.definition, &self.example]
    }
}

/// Which card field an audio clip speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioField {
    Word,
    Definition,
    Example,
}

impl AudioField {
    const fn suffix(self) -> &'static str {
        match self {
            Self::Word => "word",
            Self::Definition => "def",
            Self::Example => "ex",
        }
    }

    /// Audio file name for this field of `word`
    #[must_use]
    pub fn file_name(self, word: &str) -> String {
        format!("{}_{}.mp3", file_stem(word), self.suffix())
    }
}

/// Make a word safe to use as a single path component
///
/// Separators, characters rejected by common filesystems, `%` and a leading
/// `.` are percent-encoded byte by byte. The mapping is injective, so two
/// different words never share audio files.
fn file_stem(word: &str) -> String {
    let mut stem = String::with_capacity(word.len());
    for (i, c) in word.chars().enumerate() {
        let reserved = matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '%')
            || c.is_control()
            || (i == 0 && c == '.');
        if reserved {
            let mut buf = [0u8; 4];
            for byte in c.encode_utf8(&mut buf).bytes() {
                let _ = write!(stem, "%{byte:02X}");
            }
        } else {
            stem.push(c);
        }
    }
    stem
}

/// Whether `name` refers to a file directly inside a directory
#[must_use]
pub fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && !name.chars().any(char::is_control)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audio_names_follow_word() {
        let refs = AudioRefs::for_word("cat");
        assert_eq!(refs.file_names(), ["cat_word.mp3", "cat_def.mp3", "cat_ex.mp3"]);
    }

    #[test]
    fn unsafe_characters_are_replaced() {
        assert_eq!(AudioField::Word.file_name("either/or"), "either%2For_word.mp3");
        assert_eq!(AudioField::Example.file_name("..hidden"), "%2E.hidden_ex.mp3");
        assert_eq!(AudioField::Word.file_name("50%"), "50%25_word.mp3");
        assert_eq!(AudioField::Definition.file_name("ice cream"), "ice cream_def.mp3");
    }

    #[test]
    fn distinct_words_get_distinct_names() {
        let words = ["a/b", "a_b", "a%2Fb", "a:b", ".x", "%2Ex", "x\ty", "x_ty"];
        let mut seen = std::collections::HashSet::new();
        for word in words {
            for name in AudioRefs::for_word(word).file_names() {
                assert!(seen.insert(name.to_string()), "{word} reuses {name}");
            }
        }
    }

    #[test]
    fn generated_names_are_plain() {
        for word in ["cat", "a/b", "..", "x\ty", "naïve"] {
            for name in AudioRefs::for_word(word).file_names() {
                assert!(is_plain_file_name(name), "{name}");
            }
        }
        assert!(!is_plain_file_name("../etc/passwd"));
        assert!(!is_plain_file_name(""));
    }

    #[test]
    fn card_uses_camel_case_on_disk() {
        let card = Card {
            word: "cat".to_string(),
            pronunciation: "/kæt/".to_string(),
            definition: "A small feline.".to_string(),
            example: "The cat sat.".to_string(),
            part_of_speech: "noun".to_string(),
            audio: AudioRefs::for_word("cat"),
        };

        let json = serde_json::to_value(&card).unwrap();
        assert_eq!(json["partOfSpeech"], "noun");
        assert_eq!(json["audio"]["definition"], "cat_def.mp3");
    }
}
