//! Dictionary API response types and card field extraction

use serde::Deserialize;

/// Part of speech used when no meaning names one
pub const UNKNOWN_PART_OF_SPEECH: &str = "unknown";

/// One entry returned by the dictionary API
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Entry {
    #[serde(default)]
    pub word: String,
    pub phonetic: Option<String>,
    #[serde(default)]
    pub phonetics: Vec<Phonetic>,
    #[serde(default)]
    pub meanings: Vec<Meaning>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Phonetic {
    pub text: Option<String>,
    pub audio: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meaning {
    pub part_of_speech: Option<String>,
    #[serde(default)]
    pub definitions: Vec<Definition>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Definition {
    pub definition: Option<String>,
    pub example: Option<String>,
}

/// Card fields extracted for a single word
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordData {
    pub pronunciation: String,
    pub definition: String,
    pub example: String,
    pub part_of_speech: String,
    /// False when `definition` is a placeholder
    pub has_definition: bool,
    /// False when `example` is a placeholder
    pub has_example: bool,
}

impl WordData {
    /// Extract card fields from a dictionary entry
    ///
    /// Takes the first non-empty definition, example and part of speech in
    /// the order the entry lists them. Missing fields get placeholder text.
    #[must_use]
    pub fn from_entry(word: &str, entry: &Entry) -> Self {
        let mut definition = None;
        let mut example = None;
        let mut part_of_speech = None;

        for meaning in &entry.meanings {
            for def in &meaning.definitions {
                if definition.is_none() {
                    definition = non_empty(def.definition.as_deref());
                }
                if example.is_none() {
                    example = non_empty(def.example.as_deref());
                }
            }
            if part_of_speech.is_none() {
                part_of_speech = non_empty(meaning.part_of_speech.as_deref());
            }
            if definition.is_some() && example.is_some() && part_of_speech.is_some() {
                break;
            }
        }

        let pronunciation = non_empty(entry.phonetic.as_deref())
            .or_else(|| {
                entry
                    .phonetics
                    .iter()
                    .find_map(|p| non_empty(p.text.as_deref()))
            })
            .unwrap_or_default();

        Self {
            pronunciation: pronunciation.to_string(),
            has_definition: definition.is_some(),
            has_example: example.is_some(),
            definition: definition.map_or_else(
                || format!("No definition found for {word}."),
                ToString::to_string,
            ),
            example: example.map_or_else(
                || format!("No example found for {word}."),
                ToString::to_string,
            ),
            part_of_speech: part_of_speech
                .unwrap_or(UNKNOWN_PART_OF_SPEECH)
                .to_string(),
        }
    }

    /// Whether any text field fell back to a placeholder
    #[must_use]
    pub const fn is_degraded(&self) -> bool {
        !self.has_definition || !self.has_example
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.trim().is_empty())
}
