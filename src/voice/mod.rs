//! Voice processing module
//!
//! Speech synthesis for the word, definition and example clips on each card.

mod tts;

pub use tts::{GoogleTts, MAX_CHUNK_CHARS, SpeechSynthesizer, split_text};
