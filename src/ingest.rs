//! Word list ingestion
//!
//! Turns typed input and uploaded `.txt`/`.csv` files into an ordered,
//! deduplicated list of words.

use std::collections::HashSet;
use std::path::Path;

use crate::{Error, Result};

/// Characters that separate words inside a single CSV cell
const CELL_SEPARATORS: [char; 5] = [',', ';', '|', '\t', '\n'];

/// Supported upload formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    /// One word per line
    Text,
    /// Words in any cell, cells may hold several words
    Csv,
}

impl UploadKind {
    /// Detect the format from an uploaded file name (case-insensitive extension)
    ///
    /// # Errors
    ///
    /// Returns `Error::Input` for anything but `.txt` and `.csv`
    pub fn from_file_name(name: &str) -> Result<Self> {
        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match ext.as_deref() {
            Some("txt") => Ok(Self::Text),
            Some("csv") => Ok(Self::Csv),
            _ => Err(Error::Input(
                "Only .txt and .csv files are allowed".to_string(),
            )),
        }
    }
}

/// Split newline-delimited text into trimmed, non-empty words
#[must_use]
pub fn parse_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Collect words from every cell of a comma-delimited file
///
/// Each cell is split again on `, ; | tab newline` so a single cell such as
/// `"cat, dog; fox"` yields three words.
///
/// # Errors
///
/// Returns error if the CSV is malformed
pub fn parse_csv(text: &str) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(b',')
        .from_reader(text.as_bytes());

    let mut words = Vec::new();
    for record in reader.records() {
        let record = record?;
        for cell in &record {
            words.extend(
                cell.split(CELL_SEPARATORS)
                    .map(str::trim)
                    .filter(|word| !word.is_empty())
                    .map(ToString::to_string),
            );
        }
    }
    Ok(words)
}

/// Extract words from an uploaded file
///
/// # Errors
///
/// Returns `Error::Input` for unsupported file types or non-UTF-8 content,
/// and a CSV error for malformed CSV
pub fn words_from_upload(file_name: &str, content: &[u8]) -> Result<Vec<String>> {
    let kind = UploadKind::from_file_name(file_name)?;
    let text = std::str::from_utf8(content)
        .map_err(|e| Error::Input(format!("Error reading uploaded file: {e}")))?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    match kind {
        UploadKind::Text => Ok(parse_lines(text)),
        UploadKind::Csv => parse_csv(text),
    }
}

/// Remove repeated words, keeping the first occurrence (case-sensitive)
#[must_use]
pub fn dedupe<I, S>(words: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    words
        .into_iter()
        .filter_map(|word| {
            let word = word.as_ref().trim();
            (!word.is_empty() && seen.insert(word.to_string())).then(|| word.to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_are_trimmed_and_blank_lines_dropped() {
        assert_eq!(
            parse_lines("cat\r\n  dog  \n\n\t\nfox"),
            vec!["cat", "dog", "fox"]
        );
    }

    #[test]
    fn csv_cell_with_mixed_separators() {
        assert_eq!(parse_csv("\"cat, dog; fox\"\n").unwrap(), vec!["cat", "dog", "fox"]);
    }

    #[test]
    fn csv_rows_of_different_widths() {
        let words = parse_csv("apple,banana\ncherry\n\n date | elder ,\n").unwrap();
        assert_eq!(words, vec!["apple", "banana", "cherry", "date", "elder"]);
    }

    #[test]
    fn csv_quoted_newline_splits() {
        assert_eq!(parse_csv("\"one\ntwo\",three").unwrap(), vec!["one", "two", "three"]);
    }

    #[test]
    fn upload_kind_by_extension() {
        assert_eq!(UploadKind::from_file_name("words.TXT").unwrap(), UploadKind::Text);
        assert_eq!(UploadKind::from_file_name("list.csv").unwrap(), UploadKind::Csv);
        assert!(matches!(
            UploadKind::from_file_name("words.pdf"),
            Err(Error::Input(_))
        ));
        assert!(UploadKind::from_file_name("noext").is_err());
    }

    #[test]
    fn upload_strips_byte_order_mark() {
        let words = words_from_upload("w.txt", "\u{feff}cat\ndog\n".as_bytes()).unwrap();
        assert_eq!(words, vec!["cat", "dog"]);
    }

    #[test]
    fn upload_rejects_invalid_utf8() {
        let err = words_from_upload("w.txt", &[0xff, 0xfe, 0x00]).unwrap_err();
        assert!(matches!(err, Error::Input(_)));
    }

    #[test]
    fn dedupe_preserves_first_occurrence_order() {
        assert_eq!(dedupe(["cat", "cat", "dog"]), vec!["cat", "dog"]);
        assert_eq!(
            dedupe(["b", "a", "B", "a", "b"]),
            vec!["b", "a", "B"]
        );
    }

    #[test]
    fn dedupe_drops_blank_entries() {
        assert_eq!(dedupe(vec![" ".to_string(), "x".to_string()]), vec!["x"]);
    }
}
