//! TOML configuration file loading
//!
//! Supports `~/.config/vocab-deck/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Env var that points at an alternative config file
pub const CONFIG_PATH_ENV: &str = "VOCAB_DECK_CONFIG";

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    /// HTTP server and storage configuration
    #[serde(default)]
    pub server: ServerFileConfig,

    /// Dictionary lookup configuration
    #[serde(default)]
    pub dictionary: DictionaryFileConfig,

    /// Speech synthesis configuration
    #[serde(default)]
    pub tts: TtsFileConfig,

    /// Card building configuration
    #[serde(default)]
    pub pipeline: PipelineFileConfig,
}

/// Server/runtime configuration
#[derive(Debug, Default, Deserialize)]
pub struct ServerFileConfig {
    /// HTTP port
    pub port: Option<u16>,

    /// Directory holding per-request workspaces
    pub data_dir: Option<String>,

    /// Directory with a custom web UI
    pub static_dir: Option<String>,

    /// Maximum accepted upload size in bytes
    pub max_upload_bytes: Option<usize>,
}

/// Dictionary lookup configuration
#[derive(Debug, Default, Deserialize)]
pub struct DictionaryFileConfig {
    /// Entries endpoint, the word is appended as the last path segment
    pub url: Option<String>,
}

/// Speech synthesis configuration
#[derive(Debug, Default, Deserialize)]
pub struct TtsFileConfig {
    /// Host serving `/translate_tts`
    pub host: Option<String>,

    /// Spoken language code (e.g. "en")
    pub lang: Option<String>,

    /// Use the slow speaking rate
    pub slow: Option<bool>,
}

/// Card building configuration
#[derive(Debug, Default, Deserialize)]
pub struct PipelineFileConfig {
    /// Words enriched at the same time
    pub max_concurrent_words: Option<usize>,

    /// Per-request timeout for outbound HTTP calls
    pub http_timeout_secs: Option<u64>,

    /// Age after which finished request workspaces are deleted (0 = keep)
    pub workspace_ttl_secs: Option<u64>,
}

/// Load the TOML config file from `VOCAB_DECK_CONFIG` or the standard path
///
/// Returns `ConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> ConfigFile {
    let path = std::env::var(CONFIG_PATH_ENV)
        .ok()
        .map(PathBuf::from)
        .or_else(config_file_path);

    match path {
        Some(path) if path.exists() => load_from(&path),
        _ => ConfigFile::default(),
    }
}

/// Load a specific config file, falling back to defaults on any error
pub fn load_from(path: &Path) -> ConfigFile {
    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                ConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            ConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/vocab-deck/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("vocab-deck").join("config.toml"))
}
