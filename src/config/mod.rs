//! Configuration management for vocab-deck

pub mod file;

use std::path::PathBuf;
use std::time::Duration;

use crate::{Error, Result};

pub use file::ConfigFile;

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 3000;

/// Default upload limit (5 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Default lifetime of a request workspace (24 hours)
pub const DEFAULT_WORKSPACE_TTL_SECS: u64 = 24 * 60 * 60;

/// Default dictionary entries endpoint
pub const DEFAULT_DICTIONARY_URL: &str = "https://api.dictionaryapi.dev/api/v2/entries/en";

/// Default host serving `/translate_tts`
pub const DEFAULT_TTS_HOST: &str = "https://translate.google.com";

/// vocab-deck configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server and storage configuration
    pub server: ServerConfig,

    /// Dictionary lookup configuration
    pub dictionary: DictionaryConfig,

    /// Speech synthesis configuration
    pub tts: TtsConfig,

    /// Card building configuration
    pub pipeline: PipelineConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to listen on
    pub port: u16,

    /// Root for per-request workspaces (`{data_dir}/requests/{id}`)
    pub data_dir: PathBuf,

    /// Path to static files directory (web UI)
    pub static_dir: Option<PathBuf>,

    /// Maximum accepted upload size in bytes
    pub max_upload_bytes: usize,
}

/// Dictionary lookup configuration
#[derive(Debug, Clone)]
pub struct DictionaryConfig {
    /// Entries endpoint
    pub url: String,
}

/// Speech synthesis configuration
#[derive(Debug, Clone)]
pub struct TtsConfig {
    /// Host serving `/translate_tts`
    pub host: String,

    /// Spoken language code
    pub lang: String,

    /// Use the slow speaking rate
    pub slow: bool,
}

/// Card building configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Words enriched at the same time (1 = strictly sequential)
    pub max_concurrent_words: usize,

    /// Timeout applied to every outbound HTTP call
    pub http_timeout: Option<Duration>,

    /// Finished workspaces older than this are swept (`None` keeps them)
    pub workspace_ttl: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                port: DEFAULT_PORT,
                data_dir: default_data_dir(),
                static_dir: None,
                max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            },
            dictionary: DictionaryConfig {
                url: DEFAULT_DICTIONARY_URL.to_string(),
            },
            tts: TtsConfig {
                host: DEFAULT_TTS_HOST.to_string(),
                lang: "en".to_string(),
                slow: false,
            },
            pipeline: PipelineConfig {
                max_concurrent_words: 1,
                http_timeout: None,
                workspace_ttl: Some(Duration::from_secs(DEFAULT_WORKSPACE_TTL_SECS)),
            },
        }
    }
}

/// Default data directory (`~/.local/share/vocab-deck` on Linux)
fn default_data_dir() -> PathBuf {
    directories::BaseDirs::new()
        .map_or_else(|| PathBuf::from("data"), |d| d.data_dir().join("vocab-deck"))
}

impl Config {
    /// Load configuration (env > toml > default)
    ///
    /// # Errors
    ///
    /// Returns error if a setting is out of range
    pub fn load() -> Result<Self> {
        Self::resolve(file::load_config_file(), |key| std::env::var(key).ok())
    }

    /// Merge a parsed config file with environment lookups
    ///
    /// # Errors
    ///
    /// Returns error if a setting is out of range
    pub fn resolve<F>(fc: ConfigFile, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let server = ServerConfig {
            port: env("VOCAB_DECK_PORT")
                .or_else(|| env("PORT"))
                .and_then(|s| s.parse().ok())
                .or(fc.server.port)
                .unwrap_or(defaults.server.port),
            data_dir: env("VOCAB_DECK_DATA_DIR")
                .or(fc.server.data_dir)
                .map_or(defaults.server.data_dir, PathBuf::from),
            static_dir: env("VOCAB_DECK_STATIC_DIR")
                .or(fc.server.static_dir)
                .map(PathBuf::from),
            max_upload_bytes: env("VOCAB_DECK_MAX_UPLOAD_BYTES")
                .and_then(|s| s.parse().ok())
                .or(fc.server.max_upload_bytes)
                .unwrap_or(defaults.server.max_upload_bytes),
        };

        let dictionary = DictionaryConfig {
            url: env("VOCAB_DECK_DICTIONARY_URL")
                .or(fc.dictionary.url)
                .unwrap_or(defaults.dictionary.url),
        };

        let tts = TtsConfig {
            host: env("VOCAB_DECK_TTS_HOST")
                .or(fc.tts.host)
                .unwrap_or(defaults.tts.host),
            lang: env("VOCAB_DECK_TTS_LANG")
                .or(fc.tts.lang)
                .unwrap_or(defaults.tts.lang),
            slow: fc.tts.slow.unwrap_or(defaults.tts.slow),
        };

        let max_concurrent_words = env("VOCAB_DECK_CONCURRENCY")
            .and_then(|s| s.parse().ok())
            .or(fc.pipeline.max_concurrent_words)
            .unwrap_or(defaults.pipeline.max_concurrent_words);
        if max_concurrent_words == 0 {
            return Err(Error::Config(
                "max_concurrent_words must be at least 1".to_string(),
            ));
        }

        let http_timeout = env("VOCAB_DECK_HTTP_TIMEOUT_SECS")
            .and_then(|s| s.parse().ok())
            .or(fc.pipeline.http_timeout_secs)
            .map(Duration::from_secs);

        let workspace_ttl = env("VOCAB_DECK_WORKSPACE_TTL_SECS")
            .and_then(|s| s.parse().ok())
            .or(fc.pipeline.workspace_ttl_secs)
            .map_or(defaults.pipeline.workspace_ttl, |secs| {
                (secs > 0).then(|| Duration::from_secs(secs))
            });

        Ok(Self {
            server,
            dictionary,
            tts,
            pipeline: PipelineConfig {
                max_concurrent_words,
                http_timeout,
                workspace_ttl,
            },
        })
    }

    /// Directory holding one workspace per request
    #[must_use]
    pub fn requests_dir(&self) -> PathBuf {
        self.server.data_dir.join("requests")
    }

    /// Build the HTTP client shared by the dictionary and TTS clients
    ///
    /// # Errors
    ///
    /// Returns error if the client cannot be built
    pub fn http_client(&self) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("vocab-deck/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = self.pipeline.http_timeout {
            builder = builder.timeout(timeout);
        }
        builder.build().map_err(Error::Http)
    }
}
