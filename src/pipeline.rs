//! Request pipeline
//!
//! Runs one deck request end to end inside its own workspace:
//! build cards, save the record, package the archive.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use uuid::Uuid;

use crate::config::Config;
use crate::deck::{BuildReport, CardBuilder, record};
use crate::dictionary::DictionaryClient;
use crate::package::{DeckPackager, PackageReport};
use crate::voice::GoogleTts;
use crate::{Error, Result};

/// Record file name inside a workspace
pub const RECORD_FILE: &str = "record.json";

/// Archive file name inside a workspace
pub const ARCHIVE_FILE: &str = "deck.apkg";

/// Audio directory name inside a workspace
pub const AUDIO_DIR: &str = "audio";

/// Per-request directory holding audio, record and archive
#[derive(Debug, Clone)]
pub struct Workspace {
    pub id: Uuid,
    root: PathBuf,
}

impl Workspace {
    /// Workspace for an existing request id under `requests_dir`
    #[must_use]
    pub fn open(requests_dir: &Path, id: Uuid) -> Self {
        Self {
            id,
            root: requests_dir.join(id.to_string()),
        }
    }

    /// Create a fresh workspace with a new request id
    ///
    /// # Errors
    ///
    /// Returns error if the directories cannot be created
    pub fn create(requests_dir: &Path) -> Result<Self> {
        let workspace = Self::open(requests_dir, Uuid::new_v4());
        std::fs::create_dir_all(workspace.audio_dir())?;
        Ok(workspace)
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn audio_dir(&self) -> PathBuf {
        self.root.join(AUDIO_DIR)
    }

    #[must_use]
    pub fn record_path(&self) -> PathBuf {
        self.root.join(RECORD_FILE)
    }

    #[must_use]
    pub fn archive_path(&self) -> PathBuf {
        self.root.join(ARCHIVE_FILE)
    }

    /// Delete the workspace and everything in it
    pub fn remove(&self) {
        if let Err(e) = std::fs::remove_dir_all(&self.root) {
            tracing::warn!(path = %self.root.display(), error = %e, "failed to remove workspace");
        }
    }
}

/// Everything a finished request produced
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub request_id: Uuid,
    pub build: BuildReport,
    pub package: PackageReport,
}

/// Builds and packages decks, one workspace per request
#[derive(Clone)]
pub struct Pipeline {
    builder: CardBuilder,
    requests_dir: PathBuf,
    workspace_ttl: Option<Duration>,
}

impl Pipeline {
    #[must_use]
    pub fn new(builder: CardBuilder, requests_dir: impl Into<PathBuf>) -> Self {
        Self {
            builder,
            requests_dir: requests_dir.into(),
            workspace_ttl: None,
        }
    }

    /// Expire finished workspaces older than `ttl` (`None` keeps them forever)
    #[must_use]
    pub fn workspace_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.workspace_ttl = ttl;
        self
    }

    /// Wire the dictionary and TTS clients from configuration
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = config.http_client()?;
        let lookup = Arc::new(DictionaryClient::new(client.clone(), &config.dictionary.url));
        let tts = Arc::new(GoogleTts::new(client, &config.tts));
        let builder =
            CardBuilder::new(lookup, tts).max_concurrent_words(config.pipeline.max_concurrent_words);
        Ok(Self::new(builder, config.requests_dir()).workspace_ttl(config.pipeline.workspace_ttl))
    }

    #[must_use]
    pub fn requests_dir(&self) -> &Path {
        &self.requests_dir
    }

    /// Remove workspaces last modified longer ago than the workspace ttl
    ///
    /// Returns how many were removed. A missing requests directory or an
    /// unset ttl removes nothing.
    ///
    /// # Errors
    ///
    /// Returns error if the requests directory cannot be listed
    pub async fn sweep_expired(&self) -> Result<usize> {
        let Some(ttl) = self.workspace_ttl else {
            return Ok(0);
        };

        let mut entries = match tokio::fs::read_dir(&self.requests_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let now = SystemTime::now();
        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let modified = match entry.metadata().await {
                Ok(meta) if meta.is_dir() => meta.modified()?,
                Ok(_) => continue,
                Err(e) => {
                    tracing::debug!(path = %path.display(), error = %e, "skipping workspace");
                    continue;
                }
            };

            let age = now.duration_since(modified).unwrap_or_default();
            if age <= ttl {
                continue;
            }

            match tokio::fs::remove_dir_all(&path).await {
                Ok(()) => {
                    tracing::debug!(path = %path.display(), age_secs = age.as_secs(), "removed expired workspace");
                    removed += 1;
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "failed to remove expired workspace");
                }
            }
        }

        if removed > 0 {
            tracing::info!(removed, ttl_secs = ttl.as_secs(), "swept expired workspaces");
        }
        Ok(removed)
    }

    /// Build cards for `words` and package them as `deck_name`
    ///
    /// Expired workspaces are swept first. A failed request leaves no
    /// workspace behind.
    ///
    /// # Errors
    ///
    /// Returns input and aggregate errors from card building, and any error
    /// from saving the record or packaging
    pub async fn run(&self, words: &[String], deck_name: &str) -> Result<PipelineOutcome> {
        if let Err(e) = self.sweep_expired().await {
            tracing::warn!(error = %e, "workspace sweep failed");
        }

        let workspace = Workspace::create(&self.requests_dir)?;
        tracing::debug!(request_id = %workspace.id, "created workspace");

        match self.run_in(&workspace, words, deck_name).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                workspace.remove();
                Err(e)
            }
        }
    }

    async fn run_in(
        &self,
        workspace: &Workspace,
        words: &[String],
        deck_name: &str,
    ) -> Result<PipelineOutcome> {
        let build = self
            .builder
            .build(words, deck_name, &workspace.audio_dir())
            .await?;

        let record_path = workspace.record_path();
        let archive_path = workspace.archive_path();
        let packager = DeckPackager::new(workspace.audio_dir());
        let record = build.record();

        let package = tokio::task::spawn_blocking(move || {
            record::save(&record, &record_path)?;
            packager.package(&record_path, &archive_path)
        })
        .await
        .map_err(|e| Error::Package(format!("packaging task failed: {e}")))??;

        tracing::info!(
            request_id = %workspace.id,
            deck = %build.deck_name,
            cards = build.cards.len(),
            failed = build.failed.len(),
            "request complete"
        );

        Ok(PipelineOutcome {
            request_id: workspace.id,
            build,
            package,
        })
    }
}
