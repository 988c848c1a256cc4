use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use vocab_deck::api::ApiServer;
use vocab_deck::deck::record;
use vocab_deck::{CardBuilder, Config, DeckPackager, DictionaryClient, GoogleTts, WordLookup, ingest};

/// Vocab Deck - turn vocabulary lists into Anki decks with spoken audio
#[derive(Parser)]
#[command(name = "vocab-deck", version, about)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the web server (default)
    Serve {
        /// Port to listen on (overrides config)
        #[arg(long, env = "VOCAB_DECK_PORT")]
        port: Option<u16>,
    },
    /// Build and package a deck from the command line
    Build {
        /// Deck name
        #[arg(short, long)]
        deck: String,
        /// Read words from a .txt or .csv file instead of arguments
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Where to write the .apkg (audio and record go beside it)
        #[arg(short, long, default_value = "deck.apkg")]
        output: PathBuf,
        /// Words to add
        #[arg(conflicts_with = "file")]
        words: Vec<String>,
    },
    /// Package an existing deck record
    Package {
        /// Path to the record JSON
        #[arg(short, long)]
        record: PathBuf,
        /// Directory holding the referenced audio
        #[arg(short, long)]
        media: PathBuf,
        /// Where to write the .apkg
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Rewrite a legacy record file in the current format
    MigrateRecord {
        /// Path to the record JSON
        path: PathBuf,
    },
    /// Look up a single word and print the card text
    Lookup {
        /// Word to look up
        word: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,vocab_deck=info",
        1 => "info,vocab_deck=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load()?;
    tracing::debug!(?config, "loaded configuration");

    match cli.command.unwrap_or(Command::Serve { port: None }) {
        Command::Serve { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            serve(&config).await
        }
        Command::Build {
            deck,
            file,
            output,
            words,
        } => build(&config, &deck, file.as_deref(), &output, words).await,
        Command::Package {
            record,
            media,
            output,
        } => package(&record, &media, &output),
        Command::MigrateRecord { path } => migrate_record(&path),
        Command::Lookup { word } => lookup(&config, &word).await,
    }
}

async fn serve(config: &Config) -> anyhow::Result<()> {
    tracing::info!(port = config.server.port, "starting vocab-deck");
    ApiServer::from_config(config)?.run().await?;
    Ok(())
}

async fn build(
    config: &Config,
    deck_name: &str,
    file: Option<&Path>,
    output: &Path,
    words: Vec<String>,
) -> anyhow::Result<()> {
    let words = match file {
        Some(path) => {
            let content = std::fs::read(path)?;
            ingest::words_from_upload(&path.to_string_lossy(), &content)?
        }
        None => words,
    };

    let client = config.http_client()?;
    let builder = CardBuilder::new(
        Arc::new(DictionaryClient::new(client.clone(), &config.dictionary.url)),
        Arc::new(GoogleTts::new(client, &config.tts)),
    )
    .max_concurrent_words(config.pipeline.max_concurrent_words);

    let base = output.parent().unwrap_or_else(|| Path::new("."));
    let audio_dir = base.join("audio");
    let record_path = base.join("record.json");

    let report = builder.build(&words, deck_name, &audio_dir).await?;
    record::save(&report.record(), &record_path)?;
    let packaged = DeckPackager::new(&audio_dir).package(&record_path, output)?;

    println!(
        "Generated {} cards for \"{}\" -> {}",
        report.cards.len(),
        report.deck_name,
        packaged.archive_path.display()
    );
    if !report.failed.is_empty() {
        println!("Failed: {}", report.failed.join(", "));
    }
    if !report.degraded.is_empty() {
        println!("Missing definition or example: {}", report.degraded.join(", "));
    }
    if !packaged.missing_media.is_empty() {
        println!("Audio missing from deck: {}", packaged.missing_media.join(", "));
    }
    Ok(())
}

fn package(record_path: &Path, media: &Path, output: &Path) -> anyhow::Result<()> {
    let report = DeckPackager::new(media).package(record_path, output)?;
    println!(
        "Packaged {} notes ({} media files) for \"{}\" -> {}",
        report.note_count,
        report.media_count,
        report.deck_name,
        report.archive_path.display()
    );
    if !report.missing_media.is_empty() {
        println!("Audio missing from deck: {}", report.missing_media.join(", "));
    }
    Ok(())
}

fn migrate_record(path: &Path) -> anyhow::Result<()> {
    let record = record::migrate_legacy(path)?;
    println!(
        "{}: \"{}\" with {} cards (version {})",
        path.display(),
        record.deck_name,
        record.cards.len(),
        record.version
    );
    Ok(())
}

async fn lookup(config: &Config, word: &str) -> anyhow::Result<()> {
    let client = DictionaryClient::new(config.http_client()?, &config.dictionary.url);
    let data = client.lookup(word).await?;

    println!("Word:           {word}");
    println!("Pronunciation:  {}", data.pronunciation);
    println!("Part of speech: {}", data.part_of_speech);
    println!("Definition:     {}", data.definition);
    println!("Example:        {}", data.example);
    if data.is_degraded() {
        println!("(placeholder text used)");
    }
    Ok(())
}
