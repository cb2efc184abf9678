//! emoji-atlas CLI
//!
//! Builds segment files from an emoji URL list and queries them.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use emoji_atlas::{
    EmojiStore,
    config::load_source,
    error::{AppError, Result},
    models::Config,
    pipeline::{IngestOptions, IngestPipeline, Loader},
    services::{Fetcher, Transcoder},
    storage::{LocalStorage, local::list_segments},
};

/// emoji-atlas - emoji image dataset builder
#[derive(Parser, Debug)]
#[command(
    name = "emoji-atlas",
    version,
    about = "Build and query a compact emoji image dataset"
)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch, transcode and write segment files
    Ingest {
        /// JSON object mapping emoji name to image URL
        #[arg(long)]
        source: PathBuf,

        /// First chunk to process (resume point)
        #[arg(long)]
        start: Option<usize>,

        /// Entries per chunk
        #[arg(long)]
        chunk_size: Option<usize>,

        /// Output directory for segments
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skip chunks whose segment already exists
        #[arg(long)]
        skip_existing: bool,
    },

    /// Look up an emoji by name or codepoints
    Lookup(LookupArgs),

    /// Show the segments and dataset size
    Info,

    /// Validate the configuration file
    Validate,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct LookupArgs {
    /// Emoji name, e.g. grinning-face
    #[arg(long)]
    name: Option<String>,

    /// Codepoints, e.g. "U+1F600"
    #[arg(long)]
    unicode: Option<String>,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool, level: &str) {
    let level = if verbose { "debug" } else { level };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = Config::load(&cli.config);
    let level = loaded
        .as_ref()
        .map_or_else(|_| "info".to_string(), |c| c.logging.level.clone());
    init_logging(cli.verbose, &level);

    let mut config = loaded.unwrap_or_else(|e| {
        log::warn!(
            "Config load failed from {}: {}. Using defaults.",
            cli.config.display(),
            e
        );
        Config::default()
    });
    if let Err(e) = config.validate() {
        log::error!("Config validation failed: {}", e);
        return Err(e);
    }

    match cli.command {
        Command::Ingest {
            source,
            start,
            chunk_size,
            output,
            skip_existing,
        } => {
            if let Some(start) = start {
                config.ingest.start_index = start;
            }
            if let Some(size) = chunk_size {
                config.ingest.chunk_size = size;
            }
            if let Some(dir) = output {
                config.ingest.output_dir = dir;
            }
            config.ingest.skip_existing |= skip_existing;
            config.validate()?;

            let mapping = load_source(&source)?;
            let storage = LocalStorage::new(&config.ingest.output_dir)
                .with_compression(config.ingest.compress);
            if !config.ingest.compress {
                log::warn!("Writing uncompressed segments; gzip them before serving");
            }

            let pipeline = IngestPipeline::new(
                Fetcher::from_config(&config.fetch)?,
                Transcoder::new(&config.transcode),
                Arc::new(storage),
                IngestOptions::from_config(&config),
            );
            let report = pipeline
                .run(&mapping, config.ingest.chunk_size, config.ingest.start_index)
                .await?;

            log::info!(
                "All segments processed: {} written, {} emojis dropped",
                report.chunks_written,
                report.items_failed
            );
            if report.chunks_failed > 0 {
                log::warn!(
                    "{} segments failed to persist; rerun with --skip-existing to fill them in",
                    report.chunks_failed
                );
            }
        }

        Command::Lookup(args) => {
            let store = EmojiStore::from_config(&config.store);
            let (key, found) = match (args.name, args.unicode) {
                (Some(name), _) => {
                    let found = store.get_by_name(&name).await?;
                    (name, found)
                }
                (None, Some(unicode)) => {
                    let found = store.get_by_unicode(&unicode).await?;
                    (unicode, found)
                }
                (None, None) => return Err(AppError::validation("pass --name or --unicode")),
            };

            match found {
                Some(uri) => println!("{uri}"),
                None => log::warn!("{} not found", key),
            }
        }

        Command::Info => {
            let paths = if config.store.segments.is_empty() {
                list_segments(&config.store.segment_dir).await?
            } else {
                config.store.segments.clone()
            };
            log::info!("Segments ({}):", paths.len());
            for path in &paths {
                log::info!("    {}", path.display());
            }

            let store = EmojiStore::new(Loader::new(paths));
            let catalog = store.get_all().await?;
            log::info!("Emojis: {}", catalog.len());
            log::info!("Prefix: {}", catalog.prefix());
            log::info!("Names overridden by later segments: {}", catalog.duplicate_names());
            log::info!("Shared unicode values: {}", catalog.duplicate_unicodes());
        }

        Command::Validate => {
            log::info!("✓ Config OK ({})", cli.config.display());
        }
    }

    Ok(())
}
