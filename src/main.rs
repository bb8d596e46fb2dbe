//! # askdoc CLI
//!
//! Ask questions about uploaded PDFs from the terminal. Answers come from
//! the closest matching document chunk when it is similar enough, and from
//! a generative model otherwise. A separate `photos` command reads GPS
//! positions out of images.
//!
//! ## Usage
//!
//! ```bash
//! askdoc --config ./config/askdoc.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `askdoc init` | Create the SQLite database and schema |
//! | `askdoc ingest <paths>` | Extract, chunk, embed and store PDFs |
//! | `askdoc list` | List uploaded documents |
//! | `askdoc stats` | Row counts and store details |
//! | `askdoc search "<query>"` | Show the best matching chunks with scores |
//! | `askdoc ask "<question>"` | Answer one question |
//! | `askdoc chat` | Interactive question session |
//! | `askdoc photos <files>` | Locate photos and measure distances |
//! | `askdoc completions <shell>` | Print a shell completion script |
//!
//! Logging goes to stderr and is controlled with `RUST_LOG`
//! (default `warn`), e.g. `RUST_LOG=askdoc=debug askdoc ask "..."`.

use std::path::{Path, PathBuf};

use askdoc::config::{self, Config};
use askdoc::geo::{self, PhotoOptions};
use askdoc::progress::ProgressMode;
use askdoc::{chat, ingest, migrate, retrieval, sources, stats};
use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// askdoc: ask questions about your PDFs, with a generative fallback.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/askdoc.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "askdoc",
    about = "Ask questions about your PDFs, with a generative-model fallback",
    version,
    long_about = "askdoc splits PDFs into overlapping chunks, embeds them, and stores the vectors \
    in SQLite or Supabase. Questions are answered from the closest chunk when its similarity \
    clears a threshold, and by a generative model (Gemini or Ollama) otherwise."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/askdoc.toml`. Database, store, embedding, and
    /// model settings are read from this file.
    #[arg(long, global = true, default_value = "./config/askdoc.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and the `documents` table. This
    /// command is idempotent. For the Supabase backend it only checks the
    /// configuration.
    Init,

    /// Upload documents: extract, chunk, embed, and store.
    ///
    /// Directories are searched recursively for `.pdf` files. A file that
    /// fails is reported and skipped.
    Ingest {
        /// Files or directories to ingest.
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Extract and chunk only; print counts without embedding or storing.
        #[arg(long)]
        dry_run: bool,

        /// Progress output on stderr. Defaults to `human` on a terminal, `off` otherwise.
        #[arg(long, value_enum)]
        progress: Option<ProgressMode>,
    },

    /// List uploaded documents.
    List,

    /// Show store statistics.
    Stats,

    /// Show the best matching chunks for a query, with similarity scores.
    Search {
        query: String,

        /// Number of hits to show (defaults to `retrieval.top_k`).
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Answer a single question.
    Ask {
        question: String,

        /// Override `retrieval.threshold` for this question.
        #[arg(long, value_parser = parse_threshold)]
        threshold: Option<f64>,
    },

    /// Interactive question session on stdin.
    ///
    /// `/history` shows the conversation, `/clear` resets it, `/quit` exits.
    Chat {
        /// Override `retrieval.threshold` for this session.
        #[arg(long, value_parser = parse_threshold)]
        threshold: Option<f64>,
    },

    /// Locate photos from their EXIF GPS tags.
    ///
    /// Prints each photo's coordinates and the great-circle distance
    /// between every pair.
    Photos {
        /// Image files (JPEG, TIFF, PNG, WebP, HEIC).
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Reference point as `LAT,LON` to measure each photo against.
        #[arg(long, value_parser = parse_origin, allow_hyphen_values = true)]
        origin: Option<(f64, f64)>,

        /// Use road distance and duration from the routing service for `--origin`.
        #[arg(long, requires = "origin")]
        road: bool,

        /// Print the road route through all photos in the given order.
        #[arg(long)]
        route: bool,

        /// Look up a place name for each photo.
        #[arg(long)]
        geocode: bool,
    },

    /// Print a shell completion script.
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

fn parse_threshold(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a number", s))?;
    if !(-1.0..=1.0).contains(&value) {
        return Err(format!("threshold must be in [-1.0, 1.0], got {}", value));
    }
    Ok(value)
}

fn parse_origin(s: &str) -> Result<(f64, f64), String> {
    geo::parse_coords(s).map_err(|e| e.to_string())
}

/// Load the config file, or fall back to defaults when it doesn't exist.
/// Used by commands that don't touch the document store.
fn load_or_default(path: &Path) -> anyhow::Result<Config> {
    if path.exists() {
        config::load_config(path)
    } else {
        Ok(Config::default_for("./data/askdoc.sqlite"))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Commands that don't require the document store
    match &cli.command {
        Commands::Completions { shell } => {
            clap_complete::generate(*shell, &mut Cli::command(), "askdoc", &mut std::io::stdout());
            return Ok(());
        }
        Commands::Photos {
            files,
            origin,
            road,
            route,
            geocode,
        } => {
            let cfg = load_or_default(&cli.config)?;
            let opts = PhotoOptions {
                origin: *origin,
                road: *road,
                route: *route,
                geocode: *geocode,
            };
            geo::run_photos(&cfg, files, &opts).await?;
            return Ok(());
        }
        _ => {}
    }

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            if cfg.store.backend == "sqlite" {
                migrate::run_migrations(&cfg).await?;
                println!("Database initialized successfully.");
            } else {
                println!(
                    "Using the {} store at {}; create the `{}` table and `{}` function there.",
                    cfg.store.backend,
                    cfg.store.url.as_deref().unwrap_or("(unset)"),
                    cfg.store.table,
                    cfg.store.match_function
                );
            }
        }
        Commands::Ingest {
            paths,
            dry_run,
            progress,
        } => {
            ingest::run_ingest(&cfg, &paths, dry_run, progress).await?;
        }
        Commands::List => {
            sources::run_list(&cfg).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
        Commands::Search { query, limit } => {
            retrieval::run_search(&cfg, &query, limit).await?;
        }
        Commands::Ask {
            question,
            threshold,
        } => {
            chat::run_ask(&cfg, &question, threshold).await?;
        }
        Commands::Chat { threshold } => {
            chat::run_chat(&cfg, threshold).await?;
        }
        Commands::Photos { .. } | Commands::Completions { .. } => {
            // Handled above (before config loading)
            unreachable!()
        }
    }

    Ok(())
}
