//! # Halilit catalog CLI (`halilit`)
//!
//! Inspect, validate and serve the static brand catalog.
//!
//! ## Usage
//!
//! ```bash
//! halilit --config ./halilit.toml <command>
//! halilit --data ./frontend/public/data <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `halilit brands` | List brands in the master index |
//! | `halilit stats` | Index totals |
//! | `halilit brand <id>` | One brand's products and their galaxy/spectrum |
//! | `halilit category <id>` | Products in a galaxy or spectrum, across brands |
//! | `halilit search "<query>"` | Fuzzy search over the search index |
//! | `halilit galaxies` | The universal category taxonomy |
//! | `halilit validate` | Check every catalog file against its schema |
//! | `halilit note <brand> <product>` | Edit local rating, tags and notes |
//! | `halilit serve` | Start the read-only HTTP API |
//!
//! Logging goes to stderr via `env_logger`; set `RUST_LOG=debug` for detail.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use halilit_catalog::commands::{self, NoteEdit};
use halilit_catalog::config::{self, Config};
use halilit_catalog::server;

/// Halilit catalog tools: load, search and serve the brand catalog.
#[derive(Parser)]
#[command(
    name = "halilit",
    about = "Halilit Support Center catalog tools",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./halilit.toml")]
    config: PathBuf,

    /// Catalog data directory or base URL. Overrides `[data].base`; the
    /// config file becomes optional.
    #[arg(long, global = true)]
    data: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List brands in the master index.
    Brands,

    /// Show master index totals.
    Stats,

    /// Show one brand and where each product lands in the taxonomy.
    Brand {
        /// Brand id (e.g. `roland`).
        id: String,
    },

    /// List products in a galaxy or spectrum (`all` for everything).
    Category {
        /// Galaxy or spectrum id (e.g. `keys`, `synthesizers`).
        id: String,

        /// Restrict to one brand.
        #[arg(long)]
        brand: Option<String>,
    },

    /// Fuzzy search over the search index.
    Search {
        query: String,

        #[arg(long)]
        brand: Option<String>,

        #[arg(long)]
        category: Option<String>,

        /// Maximum number of results.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// List the universal galaxies and their spectra.
    Galaxies,

    /// Validate every catalog file. Exits non-zero on any failure.
    Validate,

    /// Edit your local rating, tags and notes for a product.
    Note {
        brand: String,
        product: String,

        /// Rating from 1 to 5.
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
        rating: Option<u8>,

        /// Remove the rating.
        #[arg(long, conflicts_with = "rating")]
        no_rating: bool,

        /// Add a tag (repeatable).
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Remove a tag (repeatable).
        #[arg(long)]
        untag: Vec<String>,

        #[arg(long)]
        notes: Option<String>,

        /// Drop all existing fields before applying the rest.
        #[arg(long)]
        clear: bool,
    },

    /// Start the read-only HTTP API on `[server].bind`.
    Serve,
}

fn resolve_config(path: &Path, data: Option<&str>) -> Result<Config> {
    let cfg = match data {
        Some(base) if !path.exists() => Config::minimal(base),
        Some(base) => {
            let mut cfg = config::load_config(path)?;
            cfg.data.base = base.to_string();
            config::validate(&cfg)?;
            cfg
        }
        None => config::load_config(path)?,
    };
    Ok(cfg)
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let Cli {
        config,
        data,
        command,
    } = Cli::parse();
    // only commands that touch the catalog read the config
    let cfg = || resolve_config(&config, data.as_deref());

    match command {
        Commands::Brands => commands::run_brands(&cfg()?).await?,
        Commands::Stats => commands::run_stats(&cfg()?).await?,
        Commands::Brand { id } => commands::run_brand(&cfg()?, &id).await?,
        Commands::Category { id, brand } => {
            commands::run_category(&cfg()?, &id, brand.as_deref()).await?
        }
        Commands::Search {
            query,
            brand,
            category,
            limit,
        } => commands::run_search(&cfg()?, &query, brand, category, limit).await?,
        Commands::Galaxies => commands::run_galaxies(),
        Commands::Validate => commands::run_validate(&cfg()?).await?,
        Commands::Note {
            brand,
            product,
            rating,
            no_rating,
            tags,
            untag,
            notes,
            clear,
        } => {
            let edit = NoteEdit {
                rating,
                clear_rating: no_rating,
                tags,
                untag,
                notes,
                clear,
            };
            commands::run_note(&cfg()?, &brand, &product, edit).await?
        }
        Commands::Serve => server::run_server(&cfg()?).await?,
    }

    Ok(())
}
