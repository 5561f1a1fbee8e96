//! CLI command definitions and dispatch.
//!
//! This module provides the command-line interface for Radio Roulette.
//! Each subcommand is implemented in its own submodule:
//! - `station`: roulette spins and station management
//! - `radio`: track generation and headless playback

mod radio;
mod station;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio::runtime::Runtime;

use crate::config::{self, Config};
use crate::db::{self, SqliteRepository};

pub use radio::{cmd_compose, cmd_tune};
pub use station::{cmd_delete, cmd_genres, cmd_respin, cmd_show, cmd_spin, cmd_stations};

/// Radio Roulette CLI
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file (defaults to the OS config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Database path (overrides the config file)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// List the genres the roulette knows
    Genres,
    /// Spin the style roulette for a set of genres
    Spin {
        /// Genre to include (repeat for several, order matters)
        #[arg(short, long = "genre", required = true)]
        genres: Vec<String>,
        /// Styles drawn per genre (defaults to the config value)
        #[arg(short = 'n', long, value_parser = parse_positive)]
        styles_per_genre: Option<usize>,
        /// Seed for a reproducible spin (text or number)
        #[arg(short, long)]
        seed: Option<String>,
        /// Save the result as a new station
        #[arg(long)]
        save: bool,
        /// Display name for a saved station
        #[arg(long, requires = "save")]
        name: Option<String>,
    },
    /// Re-spin a station's styles with a fresh seed
    Respin {
        /// Station ID
        station: String,
    },
    /// List saved stations
    Stations {
        #[arg(long, default_value_t = db::DEFAULT_PAGE_SIZE)]
        limit: i64,
        #[arg(long, default_value_t = 0)]
        offset: i64,
    },
    /// Show a station and its tracks
    Show {
        /// Station ID
        station: String,
    },
    /// Delete a station and its tracks
    Delete {
        /// Station ID
        station: String,
    },
    /// Generate one track for a station
    Compose {
        /// Station ID
        station: String,
        /// ElevenLabs API key (or set ELEVENLABS_API_KEY env var)
        #[arg(short, long, env = "ELEVENLABS_API_KEY")]
        api_key: Option<String>,
    },
    /// Play a station headlessly, generating tracks as it goes
    Tune {
        /// Station ID
        station: String,
        /// Stop after this many tracks
        #[arg(short, long, default_value_t = 5)]
        tracks: usize,
        /// Playback speed factor (0.01 plays a 2 minute track in 1.2s)
        #[arg(long, default_value_t = 1.0)]
        time_scale: f64,
        /// ElevenLabs API key (or set ELEVENLABS_API_KEY env var)
        #[arg(short, long, env = "ELEVENLABS_API_KEY")]
        api_key: Option<String>,
    },
}

fn parse_positive(raw: &str) -> Result<usize, String> {
    match raw.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

/// Settings shared by every command.
pub struct Context {
    pub config: Config,
    pub db_path: PathBuf,
}

impl Context {
    fn from_cli(cli: &Cli) -> Self {
        let config = match &cli.config {
            Some(path) => config::load_from(path),
            None => config::load(),
        };
        let db_path = cli.db.clone().unwrap_or_else(|| config.database.path.clone());
        Self { config, db_path }
    }

    /// Open (and migrate) the station database.
    pub async fn open_repo(&self) -> anyhow::Result<SqliteRepository> {
        let pool = db::init_db(&db::db_url(Some(&self.db_path))).await?;
        Ok(SqliteRepository::new(pool))
    }
}

/// Run the specified CLI command.
pub fn run_command(cli: &Cli) -> anyhow::Result<()> {
    let rt = Runtime::new()?;
    let ctx = Context::from_cli(cli);

    match &cli.command {
        Commands::Genres => cmd_genres(),
        Commands::Spin {
            genres,
            styles_per_genre,
            seed,
            save,
            name,
        } => cmd_spin(
            &rt,
            &ctx,
            genres,
            *styles_per_genre,
            seed.as_deref(),
            *save,
            name.as_deref(),
        ),
        Commands::Respin { station } => cmd_respin(&rt, &ctx, station),
        Commands::Stations { limit, offset } => cmd_stations(&rt, &ctx, *limit, *offset),
        Commands::Show { station } => cmd_show(&rt, &ctx, station),
        Commands::Delete { station } => cmd_delete(&rt, &ctx, station),
        Commands::Compose { station, api_key } => {
            cmd_compose(&rt, &ctx, station, api_key.as_deref())
        }
        Commands::Tune {
            station,
            tracks,
            time_scale,
            api_key,
        } => cmd_tune(&rt, &ctx, station, *tracks, *time_scale, api_key.as_deref()),
    }
}
