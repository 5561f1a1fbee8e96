//! Radio Roulette - endless AI-generated radio stations.
//!
//! A station is a set of genres plus the styles a seeded roulette drew
//! for them. Tuning in keeps a small buffer of freshly composed tracks
//! ahead of the listener, one composition at a time.

pub mod cli;
pub mod composer;
pub mod config;
pub mod db;
pub mod error;
pub mod model;
pub mod player;
pub mod roulette;
pub mod storage;
#[cfg(test)]
pub mod test_utils;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(EnvFilter::from_default_env().add_directive("radio_roulette=info".parse()?))
        .init();

    cli::run_command(&args)
}
