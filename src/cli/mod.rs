//! Command-line interface for radio-roulette.
//!
//! This module provides CLI commands for spinning styles, managing
//! stations, composing tracks, and tuning in headlessly.

mod commands;

pub use commands::{Cli, Commands, run_command};
