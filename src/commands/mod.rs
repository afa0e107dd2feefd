//! Subcommand implementations
//!
//! Every command prints one JSON document on stdout.

pub mod beta;
pub mod crowding;
pub mod defcon;
pub mod kelly;
pub mod pairs;
pub mod regime;
pub mod skill;
pub mod vpin;

use anyhow::{Context, Result};
use quant_signals::Symbol;
use serde::Serialize;

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

/// Parse a comma-separated symbol list, skipping blanks
pub(crate) fn parse_symbols(raw: &str) -> Vec<Symbol> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(Symbol::new)
        .collect()
}
