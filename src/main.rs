//! # repo-fleet CLI
//!
//! Binary entry point. Parses arguments, runs the chosen command and turns
//! errors into a non-zero exit status. All real work lives in the
//! `repo_fleet` library crate.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli.execute()
}
