//! # Jiri Profile CLI
//!
//! This is the binary entry point for the `jiri-profile` command-line tool.
//!
//! Its responsibilities are:
//! - Building the registry of reachable profile managers.
//! - Parsing command-line arguments using `clap`, including flags contributed
//!   by the managers.
//! - Executing the selected command and reporting top-level errors.
//!
//! The profile engine itself lives in the `jiri_profiles` library crate; the
//! binary is a thin wrapper around it.

mod cli;
mod commands;

use anyhow::Result;

fn main() -> Result<()> {
    let mut registry = cli::build_registry();
    let cli = cli::parse_with_registry(&mut registry, std::env::args_os())?;
    cli.execute(registry)
}
