#![deny(missing_docs)]

//! # SDKGen CLI
//!
//! Command Line Interface for the OpenAPI SDK model generator.
//!
//! Supported Commands:
//! - `generate`: Pools OpenAPI documents and emits SDK model sources.
//! - `diff`: Structurally compares schemas between two documents.

use clap::{Parser, Subcommand};
use sdkgen_core::AppResult;

mod diff;
mod generate;

#[derive(Parser, Debug)]
#[clap(author, version, about = "OpenAPI SDK model generator")]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generates SDK model sources from one or more OpenAPI documents.
    Generate(generate::GenerateArgs),
    /// Reports structural schema drift between two OpenAPI documents.
    Diff(diff::DiffArgs),
}

fn main() -> AppResult<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Generate(args) => generate::execute(args)?,
        Commands::Diff(args) => diff::execute(args)?,
    }

    Ok(())
}
