#![deny(missing_docs)]

//! # Anchorpatch CLI
//!
//! Command line front-end for the idempotent patch engine.
//!
//! Supported Commands:
//! - `apply`: Patches the target file (gated by the enable flag).
//! - `check`: Reports whether the target is already fully patched.
//! - `recipe`: Prints the built-in recipe.

use std::process::ExitCode;

use clap::{Parser, Subcommand};

use crate::error::CliResult;

mod apply;
mod error;
mod logging;
mod recipe;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Idempotent anchor-based source patcher")]
struct Cli {
    /// Debug-level engine logs on stderr.
    #[clap(long, short, global = true)]
    verbose: bool,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Apply the patch to a target file.
    Apply(apply::ApplyArgs),
    /// Dry run; succeeds only if the target is already patched.
    Check(apply::CheckArgs),
    /// Print the built-in recipe.
    Recipe(recipe::RecipeArgs),
}

fn dispatch(cli: &Cli) -> CliResult<bool> {
    match &cli.command {
        Commands::Apply(args) => apply::execute(args),
        Commands::Check(args) => apply::check(args),
        Commands::Recipe(args) => {
            print!("{}", recipe::render(args)?);
            Ok(true)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init_tracing(cli.verbose) {
        eprintln!("Warning: {}", e);
    }

    match dispatch(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
