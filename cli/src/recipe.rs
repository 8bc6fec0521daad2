#![deny(missing_docs)]

//! # Recipe Command
//!
//! Prints the built-in recipe, a starting point for custom recipe files.

use anchorpatch_core::Recipe;

use crate::error::CliResult;

/// Output format for the recipe dump.
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipeFormat {
    /// YAML (default).
    Yaml,
    /// Pretty-printed JSON.
    Json,
}

/// Arguments for the recipe command.
#[derive(clap::Args, Debug, Clone)]
pub struct RecipeArgs {
    /// Output format.
    #[clap(long, value_enum, default_value = "yaml")]
    pub format: RecipeFormat,
}

/// Renders the built-in recipe.
pub fn render(args: &RecipeArgs) -> CliResult<String> {
    let recipe = Recipe::model_info_filter();
    let out = match args.format {
        RecipeFormat::Yaml => recipe.to_yaml()?,
        RecipeFormat::Json => recipe.to_json()?,
    };
    Ok(out)
}
