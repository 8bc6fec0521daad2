#![deny(missing_docs)]

//! # Apply & Check Commands
//!
//! Feeds the target path and the enable flag to the engine, prints one status
//! line per stage and a final aggregate line, and reports success for the exit
//! code.

use std::path::{Path, PathBuf};

use anchorpatch_core::{run, CompiledRecipe, PatchOptions, PatchReport, PatchStatus, Recipe};

use crate::error::CliResult;

/// Environment variable that gates `apply`.
pub const ENABLE_ENV: &str = "LITELLM_FILTER_GEMINI_DUPLICATES";

/// Arguments for the apply command.
#[derive(clap::Args, Debug, Clone)]
pub struct ApplyArgs {
    /// File to patch (e.g. `.../site-packages/litellm/proxy/proxy_server.py`).
    #[clap(long)]
    pub target: PathBuf,

    /// Recipe file (YAML or JSON). Defaults to the built-in model-info filter.
    #[clap(long)]
    pub recipe: Option<PathBuf>,

    /// Whether the patch runs at all. Unset, empty, `0`, `false`, `no` and `off` disable it.
    #[clap(
        long = "enable",
        env = ENABLE_ENV,
        default_value = "false",
        action = clap::ArgAction::Set,
        value_parser = parse_enable_flag
    )]
    pub enabled: bool,

    /// Report what would change without writing.
    #[clap(long)]
    pub dry_run: bool,

    /// Treat a skipped call edit (return pattern not found) as failure.
    #[clap(long)]
    pub strict: bool,
}

/// Arguments for the check command.
#[derive(clap::Args, Debug, Clone)]
pub struct CheckArgs {
    /// File to inspect.
    #[clap(long)]
    pub target: PathBuf,

    /// Recipe file (YAML or JSON). Defaults to the built-in model-info filter.
    #[clap(long)]
    pub recipe: Option<PathBuf>,
}

/// Parses the enable flag the way shell environments spell booleans.
pub fn parse_enable_flag(s: &str) -> Result<bool, String> {
    let v = s.trim().to_ascii_lowercase();
    Ok(!matches!(v.as_str(), "" | "0" | "false" | "no" | "off"))
}

/// Loads the recipe from `path`, or the built-in one.
pub fn load_recipe(path: Option<&Path>) -> CliResult<CompiledRecipe> {
    let recipe = match path {
        Some(p) => Recipe::from_path(p)?,
        None => Recipe::model_info_filter(),
    };
    Ok(recipe.compile()?)
}

/// Executes the apply command. Returns whether the run counts as success.
pub fn execute(args: &ApplyArgs) -> CliResult<bool> {
    let recipe = load_recipe(args.recipe.as_deref())?;

    if !args.enabled {
        println!("{} is not set, patch not applied", ENABLE_ENV);
    } else {
        println!("Applying '{}' to {:?}...", recipe.name, args.target);
    }

    let options = PatchOptions {
        enabled: args.enabled,
        dry_run: args.dry_run,
    };

    let report = match run(&args.target, &recipe, options) {
        Ok(report) => report,
        Err(e) => {
            println!("Status: failed ({}): {}", e.kind(), e);
            return Ok(false);
        }
    };

    print_report(&report, args.dry_run);
    Ok(report.status.is_success(args.strict))
}

/// Executes the check command: succeeds only when the target is fully patched.
pub fn check(args: &CheckArgs) -> CliResult<bool> {
    let recipe = load_recipe(args.recipe.as_deref())?;
    let options = PatchOptions {
        enabled: true,
        dry_run: true,
    };

    match run(&args.target, &recipe, options) {
        Ok(report) => {
            print_report(&report, true);
            Ok(report.status == PatchStatus::AlreadyApplied)
        }
        Err(e) => {
            println!("Status: failed ({}): {}", e.kind(), e);
            Ok(false)
        }
    }
}

fn print_report(report: &PatchReport, dry_run: bool) {
    for line in report_lines(report, dry_run) {
        println!("{}", line);
    }
}

/// Human-readable status lines for a report.
pub fn report_lines(report: &PatchReport, dry_run: bool) -> Vec<String> {
    if report.status == PatchStatus::Disabled {
        return vec![format!("Status: {}", report.status)];
    }

    let mut lines = Vec::with_capacity(4);

    let mut definition = format!("Definition: {}", report.definition);
    if let Some(tier) = report.anchor_tier {
        definition.push_str(&format!(" (anchor: {})", tier));
    }
    lines.push(definition);
    lines.push(format!("Call site: {}", report.call));

    if report.written {
        lines.push("Write: done".to_string());
    } else if report.changed && dry_run {
        lines.push("Write: skipped (dry run)".to_string());
    } else {
        lines.push("Write: skipped (no changes)".to_string());
    }

    lines.push(format!("Status: {}", report.status));
    lines
}
