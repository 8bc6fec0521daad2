#![deny(missing_docs)]

//! # CLI Errors
//!
//! Error types for the CLI crate.

use anchorpatch_core::AppError;
use derive_more::{Display, From};

/// Main error enum for CLI operations.
#[derive(Debug, Display, From)]
pub enum CliError {
    /// Engine error, carrying its kind for the status line.
    #[display("{} ({})", _0, _0.kind())]
    Core(AppError),

    /// Logging could not be initialized.
    #[from(ignore)]
    #[display("Logging setup failed: {}", _0)]
    Logging(String),
}

/// Manual implementation of the standard Error trait.
impl std::error::Error for CliError {}

/// Result type alias.
pub type CliResult<T> = Result<T, CliError>;
