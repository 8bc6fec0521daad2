#![deny(missing_docs)]

//! # Anchorpatch Core
//!
//! Idempotent source patch engine: insert a function before a structural anchor
//! and route one return statement of a named function through it, safely
//! re-runnable any number of times.

/// Shared error types.
pub mod error;

/// Loading and persisting the target file.
pub mod artifact;

/// Patch recipes (configuration).
pub mod recipe;

/// Code patching utilities.
pub mod patcher;

pub use artifact::Artifact;
pub use error::{AppError, AppResult};
pub use patcher::{
    already_applied, apply_recipe, resolve_span, run, FunctionSpan, PatchOptions, PatchReport,
    PatchStatus, StageOutcome,
};
pub use recipe::{CompiledRecipe, Recipe};
