#![deny(missing_docs)]

//! # Source Patching
//!
//! Idempotent, anchor-driven edits over an in-memory text buffer.
//!
//! - **anchor**: Locating the insertion point (narrow pattern, then fallback).
//! - **insertion**: Splicing the new definition in front of the anchor.
//! - **span**: Bounding one function's body.
//! - **call_site**: Rewriting a return inside that body to call the new definition.
//! - **report**: Stage outcomes and aggregate status.
//! - **workflows**: The full pipeline, in memory and file-backed.

pub(crate) mod common;

/// Anchor tiers and the locator.
pub mod anchor;

/// Body-scoped call injection.
pub mod call_site;

/// Definition insertion.
pub mod insertion;

/// Stage outcomes and run status.
pub mod report;

/// Function span resolution.
pub mod span;

/// High-level patching workflows.
pub mod workflows;

pub use anchor::{Anchor, AnchorHit, AnchorTier};
pub use call_site::{apply_call_edit, CallEdit};
pub use common::already_applied;
pub use insertion::{insert_block, insert_definition};
pub use report::{PatchReport, PatchStatus, StageOutcome};
pub use span::{resolve_span, FunctionSpan};
pub use workflows::{apply_recipe, run, PatchOptions};
