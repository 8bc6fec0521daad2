#![deny(missing_docs)]

//! # Patch Outcomes
//!
//! Per-stage outcomes and the aggregate status of one run.

use std::fmt::{self, Display};
use std::path::PathBuf;

/// Result of one sub-edit (definition insertion or call injection).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    /// The edit changed the buffer.
    Applied,
    /// The marker was already there; nothing to do.
    AlreadyPresent,
    /// The expected return statement is not inside the target function.
    ReturnPatternNotFound {
        /// The body still holds a return of the result in some other shape,
        /// which we refuse to rewrite.
        loose_match: bool,
    },
    /// The stage could not run (e.g. the target function is missing).
    Failed(String),
    /// The stage never ran.
    NotAttempted,
}

impl StageOutcome {
    /// Whether the stage modified the buffer.
    pub fn is_applied(&self) -> bool {
        matches!(self, StageOutcome::Applied)
    }
}

impl Display for StageOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageOutcome::Applied => write!(f, "applied"),
            StageOutcome::AlreadyPresent => write!(f, "already present, skipped"),
            StageOutcome::ReturnPatternNotFound { loose_match: false } => {
                write!(f, "return pattern not found, skipped")
            }
            StageOutcome::ReturnPatternNotFound { loose_match: true } => write!(
                f,
                "return pattern not found; a similar return exists but cannot be modified safely"
            ),
            StageOutcome::Failed(msg) => write!(f, "failed: {}", msg),
            StageOutcome::NotAttempted => write!(f, "not attempted"),
        }
    }
}

/// Aggregate status of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchStatus {
    /// At least one edit was newly made and nothing failed.
    Applied,
    /// Both markers were found; the buffer is unchanged.
    AlreadyApplied,
    /// The call edit was skipped because its return pattern was missing.
    Partial,
    /// A stage failed.
    Failed {
        /// Error kind, see [`crate::AppError::kind`].
        kind: String,
        /// Human-readable detail.
        message: String,
    },
    /// The enable flag was off; nothing was read or written.
    Disabled,
}

impl PatchStatus {
    /// Maps the status onto success/failure for an exit code.
    ///
    /// `Partial` counts as success unless `strict` is set.
    pub fn is_success(&self, strict: bool) -> bool {
        match self {
            PatchStatus::Applied | PatchStatus::AlreadyApplied => true,
            PatchStatus::Partial => !strict,
            PatchStatus::Failed { .. } | PatchStatus::Disabled => false,
        }
    }
}

impl Display for PatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatchStatus::Applied => write!(f, "applied"),
            PatchStatus::AlreadyApplied => write!(f, "already-applied"),
            PatchStatus::Partial => write!(f, "partial"),
            PatchStatus::Failed { kind, message } => write!(f, "failed ({}): {}", kind, message),
            PatchStatus::Disabled => write!(f, "disabled"),
        }
    }
}

/// Everything a caller needs to report on one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchReport {
    /// The artifact path, when the run was file-backed.
    pub path: Option<PathBuf>,
    /// Definition insertion outcome.
    pub definition: StageOutcome,
    /// Which anchor tier placed the definition, when it was inserted.
    pub anchor_tier: Option<&'static str>,
    /// Call injection outcome.
    pub call: StageOutcome,
    /// Whether the buffer differs from the input.
    pub changed: bool,
    /// Whether the buffer was persisted.
    pub written: bool,
    /// Aggregate status.
    pub status: PatchStatus,
}

impl PatchReport {
    /// Report for a run skipped by the enable flag.
    pub fn disabled(path: Option<PathBuf>) -> Self {
        Self {
            path,
            definition: StageOutcome::NotAttempted,
            anchor_tier: None,
            call: StageOutcome::NotAttempted,
            changed: false,
            written: false,
            status: PatchStatus::Disabled,
        }
    }

    /// Derives the aggregate status from the two stage outcomes.
    pub(crate) fn aggregate(definition: &StageOutcome, call: &StageOutcome, changed: bool) -> PatchStatus {
        match call {
            StageOutcome::Failed(message) => PatchStatus::Failed {
                kind: "TargetFunctionNotFound".to_string(),
                message: message.clone(),
            },
            StageOutcome::ReturnPatternNotFound { .. } => PatchStatus::Partial,
            _ if changed || definition.is_applied() => PatchStatus::Applied,
            _ => PatchStatus::AlreadyApplied,
        }
    }
}
