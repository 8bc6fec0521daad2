//! # Error Handling
//!
//! Provides the unified `AppError` enum used across the workspace.
//!
//! Only hard stops live here. Soft results (a missing return statement, a patch
//! that is already present) are stage outcomes, see [`crate::patcher::report`].

use derive_more::{Display, From};
use std::path::PathBuf;

/// The Global Error Enum.
///
/// We use `derive_more` for boilerplate.
/// Note: String errors default to `General`.
#[derive(Debug, Display, From)]
pub enum AppError {
    /// Wrapper for standard IO errors.
    #[display("IO Error: {_0}")]
    Io(std::io::Error),

    /// Wrapper for invalid anchor or return patterns.
    #[display("Pattern Error: {_0}")]
    Pattern(regex::Error),

    /// The target path does not resolve to a readable file.
    #[from(ignore)]
    #[display("Artifact not found: {}", _0.display())]
    ArtifactNotFound(PathBuf),

    /// Every anchor tier was tried and none matched.
    #[from(ignore)]
    #[display("Anchor not found (tried: {})", tiers.join(", "))]
    AnchorNotFound {
        /// Names of the tiers that were attempted, in order.
        tiers: Vec<String>,
    },

    /// The definition keyword sequence of the target function is absent.
    #[from(ignore)]
    #[display("Target function not found: '{_0}'")]
    TargetFunctionNotFound(String),

    /// A recipe could not be parsed or failed validation.
    #[from(ignore)]
    #[display("Recipe Error: {_0}")]
    Recipe(String),

    /// Generic errors.
    #[display("General Error: {_0}")]
    General(String),
}

/// Manual implementation of the standard Error trait.
impl std::error::Error for AppError {}

impl AppError {
    /// Short, stable name of the error kind, used in status lines.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Io(_) => "Io",
            AppError::Pattern(_) => "Pattern",
            AppError::ArtifactNotFound(_) => "ArtifactNotFound",
            AppError::AnchorNotFound { .. } => "AnchorNotFound",
            AppError::TargetFunctionNotFound(_) => "TargetFunctionNotFound",
            AppError::Recipe(_) => "Recipe",
            AppError::General(_) => "General",
        }
    }
}

/// Helper type alias for Result using AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_io_conversion() {
        let io_err = Error::new(ErrorKind::Other, "test");
        let app_err: AppError = io_err.into();
        assert!(matches!(app_err, AppError::Io(_)));
    }

    #[test]
    fn test_string_conversion() {
        // String must land in General, never in Recipe or TargetFunctionNotFound
        let msg = String::from("something wrong");
        let app_err: AppError = msg.into();
        match app_err {
            AppError::General(s) => assert_eq!(s, "something wrong"),
            _ => panic!("String should convert to AppError::General"),
        }
    }

    #[test]
    fn test_anchor_not_found_display() {
        let err = AppError::AnchorNotFound {
            tiers: vec!["pattern".into(), "decorated_definition".into()],
        };
        assert_eq!(
            err.to_string(),
            "Anchor not found (tried: pattern, decorated_definition)"
        );
        assert_eq!(err.kind(), "AnchorNotFound");
    }

    #[test]
    fn test_artifact_not_found_display() {
        let err = AppError::ArtifactNotFound(PathBuf::from("/tmp/missing.py"));
        assert_eq!(err.to_string(), "Artifact not found: /tmp/missing.py");
    }
}
