//! Error types for CopyCraft.
//!
//! Library crates use [`CopyCraftError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

use crate::types::Stage;

/// Top-level error type for all CopyCraft operations.
#[derive(Debug, thiserror::Error)]
pub enum CopyCraftError {
    /// Configuration loading or validation error (including a missing API key).
    #[error("config error: {message}")]
    Config { message: String },

    /// A required input was empty or otherwise unusable. Raised before any
    /// external call is made.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// The external generation call failed (network, auth, quota, or an
    /// undecodable response).
    #[error("generation failed: {0}")]
    Generation(String),

    /// A generation call is already in flight for this wizard.
    #[error("wizard is busy with another request")]
    Busy,

    /// A trigger was fired at a stage that does not accept it.
    #[error("cannot {action} at {actual} stage (expected {expected})")]
    InvalidStage {
        action: &'static str,
        expected: Stage,
        actual: Stage,
    },

    /// `back()` was called at a stage with no previous stage to return to.
    #[error("cannot go back from {0} stage")]
    NoPreviousStage(Stage),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, CopyCraftError>;

impl CopyCraftError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create a generation error from any displayable message.
    pub fn generation(msg: impl Into<String>) -> Self {
        Self::Generation(msg.into())
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the user can retry the same stage after this error.
    ///
    /// Every failure kind leaves the wizard on its current stage, so only
    /// misconfiguration needs outside action first.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Config { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = CopyCraftError::config("missing API key");
        assert_eq!(err.to_string(), "config error: missing API key");

        let err = CopyCraftError::validation("topic must not be empty");
        assert!(err.to_string().contains("topic must not be empty"));

        let err = CopyCraftError::generation("HTTP 429");
        assert_eq!(err.to_string(), "generation failed: HTTP 429");
    }

    #[test]
    fn invalid_stage_names_both_stages() {
        let err = CopyCraftError::InvalidStage {
            action: "select an angle",
            expected: Stage::Research,
            actual: Stage::Topic,
        };
        let msg = err.to_string();
        assert!(msg.contains("select an angle"));
        assert!(msg.contains("research"));
        assert!(msg.contains("topic"));
    }

    #[test]
    fn no_previous_stage_display() {
        let err = CopyCraftError::NoPreviousStage(Stage::Result);
        assert_eq!(err.to_string(), "cannot go back from result stage");
    }

    #[test]
    fn retryable_kinds() {
        assert!(CopyCraftError::Busy.is_retryable());
        assert!(CopyCraftError::generation("boom").is_retryable());
        assert!(!CopyCraftError::config("no key").is_retryable());
    }
}
