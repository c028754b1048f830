//! Error types for the Gerber crate.
//!
//! Extraction itself degrades instead of failing, so these errors only
//! cover caller mistakes (bad thresholds) and cancellation.

use pastekit_core::CoreError;
use thiserror::Error;

/// Errors that can occur during geometry extraction and selection.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GerberError {
    /// Invalid parameters were provided.
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    /// A core error occurred (cancellation, invalid value).
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Result type alias for Gerber operations.
pub type GerberResult<T> = Result<T, GerberError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gerber_error_display() {
        let err = GerberError::InvalidParameters("threshold must be positive".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid parameters: threshold must be positive"
        );

        let err: GerberError = CoreError::Cancelled.into();
        assert_eq!(err.to_string(), "Operation cancelled");
    }
}
