//! Error types for sequencing and motion profiling.

use pastekit_core::CoreError;
use thiserror::Error;

/// Errors that can occur while planning motion.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MotionError {
    /// Axis limits or profile options are non-positive or non-finite.
    #[error("Invalid limits: {0}")]
    InvalidLimits(String),

    /// The caller cancelled the run between pad selections.
    #[error("Sequencing cancelled")]
    Cancelled,

    /// A core error other than cancellation.
    #[error(transparent)]
    Core(CoreError),

    /// Writing G-code text failed.
    #[error("Format error: {0}")]
    Format(#[from] std::fmt::Error),
}

impl From<CoreError> for MotionError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Cancelled => MotionError::Cancelled,
            other => MotionError::Core(other),
        }
    }
}

/// Result type alias for motion operations.
pub type MotionResult<T> = Result<T, MotionError>;
