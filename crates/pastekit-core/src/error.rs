//! Error handling shared across PasteKit crates
//!
//! Domain crates define their own error enums and wrap [`CoreError`] for the
//! conditions every stage can hit: cancellation by the caller and invalid
//! numeric parameters.

use thiserror::Error;

/// Core error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// The caller requested cancellation between steps
    #[error("Operation cancelled")]
    Cancelled,

    /// A numeric parameter is out of its valid domain
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter {
        /// The parameter name.
        name: String,
        /// Why the value was rejected.
        reason: String,
    },
}

impl CoreError {
    /// Shorthand for [`CoreError::InvalidParameter`]
    pub fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        CoreError::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Check if this is a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, CoreError::Cancelled)
    }
}

/// Result type using CoreError
pub type CoreResult<T> = std::result::Result<T, CoreError>;

/// Require `value` to be finite and strictly positive
pub fn ensure_positive(name: &str, value: f64) -> CoreResult<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(CoreError::invalid(name, format!("must be > 0, got {}", value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(CoreError::Cancelled.to_string(), "Operation cancelled");
        assert_eq!(
            CoreError::invalid("vx", "must be > 0").to_string(),
            "Invalid parameter 'vx': must be > 0"
        );
    }

    #[test]
    fn test_ensure_positive() {
        assert_eq!(ensure_positive("a", 2.0).unwrap(), 2.0);
        assert!(ensure_positive("a", 0.0).is_err());
        assert!(ensure_positive("a", -1.0).is_err());
        assert!(ensure_positive("a", f64::NAN).is_err());
        assert!(ensure_positive("a", f64::INFINITY).is_err());
    }

    #[test]
    fn test_is_cancelled() {
        assert!(CoreError::Cancelled.is_cancelled());
        assert!(!CoreError::invalid("x", "bad").is_cancelled());
    }
}
