//! Unit conversion utilities
//!
//! Board files may be authored in millimetres or inches. Everything that
//! leaves the extraction boundary is metric, so the only conversion the
//! rest of the workspace needs is inch-to-mm.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Millimetres per inch
pub const MM_PER_INCH: f64 = 25.4;

/// Length unit declared by a board file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthUnit {
    /// Millimetres
    Millimeters,
    /// Inches
    Inches,
}

impl Default for LengthUnit {
    fn default() -> Self {
        Self::Millimeters
    }
}

impl LengthUnit {
    /// Factor converting a value in this unit to millimetres
    pub fn to_mm_factor(self) -> f64 {
        match self {
            Self::Millimeters => 1.0,
            Self::Inches => MM_PER_INCH,
        }
    }

    /// Convert a value in this unit to millimetres
    pub fn to_mm(self, value: f64) -> f64 {
        value * self.to_mm_factor()
    }
}

impl fmt::Display for LengthUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Millimeters => write!(f, "Millimeters"),
            Self::Inches => write!(f, "Inches"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inch_conversion() {
        assert_eq!(LengthUnit::Inches.to_mm(1.0), 25.4);
        assert_eq!(LengthUnit::Millimeters.to_mm(12.5), 12.5);
        assert_eq!(LengthUnit::Inches.to_mm(-0.5), -12.7);
    }
}
