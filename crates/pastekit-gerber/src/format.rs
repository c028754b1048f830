//! Fixed-point coordinate format
//!
//! Gerber coordinates are integers with an implied decimal point. The
//! `%FS` block states how many integer and decimal digits a token carries
//! and which zeros the writer dropped. When a file has no `%FS` block the
//! extractor asks an injected [`FormatDetector`] instead of guessing inline.

use pastekit_core::LengthUnit;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Which zeros the writer omitted from coordinate tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZeroSuppression {
    /// Leading zeros omitted, tokens are right-aligned
    Leading,
    /// Trailing zeros omitted, tokens are left-aligned
    Trailing,
}

/// Coordinate format `(integer_digits, decimal_digits, zero_suppression)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinateFormat {
    pub integer_digits: u8,
    pub decimal_digits: u8,
    pub zero_suppression: ZeroSuppression,
}

impl Default for CoordinateFormat {
    fn default() -> Self {
        Self::new(2, 4, ZeroSuppression::Leading)
    }
}

impl CoordinateFormat {
    pub const fn new(integer_digits: u8, decimal_digits: u8, zero_suppression: ZeroSuppression) -> Self {
        Self {
            integer_digits,
            decimal_digits,
            zero_suppression,
        }
    }

    /// Decode a coordinate token into a value in file units.
    ///
    /// A token containing a decimal point is parsed verbatim. Otherwise the
    /// suppressed zeros are restored before the decimal point is inserted.
    /// Returns `None` for tokens that are not numbers.
    pub fn decode(&self, token: &str) -> Option<f64> {
        let token = token.trim();
        let (negative, digits) = match token.as_bytes().first()? {
            b'-' => (true, &token[1..]),
            b'+' => (false, &token[1..]),
            _ => (false, token),
        };
        if digits.is_empty() {
            return None;
        }

        let magnitude = if digits.contains('.') {
            if !digits.chars().all(|c| c.is_ascii_digit() || c == '.') {
                return None;
            }
            digits.parse::<f64>().ok()?
        } else {
            if !digits.chars().all(|c| c.is_ascii_digit()) {
                return None;
            }
            let int = self.integer_digits as usize;
            let dec = self.decimal_digits as usize;
            let total = int + dec;
            let (padded, split) = match self.zero_suppression {
                ZeroSuppression::Leading => {
                    let padded = format!("{:0>total$}", digits);
                    let split = padded.len() - dec;
                    (padded, split)
                }
                ZeroSuppression::Trailing => {
                    let padded = format!("{:0<total$}", digits);
                    (padded, int)
                }
            };
            format!("{}.{}", &padded[..split], &padded[split..])
                .parse::<f64>()
                .ok()?
        };

        Some(if negative { -magnitude } else { magnitude })
    }
}

/// Chooses a coordinate format for files that never declare one.
///
/// Receives the data section (parameter blocks removed) and the declared
/// unit. Must be pure.
pub type FormatDetector = fn(&str, LengthUnit) -> CoordinateFormat;

fn bare_coordinate_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[XY][+-]?(\d+)").expect("invalid regex pattern"))
}

/// Default detector: 2.4 for inch files; for metric files 4.6 when any bare
/// token is longer than six digits, else 3.3. Always leading suppression.
pub fn default_format_detector(body: &str, unit: LengthUnit) -> CoordinateFormat {
    if unit == LengthUnit::Inches {
        return CoordinateFormat::new(2, 4, ZeroSuppression::Leading);
    }
    let longest = bare_coordinate_regex()
        .captures_iter(body)
        .filter_map(|c| c.get(1).map(|m| m.as_str().len()))
        .max()
        .unwrap_or(0);
    if longest > 6 {
        CoordinateFormat::new(4, 6, ZeroSuppression::Leading)
    } else {
        CoordinateFormat::new(3, 3, ZeroSuppression::Leading)
    }
}
