//! Pad data model
//!
//! A pad is the unit of work for the dispenser: something flashed on a
//! board layer that may need paste. Pads are produced by the extractor,
//! reconciled by the combiner, and consumed by the sequencer.

use crate::geometry::Point2D;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Pad outline shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PadShape {
    Circle,
    Rect,
}

impl fmt::Display for PadShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PadShape::Circle => write!(f, "circle"),
            PadShape::Rect => write!(f, "rect"),
        }
    }
}

/// Which extraction a pad came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PadSource {
    /// Copper or mask layer, geometrically authoritative
    Structural,
    /// Paste layer, says where material goes
    DispensingTarget,
    /// Structural geometry matched with a dispensing target
    Fused,
}

/// Outcome of reconciling structural and dispensing-target pads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombineStatus {
    /// Matched with a target pad
    Matched,
    /// Structural pad with no target, paste not needed
    NoPasteNeeded,
    /// Target pad with no structural geometry nearby
    GeometryMissing,
}

/// A pad in design-frame millimetres
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pad {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub shape: PadShape,
    pub source: PadSource,
    /// Index of the matching dispensing-target pad, set by the combiner
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dispense_order: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub combine_status: Option<CombineStatus>,
}

impl Pad {
    /// Create an untagged pad
    pub fn new(
        id: impl Into<String>,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        shape: PadShape,
        source: PadSource,
    ) -> Self {
        Self {
            id: id.into(),
            x,
            y,
            width,
            height,
            shape,
            source,
            dispense_order: None,
            combine_status: None,
        }
    }

    pub fn position(&self) -> Point2D {
        Point2D::new(self.x, self.y)
    }

    /// Whether paste should be dispensed on this pad
    pub fn needs_paste(&self) -> bool {
        !matches!(self.combine_status, Some(CombineStatus::NoPasteNeeded))
    }
}
