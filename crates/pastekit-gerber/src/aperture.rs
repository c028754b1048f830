//! Tool (aperture) definitions
//!
//! Only the standard templates are resolved. Circle and polygon map to a
//! circular tool, rectangle and obround to a rectangular one. Macro
//! apertures are left unresolved and flashes using them fall back to the
//! default tool.

use pastekit_core::{LengthUnit, PadShape};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use tracing::debug;

/// Size used when a flash references a tool that cannot be resolved (mm)
pub const DEFAULT_TOOL_SIZE: f64 = 1.0;

/// A resolved tool in millimetres
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    pub shape: PadShape,
    pub width: f64,
    pub height: f64,
    /// Secondary (hole) dimension, if the definition carried one
    pub hole: Option<f64>,
}

impl Tool {
    /// The 1×1 mm circle used for unresolved flashes
    pub const fn fallback() -> Self {
        Tool {
            shape: PadShape::Circle,
            width: DEFAULT_TOOL_SIZE,
            height: DEFAULT_TOOL_SIZE,
            hole: None,
        }
    }

    /// Characteristic diameter for fiducial screening
    pub fn diameter(&self) -> f64 {
        match self.shape {
            PadShape::Circle => self.width,
            PadShape::Rect => self.width.min(self.height),
        }
    }

    pub fn has_hole(&self) -> bool {
        self.hole.is_some_and(|h| h > 0.0)
    }
}

fn aperture_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^ADD(\d+)([A-Za-z_$][A-Za-z0-9_.$]*)(?:,(.*))?$").expect("invalid regex pattern")
    })
}

fn parse_modifiers(raw: Option<&str>) -> Option<Vec<f64>> {
    match raw {
        None => Some(Vec::new()),
        Some(s) => s
            .split('X')
            .map(|m| m.trim().parse::<f64>().ok())
            .collect(),
    }
}

/// Parse one `ADD` command (without `%` and `*`) into `(tool_id, tool)`.
///
/// Values are converted from `unit` to millimetres. Returns `None` for macro
/// references, unknown templates, and malformed or non-positive sizes.
pub fn parse_aperture(command: &str, unit: LengthUnit) -> Option<(u32, Tool)> {
    let caps = aperture_regex().captures(command.trim())?;
    let id = caps.get(1)?.as_str().parse::<u32>().ok()?;
    let template = caps.get(2)?.as_str();
    let mods = parse_modifiers(caps.get(3).map(|m| m.as_str()))?;
    let mm = |v: f64| unit.to_mm(v);

    let tool = match template {
        "C" => {
            let d = *mods.first()?;
            Tool {
                shape: PadShape::Circle,
                width: mm(d),
                height: mm(d),
                hole: mods.get(1).map(|&h| mm(h)),
            }
        }
        "R" | "O" => {
            let w = *mods.first()?;
            let h = *mods.get(1)?;
            Tool {
                shape: PadShape::Rect,
                width: mm(w),
                height: mm(h),
                hole: mods.get(2).map(|&h| mm(h)),
            }
        }
        "P" => {
            let d = *mods.first()?;
            Tool {
                shape: PadShape::Circle,
                width: mm(d),
                height: mm(d),
                hole: mods.get(3).map(|&h| mm(h)),
            }
        }
        other => {
            debug!("Aperture D{} uses macro or unknown template '{}'", id, other);
            return None;
        }
    };

    if !(tool.width > 0.0 && tool.height > 0.0) {
        debug!("Aperture D{} has non-positive size, ignoring", id);
        return None;
    }
    Some((id, tool))
}
