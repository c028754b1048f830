//! Parameter block handling
//!
//! Everything between `%` delimiters is a parameter block. They are read for
//! units, coordinate format and tool definitions, then removed from the text
//! so the statement scanner only sees data statements.

use crate::aperture::{parse_aperture, Tool};
use crate::format::{CoordinateFormat, ZeroSuppression};
use pastekit_core::LengthUnit;
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::debug;

/// Settings collected from a layer's parameter blocks
#[derive(Debug, Clone, Default)]
pub struct Header {
    /// Declared unit, `None` when the file has no `%MO` block
    pub unit: Option<LengthUnit>,
    /// Declared format, `None` when the file has no `%FS` block
    pub format: Option<CoordinateFormat>,
    /// Tool table in millimetres
    pub tools: HashMap<u32, Tool>,
}

fn block_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"%([^%]*)%").expect("invalid regex pattern"))
}

fn format_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^FS([LTD])?([AI])?X(\d)(\d)Y(\d)(\d)").expect("invalid regex pattern")
    })
}

/// Parse an `FS` command. The X digits define the format for both axes.
pub fn parse_format(command: &str) -> Option<CoordinateFormat> {
    let caps = format_regex().captures(command.trim())?;
    let zero_suppression = match caps.get(1).map(|m| m.as_str()) {
        Some("T") => ZeroSuppression::Trailing,
        _ => ZeroSuppression::Leading,
    };
    let integer_digits = caps.get(3)?.as_str().parse().ok()?;
    let decimal_digits = caps.get(4)?.as_str().parse().ok()?;
    Some(CoordinateFormat::new(integer_digits, decimal_digits, zero_suppression))
}

/// Split `text` into its header and the data section with all parameter
/// blocks removed.
pub fn split_header(text: &str) -> (Header, String) {
    let mut header = Header::default();
    let mut raw_apertures: Vec<String> = Vec::new();

    for caps in block_regex().captures_iter(text) {
        let Some(block) = caps.get(1) else { continue };
        for command in block.as_str().split('*') {
            let command = command.trim();
            if command.is_empty() {
                continue;
            }
            if let Some(unit) = command.strip_prefix("MO") {
                match unit {
                    "MM" => header.unit = Some(LengthUnit::Millimeters),
                    "IN" => header.unit = Some(LengthUnit::Inches),
                    other => debug!("Ignoring unknown unit block MO{}", other),
                }
            } else if command.starts_with("FS") {
                match parse_format(command) {
                    Some(fmt) if header.format.is_none() => header.format = Some(fmt),
                    Some(_) => debug!("Ignoring repeated format block {}", command),
                    None => debug!("Malformed format block {}", command),
                }
            } else if command.starts_with("ADD") {
                raw_apertures.push(command.to_string());
            }
        }
    }

    // Tool sizes are in file units, which may be declared after the tools.
    let unit = header.unit.unwrap_or_default();
    for command in &raw_apertures {
        if let Some((id, tool)) = parse_aperture(command, unit) {
            header.tools.insert(id, tool);
        }
    }

    let body = block_regex().replace_all(text, "").into_owned();
    (header, body)
}
