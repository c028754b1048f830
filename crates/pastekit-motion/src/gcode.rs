//! G-code text for a planned sequence
//!
//! One move per line. XY travel is expanded into the waypoints of its
//! motion profile so that every line carries the planned instantaneous
//! feed (`F` = speed × 60). Output is plain text; sending it to a
//! controller happens elsewhere.

use crate::error::MotionResult;
use crate::limits::{AxisLimits, ProfileOptions};
use crate::profile::profile;
use crate::sequence::{DispensingSequenceEntry, SafePathConfig};
use pastekit_core::Point2D;
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use tracing::info;

/// Output formatting options
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GcodeOptions {
    /// Dwell after each dispense in milliseconds, 0 disables it
    pub dwell_ms: u64,
    /// Lowest feed written on a profiled line (mm/min)
    pub min_feed: f64,
    /// Prefix lines with `N` numbers
    pub line_numbers: bool,
}

impl Default for GcodeOptions {
    fn default() -> Self {
        Self {
            dwell_ms: 0,
            min_feed: 60.0,
            line_numbers: false,
        }
    }
}

/// Turns a sequence into G-code
#[derive(Debug, Clone, Default)]
pub struct GcodeEmitter {
    pub options: GcodeOptions,
    pub limits: AxisLimits,
    /// Clearance, safe and dispense heights
    pub safe_path: SafePathConfig,
    pub time_step: f64,
}

struct Lines {
    text: String,
    numbered: bool,
    count: usize,
}

impl Lines {
    fn push(&mut self, line: &str) -> MotionResult<()> {
        self.count += 1;
        if self.numbered {
            writeln!(self.text, "N{} {}", self.count, line)?;
        } else {
            writeln!(self.text, "{}", line)?;
        }
        Ok(())
    }
}

impl GcodeEmitter {
    pub fn new(
        options: GcodeOptions,
        limits: AxisLimits,
        safe_path: SafePathConfig,
        time_step: f64,
    ) -> Self {
        Self {
            options,
            limits,
            safe_path,
            time_step,
        }
    }

    fn profile_options(&self, z: f64) -> ProfileOptions {
        let defaults = ProfileOptions::default();
        ProfileOptions {
            time_step: if self.time_step > 0.0 {
                self.time_step
            } else {
                defaults.time_step
            },
            z,
        }
    }

    fn z_move(&self, lines: &mut Lines, z: f64, note: &str) -> MotionResult<()> {
        lines.push(&format!(
            "G1 Z{:.3} F{:.1} ; {}",
            z,
            self.limits.vz * 60.0,
            note
        ))
    }

    fn xy_move(&self, lines: &mut Lines, from: &Point2D, to: &Point2D, z: f64) -> MotionResult<()> {
        let planned = profile(from, to, &self.limits, &self.profile_options(z))?;
        for w in planned.waypoints.iter().skip(1) {
            lines.push(&format!(
                "G1 X{:.3} Y{:.3} F{:.1}",
                w.x,
                w.y,
                w.feed_rate().max(self.options.min_feed)
            ))?;
        }
        Ok(())
    }

    /// Emit the program for `sequence`, starting at `reference`.
    pub fn emit(
        &self,
        reference: &Point2D,
        sequence: &[DispensingSequenceEntry],
    ) -> MotionResult<String> {
        let mut lines = Lines {
            text: String::new(),
            numbered: self.options.line_numbers,
            count: 0,
        };
        let h = &self.safe_path;

        writeln!(lines.text, "; PasteKit dispensing program")?;
        writeln!(lines.text, "; {} pads", sequence.len())?;
        lines.push("G21 ; Set units to millimeters")?;
        lines.push("G90 ; Absolute positioning")?;
        self.z_move(&mut lines, h.safe_height, "Move to safe height")?;

        let mut current = *reference;
        let mut z = h.safe_height;
        for entry in sequence {
            let target = entry.pad.position();
            writeln!(
                lines.text,
                "; Pad {} ({}/{})",
                entry.pad.id,
                entry.sequence_order,
                sequence.len()
            )?;

            let travel_z = match &entry.safe_path {
                Some(path) => path.safe_height,
                None => h.clearance_height,
            };
            if (z - travel_z).abs() > f64::EPSILON {
                self.z_move(&mut lines, travel_z, "Travel height")?;
            }
            self.xy_move(&mut lines, &current, &target, travel_z)?;
            self.z_move(&mut lines, h.dispense_height, "Lower to dispense height")?;
            if self.options.dwell_ms > 0 {
                lines.push(&format!("G4 P{}", self.options.dwell_ms))?;
            }

            current = target;
            z = h.dispense_height;
        }

        self.z_move(&mut lines, h.safe_height, "Retract to safe height")?;
        lines.push("M30 ; End program")?;

        info!(
            "Generated {} G-code lines for {} pads",
            lines.count,
            sequence.len()
        );
        Ok(lines.text)
    }
}
