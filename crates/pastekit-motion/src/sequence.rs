//! Dispensing order
//!
//! Every pad starts unvisited. Each step picks the next pad from the
//! current position and marks it visited; the run ends when nothing is
//! unvisited. Two selection rules are offered:
//!
//! - flat: plain nearest neighbour
//! - safe: nearest pad whose straight path stays below the clearance
//!   height, or the nearest pad overall with a forced lift-travel-lower path
//!
//! Runs are pure. Calling again recomputes the whole sequence.

use crate::error::{MotionError, MotionResult};
use crate::heights::{ComponentHeightMap, DEFAULT_OBSTACLE_RADIUS};
use pastekit_alignment::Transform;
use pastekit_core::{CancelToken, Pad, Point2D, Point3D};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Safe-path planning parameters (mm)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SafePathConfig {
    /// Paths whose sampled obstacle height reaches this are unsafe
    pub clearance_height: f64,
    /// Minimum travel height for forced paths
    pub safe_height: f64,
    /// Nozzle height when dispensing
    pub dispense_height: f64,
    /// Path sampling interval
    pub sample_step: f64,
    /// Proximity radius for height lookups
    pub obstacle_radius: f64,
    /// Extra height kept above the tallest obstacle on forced paths
    pub obstacle_margin: f64,
}

impl Default for SafePathConfig {
    fn default() -> Self {
        Self {
            clearance_height: 3.0,
            safe_height: 10.0,
            dispense_height: 0.1,
            sample_step: 0.5,
            obstacle_radius: DEFAULT_OBSTACLE_RADIUS,
            obstacle_margin: 1.0,
        }
    }
}

impl SafePathConfig {
    pub fn validate(&self) -> MotionResult<()> {
        let positive = [
            ("clearance_height", self.clearance_height),
            ("safe_height", self.safe_height),
            ("sample_step", self.sample_step),
            ("obstacle_radius", self.obstacle_radius),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(MotionError::InvalidLimits(format!(
                    "{} must be > 0, got {}",
                    name, value
                )));
            }
        }
        for (name, value) in [
            ("dispense_height", self.dispense_height),
            ("obstacle_margin", self.obstacle_margin),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(MotionError::InvalidLimits(format!(
                    "{} must be >= 0, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }

    /// Travel height for forced paths over `heights`
    pub fn travel_height(&self, heights: &ComponentHeightMap) -> f64 {
        self.safe_height
            .max(heights.max_height() + self.obstacle_margin)
    }
}

/// Phase of a forced path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    Lift,
    Travel,
    Lower,
}

/// A straight 3D segment
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathSegment {
    pub kind: SegmentKind,
    pub from: Point3D,
    pub to: Point3D,
}

impl PathSegment {
    pub fn length(&self) -> f64 {
        self.from.distance_to(&self.to)
    }
}

/// Forced high-clearance path: lift, travel, lower
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafePath {
    pub safe_height: f64,
    pub segments: Vec<PathSegment>,
}

impl SafePath {
    pub fn forced(from: &Point2D, to: &Point2D, start_z: f64, safe_height: f64, end_z: f64) -> Self {
        let lifted = from.with_z(safe_height);
        let above = to.with_z(safe_height);
        Self {
            safe_height,
            segments: vec![
                PathSegment {
                    kind: SegmentKind::Lift,
                    from: from.with_z(start_z),
                    to: lifted,
                },
                PathSegment {
                    kind: SegmentKind::Travel,
                    from: lifted,
                    to: above,
                },
                PathSegment {
                    kind: SegmentKind::Lower,
                    from: above,
                    to: to.with_z(end_z),
                },
            ],
        }
    }

    pub fn length(&self) -> f64 {
        self.segments.iter().map(PathSegment::length).sum()
    }

    fn map_xy(&self, transform: &Transform) -> Self {
        let map = |p: &Point3D| transform.apply(&p.xy()).with_z(p.z);
        Self {
            safe_height: self.safe_height,
            segments: self
                .segments
                .iter()
                .map(|s| PathSegment {
                    kind: s.kind,
                    from: map(&s.from),
                    to: map(&s.to),
                })
                .collect(),
        }
    }
}

/// One visited pad
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispensingSequenceEntry {
    pub pad: Pad,
    /// 1-based visit order
    pub sequence_order: usize,
    /// XY length for direct moves, 3D length for forced paths
    pub path_distance: f64,
    pub requires_high_clearance: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub safe_path: Option<SafePath>,
}

/// Totals over a sequence
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SequenceSummary {
    pub pad_count: usize,
    pub total_distance: f64,
    pub high_clearance_count: usize,
}

impl SequenceSummary {
    pub fn from_entries(entries: &[DispensingSequenceEntry]) -> Self {
        entries.iter().fold(Self::default(), |acc, e| Self {
            pad_count: acc.pad_count + 1,
            total_distance: acc.total_distance + e.path_distance,
            high_clearance_count: acc.high_clearance_count + usize::from(e.requires_high_clearance),
        })
    }
}

/// Index of the nearest pad among `candidates`, first encountered on ties
fn nearest<'a>(from: &Point2D, pads: &[Pad], candidates: impl Iterator<Item = &'a usize>) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for &i in candidates {
        let d = pads[i].position().distance_squared_to(from);
        if best.is_none_or(|(_, bd)| d < bd) {
            best = Some((i, d));
        }
    }
    best.map(|(i, _)| i)
}

/// Flat nearest-neighbour order from `reference`.
pub fn sequence_flat(reference: &Point2D, pads: &[Pad]) -> Vec<DispensingSequenceEntry> {
    run_flat(reference, pads, None).unwrap_or_default()
}

/// Like [`sequence_flat`], checking `cancel` before each pad selection.
pub fn sequence_flat_with_cancel(
    reference: &Point2D,
    pads: &[Pad],
    cancel: &CancelToken,
) -> MotionResult<Vec<DispensingSequenceEntry>> {
    run_flat(reference, pads, Some(cancel))
}

fn run_flat(
    reference: &Point2D,
    pads: &[Pad],
    cancel: Option<&CancelToken>,
) -> MotionResult<Vec<DispensingSequenceEntry>> {
    let mut unvisited: Vec<usize> = (0..pads.len()).collect();
    let mut current = *reference;
    let mut entries = Vec::with_capacity(pads.len());

    while !unvisited.is_empty() {
        if let Some(token) = cancel {
            token.check()?;
        }
        let Some(next) = nearest(&current, pads, unvisited.iter()) else {
            break;
        };
        unvisited.retain(|&i| i != next);

        let pad = &pads[next];
        entries.push(DispensingSequenceEntry {
            pad: pad.clone(),
            sequence_order: entries.len() + 1,
            path_distance: current.distance_to(&pad.position()),
            requires_high_clearance: false,
            safe_path: None,
        });
        current = pad.position();
    }

    info!(
        "Flat sequence over {} pads, {:.2} mm total",
        entries.len(),
        SequenceSummary::from_entries(&entries).total_distance
    );
    Ok(entries)
}

/// Collision-aware order from `reference`.
///
/// Never fails on geometry: when no safe path exists the globally nearest
/// pad is reached through a forced high-clearance path. Only invalid
/// configuration is an error.
pub fn sequence_safe(
    reference: &Point2D,
    pads: &[Pad],
    heights: &ComponentHeightMap,
    config: &SafePathConfig,
) -> MotionResult<Vec<DispensingSequenceEntry>> {
    run_safe(reference, pads, heights, config, None)
}

/// Like [`sequence_safe`], checking `cancel` before each pad selection.
pub fn sequence_safe_with_cancel(
    reference: &Point2D,
    pads: &[Pad],
    heights: &ComponentHeightMap,
    config: &SafePathConfig,
    cancel: &CancelToken,
) -> MotionResult<Vec<DispensingSequenceEntry>> {
    run_safe(reference, pads, heights, config, Some(cancel))
}

fn run_safe(
    reference: &Point2D,
    pads: &[Pad],
    heights: &ComponentHeightMap,
    config: &SafePathConfig,
    cancel: Option<&CancelToken>,
) -> MotionResult<Vec<DispensingSequenceEntry>> {
    config.validate()?;
    let travel_height = config.travel_height(heights);

    let mut unvisited: Vec<usize> = (0..pads.len()).collect();
    let mut current = *reference;
    let mut entries = Vec::with_capacity(pads.len());

    while !unvisited.is_empty() {
        if let Some(token) = cancel {
            token.check()?;
        }

        let safe: Vec<usize> = unvisited
            .iter()
            .copied()
            .filter(|&i| {
                heights.max_along(&current, &pads[i].position(), config.sample_step)
                    < config.clearance_height
            })
            .collect();

        let (next, forced) = match nearest(&current, pads, safe.iter()) {
            Some(i) => (i, false),
            None => match nearest(&current, pads, unvisited.iter()) {
                Some(i) => (i, true),
                None => break,
            },
        };
        unvisited.retain(|&i| i != next);

        let pad = &pads[next];
        let target = pad.position();
        let (path_distance, safe_path) = if forced {
            warn!(
                "No safe path to pad {}, forcing travel at {:.2} mm",
                pad.id, travel_height
            );
            let path = SafePath::forced(
                &current,
                &target,
                config.dispense_height,
                travel_height,
                config.dispense_height,
            );
            (path.length(), Some(path))
        } else {
            debug!("Direct path to pad {}", pad.id);
            (current.distance_to(&target), None)
        };

        entries.push(DispensingSequenceEntry {
            pad: pad.clone(),
            sequence_order: entries.len() + 1,
            path_distance,
            requires_high_clearance: forced,
            safe_path,
        });
        current = target;
    }

    let summary = SequenceSummary::from_entries(&entries);
    info!(
        "Safe sequence over {} pads, {} high-clearance moves, {:.2} mm total",
        summary.pad_count, summary.high_clearance_count, summary.total_distance
    );
    Ok(entries)
}

/// Map a design-frame sequence into the machine frame.
///
/// Pad positions and forced paths are transformed and distances are
/// recomputed from the mapped geometry. Pad sizes are left in design units.
pub fn transform_sequence(
    reference: &Point2D,
    sequence: &[DispensingSequenceEntry],
    transform: &Transform,
) -> Vec<DispensingSequenceEntry> {
    let mut previous = transform.apply(reference);
    sequence
        .iter()
        .map(|entry| {
            let mapped = transform.apply(&entry.pad.position());
            let mut pad = entry.pad.clone();
            pad.x = mapped.x;
            pad.y = mapped.y;

            let safe_path = entry.safe_path.as_ref().map(|p| p.map_xy(transform));
            let path_distance = match &safe_path {
                Some(path) => path.length(),
                None => previous.distance_to(&mapped),
            };
            previous = mapped;

            DispensingSequenceEntry {
                pad,
                sequence_order: entry.sequence_order,
                path_distance,
                requires_high_clearance: entry.requires_high_clearance,
                safe_path,
            }
        })
        .collect()
}
