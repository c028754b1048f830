//! Origin and fiducial selection
//!
//! Reduces extracted geometry to a handful of labelled reference points the
//! operator can locate on the machine. Only one origin is ever reported.
//! Fiducials come from several layers and are merged, ranked and relabelled.

use crate::error::{GerberError, GerberResult};
use crate::extract::{BoardOutline, FiducialCandidate};
use pastekit_core::Point2D;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Confidence reported for an outline-derived origin
pub const ORIGIN_CONFIDENCE: f64 = 0.9;

/// Reference point role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceKind {
    Origin,
    Fiducial,
}

/// A labelled point in the design frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferencePoint {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub kind: ReferenceKind,
    pub confidence: f64,
}

impl ReferencePoint {
    pub fn position(&self) -> Point2D {
        Point2D::new(self.x, self.y)
    }
}

/// Board origin at the bottom-left outline corner.
///
/// The design frame is Y-down, so bottom-left is `(min_x, max_y)`.
pub fn select_origin(outline: Option<&BoardOutline>) -> Option<ReferencePoint> {
    let outline = outline?;
    Some(ReferencePoint {
        id: "origin".to_string(),
        x: outline.min_x,
        y: outline.max_y,
        kind: ReferenceKind::Origin,
        confidence: ORIGIN_CONFIDENCE,
    })
}

/// Candidates extracted from one named layer
#[derive(Debug, Clone, PartialEq)]
pub struct LayerCandidates {
    pub layer_name: String,
    pub candidates: Vec<FiducialCandidate>,
}

impl LayerCandidates {
    pub fn new(layer_name: impl Into<String>, candidates: Vec<FiducialCandidate>) -> Self {
        Self {
            layer_name: layer_name.into(),
            candidates,
        }
    }
}

/// Whether a layer name suggests fiducial, fabrication or assembly content
pub fn is_priority_layer(layer_name: &str) -> bool {
    let lower = layer_name.to_lowercase();
    ["fid", "fab", "assembly"].iter().any(|k| lower.contains(k))
}

/// Fiducial merge settings
#[derive(Debug, Clone, Copy)]
pub struct FiducialSelector {
    merge_distance: f64,
    max_count: usize,
}

impl Default for FiducialSelector {
    fn default() -> Self {
        Self {
            merge_distance: 0.5,
            max_count: 6,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Merged {
    candidate: FiducialCandidate,
    priority: bool,
}

impl Merged {
    fn beats(&self, other: &Merged) -> bool {
        match (self.priority, other.priority) {
            (true, false) => true,
            (false, true) => false,
            _ => self.candidate.confidence > other.candidate.confidence,
        }
    }
}

impl FiducialSelector {
    pub fn new(merge_distance: f64, max_count: usize) -> GerberResult<Self> {
        if !(merge_distance.is_finite() && merge_distance >= 0.0) {
            return Err(GerberError::InvalidParameters(format!(
                "merge distance must be >= 0, got {}",
                merge_distance
            )));
        }
        Ok(Self {
            merge_distance,
            max_count,
        })
    }

    /// Merge, rank and label fiducials from several layers.
    ///
    /// Detections closer than the merge distance are one fiducial; a
    /// priority layer beats a plain one, otherwise higher confidence wins.
    /// The result is sorted by confidence (stable), truncated, and labelled
    /// `F1..Fn`.
    pub fn select(&self, layers: &[LayerCandidates]) -> Vec<ReferencePoint> {
        let mut merged: Vec<Merged> = Vec::new();

        for layer in layers {
            let priority = is_priority_layer(&layer.layer_name);
            for candidate in &layer.candidates {
                let incoming = Merged {
                    candidate: *candidate,
                    priority,
                };
                let existing = merged.iter_mut().find(|m| {
                    m.candidate.position().distance_to(&candidate.position()) < self.merge_distance
                });
                match existing {
                    Some(slot) => {
                        if incoming.beats(slot) {
                            debug!(
                                "Fiducial at {} from '{}' replaces earlier detection",
                                candidate.position(),
                                layer.layer_name
                            );
                            *slot = incoming;
                        }
                    }
                    None => merged.push(incoming),
                }
            }
        }

        merged.sort_by(|a, b| b.candidate.confidence.total_cmp(&a.candidate.confidence));
        merged.truncate(self.max_count);

        let selected: Vec<ReferencePoint> = merged
            .into_iter()
            .enumerate()
            .map(|(i, m)| ReferencePoint {
                id: format!("F{}", i + 1),
                x: m.candidate.x,
                y: m.candidate.y,
                kind: ReferenceKind::Fiducial,
                confidence: m.candidate.confidence,
            })
            .collect();
        info!("Selected {} fiducials from {} layers", selected.len(), layers.len());
        selected
    }
}

/// Select fiducials with the default merge distance (0.5 mm) and cap (6)
pub fn select_fiducials(layers: &[LayerCandidates]) -> Vec<ReferencePoint> {
    FiducialSelector::default().select(layers)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(x: f64, y: f64, confidence: f64) -> FiducialCandidate {
        FiducialCandidate {
            x,
            y,
            diameter: 1.0,
            confidence,
        }
    }

    #[test]
    fn test_origin_is_bottom_left() {
        let outline = BoardOutline::from_points(vec![
            Point2D::new(5.0, 2.0),
            Point2D::new(55.0, 2.0),
            Point2D::new(55.0, 42.0),
            Point2D::new(5.0, 42.0),
        ])
        .unwrap();
        let origin = select_origin(Some(&outline)).unwrap();
        assert_eq!(origin.position(), Point2D::new(5.0, 42.0));
        assert_eq!(origin.confidence, ORIGIN_CONFIDENCE);
        assert_eq!(origin.kind, ReferenceKind::Origin);
        assert!(select_origin(None).is_none());
    }

    #[test]
    fn test_priority_layer_names() {
        assert!(is_priority_layer("F_Fab"));
        assert!(is_priority_layer("Fiducials"));
        assert!(is_priority_layer("top ASSEMBLY"));
        assert!(!is_priority_layer("F_Cu"));
    }

    #[test]
    fn test_merge_prefers_priority_layer() {
        let layers = vec![
            LayerCandidates::new("F_Cu", vec![candidate(10.0, 10.0, 0.9)]),
            LayerCandidates::new("F_Fab", vec![candidate(10.2, 10.0, 0.5)]),
        ];
        let fids = select_fiducials(&layers);
        assert_eq!(fids.len(), 1);
        assert_eq!(fids[0].x, 10.2);
        assert_eq!(fids[0].confidence, 0.5);
    }

    #[test]
    fn test_merge_same_priority_keeps_higher_confidence() {
        let layers = vec![
            LayerCandidates::new("F_Cu", vec![candidate(10.0, 10.0, 0.4)]),
            LayerCandidates::new("F_Mask", vec![candidate(10.1, 10.0, 0.8)]),
        ];
        let fids = select_fiducials(&layers);
        assert_eq!(fids.len(), 1);
        assert_eq!(fids[0].confidence, 0.8);
    }

    #[test]
    fn test_sorted_capped_and_labelled() {
        let candidates: Vec<FiducialCandidate> = (0..8)
            .map(|i| candidate(i as f64 * 10.0, 0.0, 0.1 * (i + 1) as f64))
            .collect();
        let fids = select_fiducials(&[LayerCandidates::new("F_Cu", candidates)]);
        assert_eq!(fids.len(), 6);
        assert_eq!(fids[0].id, "F1");
        assert_eq!(fids[0].x, 70.0);
        assert_eq!(fids[5].id, "F6");
        assert!(fids.windows(2).all(|w| w[0].confidence >= w[1].confidence));
    }

    #[test]
    fn test_empty_input() {
        assert!(select_fiducials(&[]).is_empty());
        assert!(FiducialSelector::new(-1.0, 6).is_err());
    }
}
