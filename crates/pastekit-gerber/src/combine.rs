//! Pad reconciliation
//!
//! Copper/mask layers give accurate pad geometry, the paste layer says which
//! pads want material. The combiner fuses the two by nearest match. The
//! structural position always wins; a target pad only contributes its
//! dispense-order index.

use crate::error::GerberResult;
use pastekit_core::{ensure_positive, CombineStatus, Pad, PadSource};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Default match distance between structural and target pads (mm)
pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.5;

/// Result of a combine pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombineResult {
    pub pads: Vec<Pad>,
    pub matched_count: usize,
    pub total_structural: usize,
    pub total_target: usize,
}

/// Nearest-match pad fusion
#[derive(Debug, Clone, Copy)]
pub struct PadCombiner {
    threshold: f64,
}

impl Default for PadCombiner {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_MATCH_THRESHOLD,
        }
    }
}

impl PadCombiner {
    pub fn new(threshold: f64) -> GerberResult<Self> {
        let threshold = ensure_positive("match_threshold", threshold)?;
        Ok(Self { threshold })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Fuse `structural` and `target` pads.
    ///
    /// Output order: structural pads in input order (fused or tagged
    /// `NoPasteNeeded`), then unclaimed target pads in input order tagged
    /// `GeometryMissing`. If either list is empty the other is returned
    /// unchanged.
    pub fn combine(&self, structural: &[Pad], target: &[Pad]) -> CombineResult {
        let total_structural = structural.len();
        let total_target = target.len();

        if structural.is_empty() || target.is_empty() {
            debug!("One pad list is empty, passing the other through");
            let pads = if structural.is_empty() {
                target.to_vec()
            } else {
                structural.to_vec()
            };
            return CombineResult {
                pads,
                matched_count: 0,
                total_structural,
                total_target,
            };
        }

        let mut claimed = vec![false; target.len()];
        let mut pads = Vec::with_capacity(structural.len() + target.len());
        let mut matched_count = 0;

        for pad in structural {
            let position = pad.position();
            let nearest = target
                .iter()
                .enumerate()
                .filter(|(i, _)| !claimed[*i])
                .map(|(i, t)| (i, t.position().distance_to(&position)))
                .filter(|(_, d)| *d <= self.threshold)
                .fold(None, |best: Option<(usize, f64)>, (i, d)| match best {
                    Some((_, bd)) if bd <= d => best,
                    _ => Some((i, d)),
                });

            let mut out = pad.clone();
            match nearest {
                Some((index, _)) => {
                    claimed[index] = true;
                    matched_count += 1;
                    out.source = PadSource::Fused;
                    out.dispense_order = Some(index);
                    out.combine_status = Some(CombineStatus::Matched);
                }
                None => {
                    out.combine_status = Some(CombineStatus::NoPasteNeeded);
                }
            }
            pads.push(out);
        }

        for (i, t) in target.iter().enumerate() {
            if !claimed[i] {
                let mut out = t.clone();
                out.combine_status = Some(CombineStatus::GeometryMissing);
                pads.push(out);
            }
        }

        info!(
            "Combined pads: {} matched of {} structural / {} target",
            matched_count, total_structural, total_target
        );

        CombineResult {
            pads,
            matched_count,
            total_structural,
            total_target,
        }
    }
}

/// Combine with the default threshold
pub fn combine(structural: &[Pad], target: &[Pad]) -> CombineResult {
    PadCombiner::default().combine(structural, target)
}
