//! Least-squares fitting from point correspondences
//!
//! Two models are offered. Similarity needs two pairs and cannot shear;
//! affine needs three non-collinear pairs and absorbs independent axis
//! scale and skew. [`fit_auto`] picks the richer model when the data
//! supports it.

use crate::error::{AlignmentError, AlignmentResult};
use crate::transform::{Correspondence, Transform};
use nalgebra::{DMatrix, DVector};
use pastekit_core::Point2D;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Relative pivot size below which the normal equations are singular
const PIVOT_RATIO_EPSILON: f64 = 1e-12;

/// Squared spread below which all design points count as coincident (mm²)
const SPREAD_EPSILON: f64 = 1e-18;

fn check_lengths(design: &[Point2D], machine: &[Point2D], required: usize) -> AlignmentResult<()> {
    if design.len() != machine.len() {
        return Err(AlignmentError::MismatchedLengths {
            design: design.len(),
            machine: machine.len(),
        });
    }
    if design.len() < required {
        return Err(AlignmentError::InsufficientPoints {
            required,
            provided: design.len(),
        });
    }
    Ok(())
}

/// Fit rotation, uniform scale and translation (at least 2 pairs).
pub fn fit_similarity(design: &[Point2D], machine: &[Point2D]) -> AlignmentResult<Transform> {
    check_lengths(design, machine, 2)?;

    let cp = Point2D::centroid(design).ok_or(AlignmentError::Degenerate)?;
    let cq = Point2D::centroid(machine).ok_or(AlignmentError::Degenerate)?;

    let (mut dot, mut cross, mut pp, mut qq) = (0.0, 0.0, 0.0, 0.0);
    for (p, q) in design.iter().zip(machine) {
        let p = *p - cp;
        let q = *q - cq;
        dot += p.x * q.x + p.y * q.y;
        cross += p.x * q.y - p.y * q.x;
        pp += p.x * p.x + p.y * p.y;
        qq += q.x * q.x + q.y * q.y;
    }
    if pp < SPREAD_EPSILON {
        return Err(AlignmentError::Degenerate);
    }

    let theta = cross.atan2(dot);
    let scale = (qq / pp).sqrt();
    let linear = Transform::similarity(scale, theta, 0.0, 0.0);
    let rotated = linear.apply(&cp);
    let transform = Transform::similarity(scale, theta, cq.x - rotated.x, cq.y - rotated.y);

    debug!(
        "Similarity fit over {} pairs: scale {:.6}, theta {:.6} rad",
        design.len(),
        scale,
        theta
    );
    Ok(transform)
}

/// Fit a general affine transform (at least 3 non-collinear pairs).
///
/// Solves the normal equations of the stacked `2n × 6` system with LU
/// decomposition (partial pivoting).
pub fn fit_affine(design: &[Point2D], machine: &[Point2D]) -> AlignmentResult<Transform> {
    check_lengths(design, machine, 3)?;

    let n = design.len();
    let mut m = DMatrix::<f64>::zeros(2 * n, 6);
    let mut rhs = DVector::<f64>::zeros(2 * n);
    for (i, (p, q)) in design.iter().zip(machine).enumerate() {
        let r = 2 * i;
        m[(r, 0)] = p.x;
        m[(r, 1)] = p.y;
        m[(r, 2)] = 1.0;
        m[(r + 1, 3)] = p.x;
        m[(r + 1, 4)] = p.y;
        m[(r + 1, 5)] = 1.0;
        rhs[r] = q.x;
        rhs[r + 1] = q.y;
    }

    let mt = m.transpose();
    let normal = &mt * &m;
    let projected = &mt * &rhs;

    let lu = normal.lu();
    let pivots = lu.u().diagonal().map(|v| v.abs());
    let (min_pivot, max_pivot) = (pivots.min(), pivots.max());
    if max_pivot == 0.0 || min_pivot / max_pivot < PIVOT_RATIO_EPSILON {
        debug!(
            "Affine normal equations singular (pivot ratio {:e})",
            if max_pivot == 0.0 { 0.0 } else { min_pivot / max_pivot }
        );
        return Err(AlignmentError::Singular);
    }
    let x = lu.solve(&projected).ok_or(AlignmentError::Singular)?;
    if x.iter().any(|v| !v.is_finite()) {
        return Err(AlignmentError::Singular);
    }

    debug!("Affine fit over {} pairs", n);
    Ok(Transform::affine(x[0], x[1], x[3], x[4], x[2], x[5]))
}

/// Per-pair distance between the mapped design point and the machine point
pub fn residuals(transform: &Transform, design: &[Point2D], machine: &[Point2D]) -> Vec<f64> {
    design
        .iter()
        .zip(machine)
        .map(|(p, q)| transform.apply(p).distance_to(q))
        .collect()
}

/// Root-mean-square residual. Pairs are zipped; an empty input gives 0.
pub fn rms_error(transform: &Transform, design: &[Point2D], machine: &[Point2D]) -> f64 {
    let r = residuals(transform, design, machine);
    if r.is_empty() {
        return 0.0;
    }
    (r.iter().map(|e| e * e).sum::<f64>() / r.len() as f64).sqrt()
}

/// A fitted transform with its residual statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitReport {
    pub transform: Transform,
    pub rms_error: f64,
    pub max_error: f64,
    pub residuals: Vec<f64>,
}

impl FitReport {
    pub fn new(transform: Transform, design: &[Point2D], machine: &[Point2D]) -> Self {
        let residuals = residuals(&transform, design, machine);
        let max_error = residuals.iter().copied().fold(0.0, f64::max);
        Self {
            transform,
            rms_error: rms_error(&transform, design, machine),
            max_error,
            residuals,
        }
    }
}

/// Fit affine when three or more pairs allow it, otherwise similarity.
///
/// Collinear sets of three or more fall back to similarity.
pub fn fit_auto(pairs: &[Correspondence]) -> AlignmentResult<FitReport> {
    let (design, machine) = Correspondence::unzip(pairs);
    let transform = if pairs.len() >= 3 {
        match fit_affine(&design, &machine) {
            Ok(t) => t,
            Err(AlignmentError::Singular) => {
                warn!("Affine fit is singular, falling back to similarity");
                fit_similarity(&design, &machine)?
            }
            Err(e) => return Err(e),
        }
    } else {
        fit_similarity(&design, &machine)?
    };

    let report = FitReport::new(transform, &design, &machine);
    info!(
        "Fitted {} transform from {} pairs, rms {:.4} mm, max {:.4} mm",
        report.transform.kind,
        pairs.len(),
        report.rms_error,
        report.max_error
    );
    Ok(report)
}
