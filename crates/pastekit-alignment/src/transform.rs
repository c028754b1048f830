//! Planar design-to-machine transforms
//!
//! `x' = a·x + b·y + tx`, `y' = c·x + d·y + ty`.

use crate::error::{AlignmentError, AlignmentResult};
use pastekit_core::Point2D;
use serde::{Deserialize, Serialize};

/// Determinants below this are treated as singular
pub const SINGULAR_EPSILON: f64 = 1e-12;

/// Transform model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformKind {
    /// Rotation, uniform scale and translation
    Similarity,
    /// General linear part plus translation
    Affine,
}

impl std::fmt::Display for TransformKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransformKind::Similarity => write!(f, "similarity"),
            TransformKind::Affine => write!(f, "affine"),
        }
    }
}

/// A design point paired with where it was observed on the machine
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Correspondence {
    pub design: Point2D,
    pub machine: Point2D,
}

impl Correspondence {
    pub fn new(design: Point2D, machine: Point2D) -> Self {
        Self { design, machine }
    }

    /// Split a pair list into design and machine point lists
    pub fn unzip(pairs: &[Correspondence]) -> (Vec<Point2D>, Vec<Point2D>) {
        pairs.iter().map(|c| (c.design, c.machine)).unzip()
    }
}

/// Design-to-machine mapping.
///
/// `scale` and `theta` are only set for similarity transforms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub kind: TransformKind,
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub tx: f64,
    pub ty: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
    /// Rotation in radians
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theta: Option<f64>,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    pub fn identity() -> Self {
        Self::similarity(1.0, 0.0, 0.0, 0.0)
    }

    /// Build a similarity from its scale, rotation (radians) and translation
    pub fn similarity(scale: f64, theta: f64, tx: f64, ty: f64) -> Self {
        let (sin, cos) = theta.sin_cos();
        Self {
            kind: TransformKind::Similarity,
            a: scale * cos,
            b: -scale * sin,
            c: scale * sin,
            d: scale * cos,
            tx,
            ty,
            scale: Some(scale),
            theta: Some(theta),
        }
    }

    pub fn affine(a: f64, b: f64, c: f64, d: f64, tx: f64, ty: f64) -> Self {
        Self {
            kind: TransformKind::Affine,
            a,
            b,
            c,
            d,
            tx,
            ty,
            scale: None,
            theta: None,
        }
    }

    pub fn determinant(&self) -> f64 {
        self.a * self.d - self.b * self.c
    }

    pub fn apply(&self, p: &Point2D) -> Point2D {
        Point2D::new(
            self.a * p.x + self.b * p.y + self.tx,
            self.c * p.x + self.d * p.y + self.ty,
        )
    }

    pub fn apply_all(&self, points: &[Point2D]) -> Vec<Point2D> {
        points.iter().map(|p| self.apply(p)).collect()
    }

    /// Machine-to-design inverse.
    ///
    /// Fails with [`AlignmentError::Singular`] when `|det| < 1e-12`.
    pub fn invert(&self) -> AlignmentResult<Transform> {
        let det = self.determinant();
        if !det.is_finite() || det.abs() < SINGULAR_EPSILON {
            return Err(AlignmentError::Singular);
        }
        let a = self.d / det;
        let b = -self.b / det;
        let c = -self.c / det;
        let d = self.a / det;
        let tx = -(a * self.tx + b * self.ty);
        let ty = -(c * self.tx + d * self.ty);

        Ok(Transform {
            kind: self.kind,
            a,
            b,
            c,
            d,
            tx,
            ty,
            scale: self.scale.map(|s| 1.0 / s),
            theta: self.theta.map(|t| -t),
        })
    }

}

/// Free-function form of [`Transform::invert`]
pub fn invert(transform: &Transform) -> AlignmentResult<Transform> {
    transform.invert()
}
