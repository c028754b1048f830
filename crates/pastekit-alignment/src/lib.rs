//! # PasteKit Alignment
//!
//! Fits the transform that maps design coordinates onto machine coordinates
//! from a few observed reference points, and inverts it.
//!
//! Correspondences are always supplied by the caller. A fit never guesses
//! pairs and never returns a transform built from an underdetermined or
//! singular system.

pub mod error;
pub mod fit;
pub mod transform;

pub use error::{AlignmentError, AlignmentResult};
pub use fit::{fit_affine, fit_auto, fit_similarity, residuals, rms_error, FitReport};
pub use transform::{invert, Correspondence, Transform, TransformKind, SINGULAR_EPSILON};
