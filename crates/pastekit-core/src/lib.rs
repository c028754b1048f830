//! # PasteKit Core
//!
//! Core value types and utilities shared by every PasteKit crate.
//! Provides planar and spatial points, bounding boxes, unit conversion,
//! cooperative cancellation, and the shared error type.
//!
//! All coordinates are millimetres. A point never records which frame
//! (design or machine) it belongs to; callers keep track of that and only
//! move between frames by applying an explicit transform.

pub mod cancel;
pub mod error;
pub mod geometry;
pub mod pad;
pub mod units;

pub use cancel::CancelToken;
pub use error::{ensure_positive, CoreError, CoreResult};
pub use geometry::{BoundingBox, Point2D, Point3D};
pub use pad::{CombineStatus, Pad, PadShape, PadSource};
pub use units::{LengthUnit, MM_PER_INCH};
