//! # PasteKit Motion
//!
//! Turns pads into machine motion:
//!
//! - [`sequence`]: visit order, flat or collision-aware
//! - [`profile`]: axis-limited trapezoidal/triangular profiles with sampled waypoints
//! - [`gcode`]: line-oriented program text
//!
//! All planning is synchronous and pure. Long runs can be aborted between
//! pad selections through a [`pastekit_core::CancelToken`].

pub mod error;
pub mod gcode;
pub mod heights;
pub mod limits;
pub mod profile;
pub mod sequence;

pub use error::{MotionError, MotionResult};
pub use gcode::{GcodeEmitter, GcodeOptions};
pub use heights::{ComponentHeightMap, Obstacle, DEFAULT_OBSTACLE_RADIUS};
pub use limits::{AxisLimits, ProfileOptions};
pub use profile::{profile, MotionProfile, ProfileKind, Waypoint, MAX_WAYPOINTS, MIN_MOVE_LENGTH};
pub use sequence::{
    sequence_flat, sequence_flat_with_cancel, sequence_safe, sequence_safe_with_cancel,
    transform_sequence, DispensingSequenceEntry, PathSegment, SafePath, SafePathConfig,
    SegmentKind, SequenceSummary,
};
