//! # PasteKit Gerber
//!
//! Board geometry from RS-274X layer text.
//!
//! - [`extract`]: pads, outline and fiducial candidates from one layer
//! - [`combine`]: fuse structural and paste pads by nearest match
//! - [`select`]: board origin and ranked fiducials
//!
//! Only the subset needed for dispensing is decoded: units, coordinate
//! format, circle/rect/obround/polygon apertures, flashes and linear draws.
//! Everything leaves this crate in millimetres.

pub mod aperture;
pub mod combine;
pub mod decoder;
pub mod error;
pub mod extract;
pub mod format;
pub mod header;
pub mod layer;
pub mod select;

pub use aperture::{parse_aperture, Tool, DEFAULT_TOOL_SIZE};
pub use combine::{combine, CombineResult, PadCombiner, DEFAULT_MATCH_THRESHOLD};
pub use decoder::{DecoderState, DrawOp, Emission, Token, Tokenizer};
pub use error::{GerberError, GerberResult};
pub use extract::{
    extract, extract_with_cancel, BoardOutline, ExtractOptions, Extraction, ExtractionStats,
    FiducialCandidate, FiducialScoring,
};
pub use format::{default_format_detector, CoordinateFormat, FormatDetector, ZeroSuppression};
pub use header::{split_header, Header};
pub use layer::LayerKind;
pub use select::{
    is_priority_layer, select_fiducials, select_origin, FiducialSelector, LayerCandidates,
    ReferenceKind, ReferencePoint, ORIGIN_CONFIDENCE,
};
