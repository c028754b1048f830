//! # PasteKit
//!
//! Plans solder paste dispensing from board manufacturing files.
//!
//! ## Architecture
//!
//! 1. **pastekit-core** - Points, pads, units, cancellation
//! 2. **pastekit-gerber** - Layer extraction, pad combining, origin and fiducial selection
//! 3. **pastekit-alignment** - Design-to-machine transform fitting
//! 4. **pastekit-motion** - Dispensing order, motion profiles, G-code text
//! 5. **pastekit-settings** - Configuration files
//! 6. **pastekit** - This crate and the `pastekit` binary

pub use pastekit_alignment as alignment;
pub use pastekit_gerber as gerber;
pub use pastekit_motion as motion;
pub use pastekit_settings as settings;

pub use pastekit_alignment::{fit_auto, Correspondence, FitReport, Transform, TransformKind};
pub use pastekit_core::{CancelToken, Pad, PadSource, Point2D};
pub use pastekit_gerber::{
    combine, extract, select_fiducials, select_origin, ExtractOptions, Extraction, LayerKind,
    ReferencePoint,
};
pub use pastekit_motion::{
    profile, sequence_flat, sequence_safe, transform_sequence, AxisLimits, ComponentHeightMap,
    DispensingSequenceEntry, GcodeEmitter, MotionProfile, SequenceSummary,
};
pub use pastekit_settings::Config;

/// Initialize tracing output on stderr.
///
/// The level comes from `RUST_LOG` and defaults to `info`. Stdout stays
/// free for the program text. With `json` set, events are written as JSON
/// lines.
pub fn init_logging(json: bool) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_line_number(true);

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry.with(fmt_layer.json()).try_init()?;
    } else {
        registry.with(fmt_layer.compact()).try_init()?;
    }
    Ok(())
}
