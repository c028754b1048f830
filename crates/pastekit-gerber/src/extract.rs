//! Geometry extraction
//!
//! Turns the text of one board layer into pads, an outline and fiducial
//! candidates. The pipeline is: split off parameter blocks, tokenize each
//! data statement, fold the tokens through the decoder state, then build
//! the primitives from what the fold collected.
//!
//! Extraction never fails on bad input. Malformed statements are skipped
//! and counted in [`ExtractionStats`]; a layer with no coordinates yields an
//! empty [`Extraction`].

use crate::aperture::Tool;
use crate::decoder::{statements, DecoderState, Emission, Token, Tokenizer};
use crate::error::GerberResult;
use crate::format::{default_format_detector, FormatDetector};
use crate::header::{split_header, Header};
use pastekit_core::{BoundingBox, CancelToken, Pad, PadShape, PadSource, Point2D};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Board outline derived from the draw operations of one layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardOutline {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
    pub width: f64,
    pub height: f64,
    pub center_x: f64,
    pub center_y: f64,
    pub points: Vec<Point2D>,
}

impl BoardOutline {
    /// Build from traced points, `None` when there are none
    pub fn from_points(points: Vec<Point2D>) -> Option<Self> {
        let bb = BoundingBox::from_points(&points)?;
        let center = bb.center();
        Some(Self {
            min_x: bb.min_x,
            min_y: bb.min_y,
            max_x: bb.max_x,
            max_y: bb.max_y,
            width: bb.width(),
            height: bb.height(),
            center_x: center.x,
            center_y: center.y,
            points,
        })
    }
}

/// A flash that could be a fiducial marker
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FiducialCandidate {
    pub x: f64,
    pub y: f64,
    pub diameter: f64,
    /// Heuristic plausibility in `[0, 1]`, not a probability
    pub confidence: f64,
}

impl FiducialCandidate {
    pub fn position(&self) -> Point2D {
        Point2D::new(self.x, self.y)
    }
}

/// Fiducial screening thresholds (mm)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FiducialScoring {
    pub min_diameter: f64,
    pub max_diameter: f64,
    pub preferred_min_diameter: f64,
    pub preferred_max_diameter: f64,
    /// Flashes closer than this to an accepted candidate are duplicates
    pub dedup_distance: f64,
}

impl Default for FiducialScoring {
    fn default() -> Self {
        Self {
            min_diameter: 0.5,
            max_diameter: 5.0,
            preferred_min_diameter: 1.0,
            preferred_max_diameter: 3.0,
            dedup_distance: 0.1,
        }
    }
}

impl FiducialScoring {
    /// Score a tool, `None` if its diameter is outside the acceptance window
    pub fn score(&self, tool: &Tool) -> Option<f64> {
        let d = tool.diameter();
        if d < self.min_diameter || d > self.max_diameter {
            return None;
        }
        let mut score = 0.3;
        score += match tool.shape {
            PadShape::Circle => 0.3,
            PadShape::Rect => 0.1,
        };
        if tool.has_hole() {
            score += 0.2;
        }
        if d >= self.preferred_min_diameter && d <= self.preferred_max_diameter {
            score += 0.2;
        }
        Some(f64::clamp(score, 0.0, 1.0))
    }
}

/// Per-call extraction options
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Tag stamped on every extracted pad
    pub source: PadSource,
    /// Prefix for pad ids, ids are `{prefix}{n}` starting at 1
    pub id_prefix: String,
    /// Used when the layer has no `%FS` block
    pub format_detector: FormatDetector,
    pub fiducials: FiducialScoring,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            source: PadSource::Structural,
            id_prefix: "P".to_string(),
            format_detector: default_format_detector,
            fiducials: FiducialScoring::default(),
        }
    }
}

impl ExtractOptions {
    pub fn structural() -> Self {
        Self {
            source: PadSource::Structural,
            id_prefix: "S".to_string(),
            ..Self::default()
        }
    }

    pub fn dispensing_target() -> Self {
        Self {
            source: PadSource::DispensingTarget,
            id_prefix: "T".to_string(),
            ..Self::default()
        }
    }
}

/// Counters describing one extraction pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionStats {
    pub coordinate_tokens: usize,
    pub skipped_statements: usize,
    pub flashes: usize,
    pub draws: usize,
    /// Flashes that fell back to the default tool
    pub unresolved_tools: usize,
}

/// Everything extracted from one layer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Extraction {
    pub pads: Vec<Pad>,
    pub outline: Option<BoardOutline>,
    pub fiducial_candidates: Vec<FiducialCandidate>,
    pub stats: ExtractionStats,
}

impl Extraction {
    pub fn is_empty(&self) -> bool {
        self.pads.is_empty() && self.outline.is_none() && self.fiducial_candidates.is_empty()
    }
}

#[derive(Debug, Default)]
struct Collected {
    state: DecoderState,
    flashes: Vec<(Point2D, Option<u32>)>,
    trace: Vec<Point2D>,
    stats: ExtractionStats,
}

impl Collected {
    fn absorb(mut self, token: Option<Token>) -> Self {
        let Some(token) = token else {
            self.stats.skipped_statements += 1;
            return self;
        };
        if matches!(token, Token::Coordinate { .. }) && !self.state.ended {
            self.stats.coordinate_tokens += 1;
        }
        let (state, emission) = self.state.step(&token);
        self.state = state;
        match emission {
            Some(Emission::Flash { at, tool }) => {
                self.stats.flashes += 1;
                self.flashes.push((at, tool));
            }
            Some(Emission::Draw { from, to }) => {
                self.stats.draws += 1;
                if self.trace.last() != Some(&from) {
                    self.trace.push(from);
                }
                self.trace.push(to);
            }
            None => {}
        }
        self
    }
}

/// Extract pads, outline and fiducial candidates from one layer.
pub fn extract(text: &str, options: &ExtractOptions) -> Extraction {
    match extract_inner(text, options, None) {
        Ok(extraction) => extraction,
        // Only reachable through cancellation, which is not requested here.
        Err(_) => Extraction::default(),
    }
}

/// Like [`extract`], checking `cancel` before each line of the data section.
pub fn extract_with_cancel(
    text: &str,
    options: &ExtractOptions,
    cancel: &CancelToken,
) -> GerberResult<Extraction> {
    extract_inner(text, options, Some(cancel))
}

fn extract_inner(
    text: &str,
    options: &ExtractOptions,
    cancel: Option<&CancelToken>,
) -> GerberResult<Extraction> {
    let (header, body) = split_header(text);
    let unit = header.unit.unwrap_or_else(|| {
        debug!("No unit block found, assuming millimeters");
        Default::default()
    });
    let format = header.format.unwrap_or_else(|| {
        let detected = (options.format_detector)(&body, unit);
        warn!(
            "No format specification found, detector chose {}.{}",
            detected.integer_digits, detected.decimal_digits
        );
        detected
    });
    let tokenizer = Tokenizer::new(format, unit);

    let mut collected = Collected::default();
    for line in body.lines() {
        if let Some(token) = cancel {
            token.check()?;
        }
        if collected.state.ended {
            break;
        }
        collected = statements(line).fold(collected, |acc, statement| {
            let token = tokenizer.tokenize(statement);
            if token.is_none() {
                debug!("Skipping malformed statement '{}'", statement);
            }
            acc.absorb(token)
        });
    }

    if collected.stats.coordinate_tokens == 0 {
        debug!("Layer has no coordinate tokens");
        return Ok(Extraction {
            stats: collected.stats,
            ..Extraction::default()
        });
    }

    let pads = build_pads(&collected, &header, options);
    let fiducial_candidates = build_fiducials(&collected, &header, &options.fiducials);
    let stats = ExtractionStats {
        unresolved_tools: collected
            .flashes
            .iter()
            .filter(|(_, tool)| resolve(&header, *tool).is_none())
            .count(),
        ..collected.stats
    };
    if stats.unresolved_tools > 0 {
        warn!(
            "{} flashes reference undefined tools, using 1x1 mm circle",
            stats.unresolved_tools
        );
    }
    let outline = BoardOutline::from_points(collected.trace);

    info!(
        "Extracted {} pads, {} fiducial candidates, outline: {}",
        pads.len(),
        fiducial_candidates.len(),
        outline.is_some()
    );

    Ok(Extraction {
        pads,
        outline,
        fiducial_candidates,
        stats,
    })
}

fn resolve(header: &Header, tool: Option<u32>) -> Option<Tool> {
    tool.and_then(|id| header.tools.get(&id).copied())
}

fn build_pads(collected: &Collected, header: &Header, options: &ExtractOptions) -> Vec<Pad> {
    collected
        .flashes
        .iter()
        .enumerate()
        .map(|(i, (at, tool))| {
            let tool = resolve(header, *tool).unwrap_or_else(Tool::fallback);
            Pad::new(
                format!("{}{}", options.id_prefix, i + 1),
                at.x,
                at.y,
                tool.width,
                tool.height,
                tool.shape,
                options.source,
            )
        })
        .collect()
}

fn build_fiducials(
    collected: &Collected,
    header: &Header,
    scoring: &FiducialScoring,
) -> Vec<FiducialCandidate> {
    let mut accepted: Vec<(Point2D, Tool)> = Vec::new();
    for (at, tool) in &collected.flashes {
        let Some(tool) = resolve(header, *tool) else {
            continue;
        };
        let d = tool.diameter();
        if d < scoring.min_diameter || d > scoring.max_diameter {
            continue;
        }
        if accepted
            .iter()
            .any(|(p, _)| p.distance_to(at) < scoring.dedup_distance)
        {
            continue;
        }
        accepted.push((*at, tool));
    }

    accepted
        .into_iter()
        .filter_map(|(at, tool)| {
            scoring.score(&tool).map(|confidence| FiducialCandidate {
                x: at.x,
                y: at.y,
                diameter: tool.diameter(),
                confidence,
            })
        })
        .collect()
}
