//! Statement decoding
//!
//! The data section is scanned statement by statement (`*` terminated).
//! Each statement becomes a [`Token`], and tokens are folded through a
//! [`DecoderState`] accumulator that carries the current point, the
//! selected tool and the modal draw code. The state is a plain value:
//! `step` consumes it and returns the next one, so the decoder can be
//! exercised one token at a time.

use crate::format::CoordinateFormat;
use pastekit_core::{LengthUnit, Point2D};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Draw operation codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrawOp {
    /// D01, interpolate to the point
    Draw,
    /// D02, move without exposure
    Move,
    /// D03, stamp the selected tool at the point
    Flash,
}

impl DrawOp {
    fn from_code(code: u32) -> Option<Self> {
        match code {
            1 => Some(DrawOp::Draw),
            2 => Some(DrawOp::Move),
            3 => Some(DrawOp::Flash),
            _ => None,
        }
    }
}

/// One decoded data statement, coordinates already in millimetres
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Token {
    /// A statement carrying X and/or Y, with an optional explicit draw code
    Coordinate {
        x: Option<f64>,
        y: Option<f64>,
        op: Option<DrawOp>,
    },
    /// A draw code without coordinates (acts at the current point)
    Operation(DrawOp),
    /// Dnn with nn >= 10
    SelectTool(u32),
    /// Mode or comment statement with no geometric effect
    Ignored,
    /// M02 / M00
    EndOfFile,
}

fn statement_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^(?:G0*(\d+))?(?:X([+-]?[\d.]+))?(?:Y([+-]?[\d.]+))?(?:I([+-]?[\d.]+))?(?:J([+-]?[\d.]+))?(?:D0*(\d+))?$",
        )
        .expect("invalid regex pattern")
    })
}

/// Converts statement text to tokens for one layer.
#[derive(Debug, Clone, Copy)]
pub struct Tokenizer {
    pub format: CoordinateFormat,
    pub unit: LengthUnit,
}

impl Tokenizer {
    pub fn new(format: CoordinateFormat, unit: LengthUnit) -> Self {
        Self { format, unit }
    }

    fn coordinate(&self, raw: Option<regex::Match<'_>>) -> Result<Option<f64>, ()> {
        match raw {
            None => Ok(None),
            Some(m) => self
                .format
                .decode(m.as_str())
                .map(|v| Some(self.unit.to_mm(v)))
                .ok_or(()),
        }
    }

    /// Decode one statement (without its trailing `*`).
    ///
    /// Returns `None` for malformed statements; the caller skips them.
    pub fn tokenize(&self, statement: &str) -> Option<Token> {
        let s = statement.trim();
        if s.is_empty() {
            return Some(Token::Ignored);
        }
        if s.starts_with("G04") || s.starts_with("G4 ") || s == "G4" {
            return Some(Token::Ignored);
        }
        if s == "M02" || s == "M2" || s == "M00" || s == "M0" {
            return Some(Token::EndOfFile);
        }
        if s.starts_with('M') {
            return Some(Token::Ignored);
        }

        let caps = statement_regex().captures(s)?;
        let x = self.coordinate(caps.get(2)).ok()?;
        let y = self.coordinate(caps.get(3)).ok()?;
        // I/J must still be well-formed even though arcs are flattened to chords.
        self.coordinate(caps.get(4)).ok()?;
        self.coordinate(caps.get(5)).ok()?;
        let d_code = match caps.get(6) {
            Some(m) => Some(m.as_str().parse::<u32>().ok()?),
            None => None,
        };

        if x.is_some() || y.is_some() {
            let op = match d_code {
                Some(code) => Some(DrawOp::from_code(code)?),
                None => None,
            };
            return Some(Token::Coordinate { x, y, op });
        }

        match d_code {
            Some(code) if code >= 10 => Some(Token::SelectTool(code)),
            Some(code) => DrawOp::from_code(code).map(Token::Operation),
            None if caps.get(1).is_some() => Some(Token::Ignored),
            None => None,
        }
    }
}

/// What a single token produced
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Emission {
    /// Interpolation from `from` to `to`
    Draw { from: Point2D, to: Point2D },
    /// Tool stamped at `at`, `tool` is the selected tool id if any
    Flash { at: Point2D, tool: Option<u32> },
}

/// Running decoder state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecoderState {
    pub position: Point2D,
    pub tool: Option<u32>,
    /// Modal draw code reused by coordinate statements without a D code
    pub last_op: DrawOp,
    pub ended: bool,
}

impl Default for DecoderState {
    fn default() -> Self {
        Self {
            position: Point2D::origin(),
            tool: None,
            last_op: DrawOp::Move,
            ended: false,
        }
    }
}

impl DecoderState {
    /// Apply one token, returning the next state and any emitted geometry.
    pub fn step(self, token: &Token) -> (DecoderState, Option<Emission>) {
        if self.ended {
            return (self, None);
        }
        match *token {
            Token::Coordinate { x, y, op } => {
                let target = Point2D::new(x.unwrap_or(self.position.x), y.unwrap_or(self.position.y));
                let op = op.unwrap_or(self.last_op);
                let next = DecoderState {
                    position: target,
                    last_op: op,
                    ..self
                };
                (next, self.emit(op, target))
            }
            Token::Operation(op) => {
                let next = DecoderState { last_op: op, ..self };
                (next, self.emit(op, self.position))
            }
            Token::SelectTool(id) => (DecoderState { tool: Some(id), ..self }, None),
            Token::Ignored => (self, None),
            Token::EndOfFile => (DecoderState { ended: true, ..self }, None),
        }
    }

    fn emit(&self, op: DrawOp, target: Point2D) -> Option<Emission> {
        match op {
            DrawOp::Move => None,
            DrawOp::Draw => Some(Emission::Draw {
                from: self.position,
                to: target,
            }),
            DrawOp::Flash => Some(Emission::Flash {
                at: target,
                tool: self.tool,
            }),
        }
    }
}

/// Split a data-section line into statements.
pub fn statements(line: &str) -> impl Iterator<Item = &str> {
    line.split('*').map(str::trim).filter(|s| !s.is_empty())
}
