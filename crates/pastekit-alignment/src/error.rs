//! Error types for transform fitting.

use thiserror::Error;

/// Errors that can occur while fitting or inverting a transform.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AlignmentError {
    /// Too few correspondences for the requested model.
    #[error("Insufficient points: {required} required, {provided} provided")]
    InsufficientPoints {
        /// Minimum number of pairs for the model.
        required: usize,
        /// Number of pairs supplied.
        provided: usize,
    },

    /// Design and machine point lists differ in length.
    #[error("Mismatched point lists: {design} design points, {machine} machine points")]
    MismatchedLengths { design: usize, machine: usize },

    /// The system is singular or near-singular (collinear points, zero determinant).
    #[error("Singular system, points are collinear or the transform is not invertible")]
    Singular,

    /// All design points coincide.
    #[error("Degenerate input, all design points coincide")]
    Degenerate,
}

/// Result type alias for alignment operations.
pub type AlignmentResult<T> = Result<T, AlignmentError>;
