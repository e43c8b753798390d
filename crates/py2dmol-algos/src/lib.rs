//! Computational algorithms for py2dmol-rs
//!
//! This crate holds the numerical core shared by every consumer that needs
//! to orient or superpose structures:
//! - Analytical 3×3 SVD decomposition
//! - Kabsch algorithm for optimal rigid-body superposition
//! - Principal-axis default view ([`best_view`])
//! - Frame-to-frame trajectory alignment ([`TrajectoryAligner`])
//!
//! Coordinates are `[f64; 3]` row vectors; a rotation `R` acts as `p · R`.
//! Every function is pure, and the aligner only holds its reference frame.

pub mod align;
pub mod linalg;

pub use align::{
    align_a_to_b, apply_transform, best_view, best_view_for, kabsch, principal_axes, superpose,
    AlignmentResult, AlignmentSubset, BestView, TrajectoryAligner, Viewport,
};
pub use linalg::{center, centroid, ensure_finite, rmsd, svd3, translate, Rotation3, Svd3};

/// Errors from alignment algorithms
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AlignError {
    #[error("Coordinate arrays have different lengths: {0} vs {1}")]
    ShapeMismatch(usize, usize),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Alignment subset index {index} out of range for {len} points")]
    SubsetOutOfRange { index: usize, len: usize },
}
