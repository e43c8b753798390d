//! Rigid-body alignment
//!
//! - Kabsch solver for corresponding point sets
//! - Principal-axis default view for a single structure
//! - Trajectory alignment of frames onto a stored reference

pub mod best_view;
pub mod kabsch;
pub mod trajectory;

pub use best_view::{best_view, best_view_for, principal_axes, BestView, Viewport};
pub use kabsch::{align_a_to_b, apply_transform, kabsch, superpose, AlignmentResult};
pub use trajectory::{AlignmentSubset, TrajectoryAligner};
