//! Linear algebra utilities
//!
//! - [`svd3`] - 3×3 SVD decomposition (Jacobi eigenvalue method, f64)
//! - [`mat3`] - row-major 3×3 helpers and the [`Rotation3`] type
//! - [`cloud`] - centroid, centering, RMSD and cross-covariance of point clouds

pub mod cloud;
pub mod mat3;
pub mod svd3;

pub use cloud::{center, centroid, ensure_finite, rmsd, translate};
pub use mat3::Rotation3;
pub use svd3::{svd3, Svd3};
