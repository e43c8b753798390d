//! Principal-axis default orientation for a single structure
//!
//! The cloud's own scatter matrix `Aᶜᵀ·Aᶜ` is decomposed; its left singular
//! vectors are the principal axes in order of decreasing spread. Rotating
//! onto them puts the longest extent along screen X, the second along Y and
//! the thinnest along the view direction Z.

use lin_alg::f64::Vec3;

use super::kabsch::ensure_proper;
use crate::linalg::cloud::{center, cross_covariance, ensure_finite, max_abs, translate};
use crate::linalg::mat3::{det3, dot};
use crate::linalg::{svd3, Rotation3};
use crate::AlignError;

/// Third moment along an axis, relative to `Σ |p|³`, below which the axis
/// is treated as symmetric and its sign falls back to the largest component.
const SKEW_TOLERANCE: f64 = 1e-9;

/// Quarter turn about the view axis: screen X becomes screen Y.
const PORTRAIT_TURN: Rotation3 =
    Rotation3::from_rows([[0.0, 1.0, 0.0], [-1.0, 0.0, 0.0], [0.0, 0.0, 1.0]]);

/// Size of the drawing surface the orientation is chosen for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 400,
            height: 400,
        }
    }
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_portrait(&self) -> bool {
        self.height > self.width
    }
}

/// Outcome of [`best_view`]
#[derive(Debug, Clone)]
pub struct BestView {
    /// Rotation applied about the centroid
    pub rotation: Rotation3,
    /// Centroid of the input, preserved in the output
    pub center: Vec3,
    /// `(p − center) · rotation + center` for every input point
    pub coords: Vec<[f64; 3]>,
}

/// Principal-axis orientation for a square or landscape viewport.
pub fn best_view(coords: &[[f64; 3]]) -> Result<BestView, AlignError> {
    best_view_for(coords, Viewport::default())
}

/// Principal-axis orientation for the given viewport.
///
/// A portrait viewport receives the longest extent vertically. Clouds with
/// fewer than two points are returned unchanged with the identity rotation.
pub fn best_view_for(coords: &[[f64; 3]], viewport: Viewport) -> Result<BestView, AlignError> {
    ensure_finite(coords)?;
    let (centered, centroid) = center(coords);

    if coords.len() < 2 {
        return Ok(BestView {
            rotation: Rotation3::identity(),
            center: centroid,
            coords: coords.to_vec(),
        });
    }

    let mut rotation = principal_axes(&centered);
    ensure_proper(&rotation)?;
    if viewport.is_portrait() {
        rotation = rotation.then(&PORTRAIT_TURN);
    }

    let out = translate(&rotation.apply_all(&centered), centroid);
    log::debug!(
        "best view for {} points: {:.1}° about centroid",
        coords.len(),
        rotation.angle().to_degrees()
    );

    Ok(BestView {
        rotation,
        center: centroid,
        coords: out,
    })
}

/// Proper rotation whose columns are the principal axes of a centered cloud.
///
/// The first two axes point towards the heavier tail of the projected
/// distribution (positive third moment), so the result does not depend on
/// the input orientation; the third axis is fixed by handedness through the
/// usual `diag(1, 1, d)` correction.
pub fn principal_axes(centered: &[[f64; 3]]) -> Rotation3 {
    // Unit-sized copy: neither the axes nor the moment signs depend on scale
    let extent = max_abs(centered);
    let unit: Vec<[f64; 3]> = if extent > 0.0 {
        centered
            .iter()
            .map(|p| [p[0] / extent, p[1] / extent, p[2] / extent])
            .collect()
    } else {
        centered.to_vec()
    };
    let scatter = cross_covariance(&unit, &unit);
    let svd = svd3(&scatter);

    let mut axes = [svd.u_col(0), svd.u_col(1), svd.u_col(2)];
    for axis in axes.iter_mut().take(2) {
        orient_axis(axis, &unit);
    }

    let mut m = [[0.0f64; 3]; 3];
    for (col, axis) in axes.iter().enumerate() {
        for row in 0..3 {
            m[row][col] = axis[row];
        }
    }

    let d = if det3(&m) < 0.0 { -1.0 } else { 1.0 };
    for row in m.iter_mut() {
        row[2] *= d;
    }
    Rotation3::from_rows(m)
}

fn orient_axis(axis: &mut [f64; 3], centered: &[[f64; 3]]) {
    // Measured against the whole cloud, so an axis with no spread of its
    // own falls through to the component rule
    let (skew, magnitude) = centered.iter().fold((0.0f64, 0.0f64), |(s, m), p| {
        let t = dot(p, axis);
        (s + t * t * t, m + dot(p, p).powf(1.5))
    });

    let flip = if skew.abs() > magnitude * SKEW_TOLERANCE {
        skew < 0.0
    } else {
        let mut largest = 0;
        for k in 1..3 {
            if axis[k].abs() > axis[largest].abs() {
                largest = k;
            }
        }
        axis[largest] < 0.0
    };

    if flip {
        for v in axis.iter_mut() {
            *v = -*v;
        }
    }
}
