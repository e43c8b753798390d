//! 3×3 row-major matrix utilities and the [`Rotation3`] type
//!
//! Coordinates are row vectors throughout the crate: a point `p` is rotated
//! as `p · R`, so an N×3 cloud `A` maps to `A · R`.

use lin_alg::f64::Vec3;

use crate::AlignError;

pub(crate) const IDENTITY: [[f64; 3]; 3] = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

pub(crate) fn dot(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

pub(crate) fn cross(a: &[f64; 3], b: &[f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

/// Column-vector product `M · v`
pub(crate) fn mat_vec(m: &[[f64; 3]; 3], v: &[f64; 3]) -> [f64; 3] {
    [dot(&m[0], v), dot(&m[1], v), dot(&m[2], v)]
}

/// Matrix product `A · B`
pub(crate) fn mat_mul(a: &[[f64; 3]; 3], b: &[[f64; 3]; 3]) -> [[f64; 3]; 3] {
    let mut out = [[0.0f64; 3]; 3];
    for (row, out_row) in out.iter_mut().enumerate() {
        for (col, out_val) in out_row.iter_mut().enumerate() {
            *out_val = a[row][0] * b[0][col] + a[row][1] * b[1][col] + a[row][2] * b[2][col];
        }
    }
    out
}

pub(crate) fn transpose(m: &[[f64; 3]; 3]) -> [[f64; 3]; 3] {
    [
        [m[0][0], m[1][0], m[2][0]],
        [m[0][1], m[1][1], m[2][1]],
        [m[0][2], m[1][2], m[2][2]],
    ]
}

pub(crate) fn det3(m: &[[f64; 3]; 3]) -> f64 {
    m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
        - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
        + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
}

/// A proper 3×3 rotation (orthonormal, det = +1), row-major.
///
/// Applied to row vectors: `p' = p · R`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rotation3 {
    /// Matrix rows, `m[row][col]`
    pub m: [[f64; 3]; 3],
}

impl Default for Rotation3 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Rotation3 {
    pub const fn identity() -> Self {
        Self { m: IDENTITY }
    }

    /// Wrap a matrix without checking orthonormality.
    pub const fn from_rows(m: [[f64; 3]; 3]) -> Self {
        Self { m }
    }

    /// Wrap a matrix, rejecting anything that is not a proper rotation
    /// within `tol`.
    pub fn try_from_rows(m: [[f64; 3]; 3], tol: f64) -> Result<Self, AlignError> {
        let r = Self { m };
        if !m.iter().flatten().all(|x| x.is_finite()) {
            return Err(AlignError::InvalidInput("rotation has non-finite entries".into()));
        }
        if r.orthonormality_error() > tol || (r.determinant() - 1.0).abs() > tol {
            return Err(AlignError::InvalidInput(format!(
                "not a proper rotation (det = {:.6})",
                r.determinant()
            )));
        }
        Ok(r)
    }

    /// Rotation by `angle` radians (right-handed) about `axis`.
    ///
    /// A zero-length axis gives the identity.
    pub fn from_axis_angle(axis: [f64; 3], angle: f64) -> Self {
        let len = dot(&axis, &axis).sqrt();
        if !(len > 0.0) {
            return Self::identity();
        }
        let [x, y, z] = [axis[0] / len, axis[1] / len, axis[2] / len];
        let (s, c) = angle.sin_cos();
        let t = 1.0 - c;
        // Transpose of the column-vector Rodrigues matrix
        Self {
            m: [
                [c + t * x * x, t * x * y + s * z, t * x * z - s * y],
                [t * x * y - s * z, c + t * y * y, t * y * z + s * x],
                [t * x * z + s * y, t * y * z - s * x, c + t * z * z],
            ],
        }
    }

    pub fn transpose(&self) -> Self {
        Self { m: transpose(&self.m) }
    }

    /// Inverse rotation (the transpose)
    pub fn inverse(&self) -> Self {
        self.transpose()
    }

    /// `self · other`: applying the result equals applying `self`, then `other`.
    pub fn then(&self, other: &Rotation3) -> Self {
        Self { m: mat_mul(&self.m, &other.m) }
    }

    pub fn determinant(&self) -> f64 {
        det3(&self.m)
    }

    /// Frobenius norm of `RᵀR − I`
    pub fn orthonormality_error(&self) -> f64 {
        let rtr = mat_mul(&transpose(&self.m), &self.m);
        let mut sum = 0.0;
        for (i, row) in rtr.iter().enumerate() {
            for (j, &v) in row.iter().enumerate() {
                let d = if i == j { v - 1.0 } else { v };
                sum += d * d;
            }
        }
        sum.sqrt()
    }

    /// Rotation angle in radians, in `[0, π]`
    pub fn angle(&self) -> f64 {
        let trace = self.m[0][0] + self.m[1][1] + self.m[2][2];
        ((trace - 1.0) * 0.5).clamp(-1.0, 1.0).acos()
    }

    /// Largest absolute element-wise difference to `other`
    pub fn max_abs_diff(&self, other: &Rotation3) -> f64 {
        self.m
            .iter()
            .flatten()
            .zip(other.m.iter().flatten())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max)
    }

    /// Rotate a single point: `p · R`
    pub fn apply(&self, p: [f64; 3]) -> [f64; 3] {
        let m = &self.m;
        [
            p[0] * m[0][0] + p[1] * m[1][0] + p[2] * m[2][0],
            p[0] * m[0][1] + p[1] * m[1][1] + p[2] * m[2][1],
            p[0] * m[0][2] + p[1] * m[1][2] + p[2] * m[2][2],
        ]
    }

    pub fn apply_vec3(&self, v: Vec3) -> Vec3 {
        let [x, y, z] = self.apply([v.x, v.y, v.z]);
        Vec3::new(x, y, z)
    }

    /// Rotate every point of a cloud, returning new coordinates
    pub fn apply_all(&self, points: &[[f64; 3]]) -> Vec<[f64; 3]> {
        points.iter().map(|&p| self.apply(p)).collect()
    }
}
