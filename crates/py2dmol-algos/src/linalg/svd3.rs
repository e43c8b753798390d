//! Analytical 3×3 SVD decomposition
//!
//! Computes A = U · diag(S) · Vᵀ for a 3×3 matrix using the cyclic Jacobi
//! eigenvalue algorithm on AᵀA (symmetric positive semi-definite).
//!
//! All matrices are row-major: `m[row][col]`. The decomposition is a true
//! SVD (no sign folding into the singular values), so `det(U)` and `det(V)`
//! may each be −1. Rank-deficient inputs get their missing left singular
//! vectors completed to an orthonormal basis.

use super::mat3::{cross, dot, mat_vec, IDENTITY};

/// Maximum number of Jacobi sweeps. Convergence is quadratic, so a
/// well-conditioned 3×3 needs fewer than ten.
const MAX_SWEEPS: usize = 50;

/// Singular values below `s[0] * RANK_TOLERANCE` are treated as zero.
const RANK_TOLERANCE: f64 = 1e-12;

/// Components of a unit vector this close count as tied.
const PERPENDICULAR_TIE: f64 = 1e-9;

/// Result of 3×3 SVD decomposition: A = U · diag(S) · Vᵀ
#[derive(Debug, Clone, Copy)]
pub struct Svd3 {
    /// Left singular vectors as columns (orthonormal, row-major storage)
    pub u: [[f64; 3]; 3],
    /// Singular values (sorted descending, non-negative)
    pub s: [f64; 3],
    /// Right singular vectors transposed: row `k` is the k-th right singular vector
    pub vt: [[f64; 3]; 3],
}

impl Svd3 {
    /// Column `k` of U
    pub fn u_col(&self, k: usize) -> [f64; 3] {
        [self.u[0][k], self.u[1][k], self.u[2][k]]
    }
}

/// Compute the SVD of a 3×3 row-major matrix
pub fn svd3(a: &[[f64; 3]; 3]) -> Svd3 {
    // 1. AᵀA is symmetric PSD; its eigenvectors are the right singular vectors
    let ata = gram(a);

    // 2. Jacobi eigendecomposition
    let (eigenvalues, eigvec_cols) = jacobi_eigen_3x3(&ata);

    // 3. Sort by descending eigenvalue
    let mut order = [0usize, 1, 2];
    if eigenvalues[order[0]] < eigenvalues[order[1]] {
        order.swap(0, 1);
    }
    if eigenvalues[order[0]] < eigenvalues[order[2]] {
        order.swap(0, 2);
    }
    if eigenvalues[order[1]] < eigenvalues[order[2]] {
        order.swap(1, 2);
    }

    let s = [
        eigenvalues[order[0]].max(0.0).sqrt(),
        eigenvalues[order[1]].max(0.0).sqrt(),
        eigenvalues[order[2]].max(0.0).sqrt(),
    ];
    let v_cols = [eigvec_cols[order[0]], eigvec_cols[order[1]], eigvec_cols[order[2]]];

    // 4. U columns: u_i = A · v_i / s_i, re-orthonormalized
    let u_cols = left_singular_vectors(a, &s, &v_cols);

    let mut u = [[0.0f64; 3]; 3];
    for (col, u_col) in u_cols.iter().enumerate() {
        for row in 0..3 {
            u[row][col] = u_col[row];
        }
    }

    Svd3 { u, s, vt: v_cols }
}

/// AᵀA for a row-major A: (AᵀA)_{ij} = Σ_k A_{ki}·A_{kj}
fn gram(a: &[[f64; 3]; 3]) -> [[f64; 3]; 3] {
    let mut out = [[0.0f64; 3]; 3];
    for i in 0..3 {
        for j in 0..3 {
            out[i][j] = a[0][i] * a[0][j] + a[1][i] * a[1][j] + a[2][i] * a[2][j];
        }
    }
    out
}

/// Left singular vectors from the right ones.
///
/// The result is exactly orthonormal (Gram-Schmidt + cross product), which
/// matters more to the callers than reproducing noise-level singular
/// directions of a rank-deficient matrix.
fn left_singular_vectors(a: &[[f64; 3]; 3], s: &[f64; 3], v: &[[f64; 3]; 3]) -> [[f64; 3]; 3] {
    // Zero matrix (or NaN): any orthonormal basis is valid
    if !(s[0] > 0.0) {
        return IDENTITY;
    }
    let tol = s[0] * RANK_TOLERANCE;

    let mut u0 = scale(&mat_vec(a, &v[0]), 1.0 / s[0]);
    normalize(&mut u0);

    let u1 = if s[1] > tol {
        let raw = scale(&mat_vec(a, &v[1]), 1.0 / s[1]);
        let mut residual = sub(&raw, &scale(&u0, dot(&raw, &u0)));
        // A residual this short means s[1] was rounding noise
        if normalize(&mut residual) > 1e-6 {
            residual
        } else {
            arbitrary_perpendicular(&u0)
        }
    } else {
        arbitrary_perpendicular(&u0)
    };

    let mut u2 = cross(&u0, &u1);
    if s[2] > tol && dot(&u2, &mat_vec(a, &v[2])) < 0.0 {
        u2 = scale(&u2, -1.0);
    }

    [u0, u1, u2]
}

fn scale(v: &[f64; 3], k: f64) -> [f64; 3] {
    [v[0] * k, v[1] * k, v[2] * k]
}

fn sub(a: &[f64; 3], b: &[f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

/// Normalize in place, returning the original length
fn normalize(v: &mut [f64; 3]) -> f64 {
    let len = dot(v, v).sqrt();
    if len > 0.0 {
        v[0] /= len;
        v[1] /= len;
        v[2] /= len;
    }
    len
}

/// Unit vector perpendicular to the unit vector `v`, taken from the
/// coordinate axis least aligned with it (lowest index on ties).
fn arbitrary_perpendicular(v: &[f64; 3]) -> [f64; 3] {
    let smallest = v.iter().fold(f64::INFINITY, |m, x| m.min(x.abs()));
    let k = (0..3)
        .find(|&i| v[i].abs() <= smallest + PERPENDICULAR_TIE)
        .unwrap_or(0);
    let mut axis = [0.0f64; 3];
    axis[k] = 1.0;
    let mut perp = sub(&axis, &scale(v, v[k]));
    normalize(&mut perp);
    perp
}

/// Cyclic Jacobi eigenvalue algorithm for 3×3 symmetric matrices.
///
/// Returns (eigenvalues, eigenvector_columns).
fn jacobi_eigen_3x3(m: &[[f64; 3]; 3]) -> ([f64; 3], [[f64; 3]; 3]) {
    let mut a = *m;
    let mut v = IDENTITY;

    let norm_sq: f64 = a.iter().flatten().map(|x| x * x).sum();
    if norm_sq > 0.0 {
        for _ in 0..MAX_SWEEPS {
            let off = a[0][1] * a[0][1] + a[0][2] * a[0][2] + a[1][2] * a[1][2];
            if off <= norm_sq * f64::EPSILON * f64::EPSILON {
                break;
            }
            for &(p, q) in &[(0usize, 1usize), (0, 2), (1, 2)] {
                if a[p][q] != 0.0 {
                    jacobi_rotate(&mut a, &mut v, p, q);
                }
            }
        }
    }

    let eigenvalues = [a[0][0], a[1][1], a[2][2]];
    let eigvec_cols = [
        [v[0][0], v[1][0], v[2][0]],
        [v[0][1], v[1][1], v[2][1]],
        [v[0][2], v[1][2], v[2][2]],
    ];
    (eigenvalues, eigvec_cols)
}

/// Apply one Jacobi rotation zeroing `a[p][q]`, accumulating it into `v`.
fn jacobi_rotate(a: &mut [[f64; 3]; 3], v: &mut [[f64; 3]; 3], p: usize, q: usize) {
    let apq = a[p][q];
    let theta = (a[q][q] - a[p][p]) / (2.0 * apq);
    let t = if theta.abs() > 1e150 {
        0.5 / theta
    } else {
        theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt())
    };
    let c = 1.0 / (t * t + 1.0).sqrt();
    let s = t * c;
    let tau = s / (1.0 + c);

    a[p][p] -= t * apq;
    a[q][q] += t * apq;
    a[p][q] = 0.0;
    a[q][p] = 0.0;

    let r = 3 - p - q;
    let arp = a[r][p];
    let arq = a[r][q];
    a[r][p] = arp - s * (arq + tau * arp);
    a[r][q] = arq + s * (arp - tau * arq);
    a[p][r] = a[r][p];
    a[q][r] = a[r][q];

    for row in v.iter_mut() {
        let vp = row[p];
        let vq = row[q];
        row[p] = vp - s * (vq + tau * vp);
        row[q] = vq + s * (vp - tau * vq);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linalg::mat3::{mat_mul, transpose};

    fn diag_mat(s: &[f64; 3]) -> [[f64; 3]; 3] {
        [[s[0], 0.0, 0.0], [0.0, s[1], 0.0], [0.0, 0.0, s[2]]]
    }

    fn assert_orthogonal(m: &[[f64; 3]; 3], label: &str) {
        let prod = mat_mul(&transpose(m), m);
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!(
                    (prod[i][j] - expected).abs() < 1e-12,
                    "{} not orthogonal: (MᵀM)[{}][{}] = {}",
                    label,
                    i,
                    j,
                    prod[i][j]
                );
            }
        }
    }

    fn assert_reconstruction(a: &[[f64; 3]; 3], svd: &Svd3, tol: f64) {
        let reconstructed = mat_mul(&mat_mul(&svd.u, &diag_mat(&svd.s)), &svd.vt);
        for row in 0..3 {
            for col in 0..3 {
                assert!(
                    (a[row][col] - reconstructed[row][col]).abs() < tol,
                    "Reconstruction A[{}][{}]: {} vs {}",
                    row,
                    col,
                    a[row][col],
                    reconstructed[row][col]
                );
            }
        }
    }

    #[test]
    fn test_identity() {
        let result = svd3(&IDENTITY);
        for &s in &result.s {
            assert!((s - 1.0).abs() < 1e-12, "Singular value {} != 1.0", s);
        }
        assert_orthogonal(&result.u, "U");
        assert_orthogonal(&result.vt, "Vt");
        assert_reconstruction(&IDENTITY, &result, 1e-12);
    }

    #[test]
    fn test_scaling_matrix() {
        let mat = [[3.0, 0.0, 0.0], [0.0, 2.0, 0.0], [0.0, 0.0, 1.0]];
        let result = svd3(&mat);
        assert!((result.s[0] - 3.0).abs() < 1e-12, "s[0]={}", result.s[0]);
        assert!((result.s[1] - 2.0).abs() < 1e-12, "s[1]={}", result.s[1]);
        assert!((result.s[2] - 1.0).abs() < 1e-12, "s[2]={}", result.s[2]);
        assert_reconstruction(&mat, &result, 1e-12);
    }

    #[test]
    fn test_negative_determinant() {
        // A reflection: a true SVD must still reconstruct it
        let mat = [[1.0, 0.0, 0.0], [0.0, 2.0, 0.0], [0.0, 0.0, -3.0]];
        let result = svd3(&mat);
        assert!((result.s[0] - 3.0).abs() < 1e-12);
        assert_orthogonal(&result.u, "U");
        assert_orthogonal(&result.vt, "Vt");
        assert_reconstruction(&mat, &result, 1e-10);
    }

    #[test]
    fn test_general_matrix() {
        let mat = [[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 10.0]];
        let result = svd3(&mat);
        assert!(result.s[0] >= result.s[1]);
        assert!(result.s[1] >= result.s[2]);
        assert_orthogonal(&result.u, "U");
        assert_orthogonal(&result.vt, "Vt");
        assert_reconstruction(&mat, &result, 1e-9);
    }

    #[test]
    fn test_zero_matrix() {
        let result = svd3(&[[0.0; 3]; 3]);
        for &s in &result.s {
            assert_eq!(s, 0.0);
        }
        assert_orthogonal(&result.u, "U");
    }

    #[test]
    fn test_rank_1_matrix() {
        let mat = [[1.0, 2.0, 3.0], [0.0, 0.0, 0.0], [0.0, 0.0, 0.0]];
        let result = svd3(&mat);
        assert!(result.s[0] > 1.0, "s[0] should be non-zero: {}", result.s[0]);
        assert!(result.s[1] < 1e-6, "s[1] should be ~zero: {}", result.s[1]);
        assert!(result.s[2] < 1e-6, "s[2] should be ~zero: {}", result.s[2]);
        assert_orthogonal(&result.u, "U");
        assert_orthogonal(&result.vt, "Vt");
        assert_reconstruction(&mat, &result, 1e-6);
    }

    #[test]
    fn test_rank_2_matrix() {
        let mat = [[1.0, 2.0, 3.0], [2.0, 4.0, 6.0], [0.0, 1.0, 1.0]];
        let result = svd3(&mat);
        assert!(result.s[2] < 1e-6);
        assert_orthogonal(&result.u, "U");
        assert_reconstruction(&mat, &result, 1e-6);
    }

    #[test]
    fn test_rank_1_completion_prefers_lowest_axis() {
        let mat = [[2.0, 0.0, 0.0], [0.0, 0.0, 0.0], [0.0, 0.0, 0.0]];
        let result = svd3(&mat);
        for row in 0..3 {
            for col in 0..3 {
                assert!(
                    (result.u[row][col] - IDENTITY[row][col]).abs() < 1e-15,
                    "U = {:?}",
                    result.u
                );
            }
        }
    }

    #[test]
    fn test_deterministic() {
        let mat = [[0.3, -1.2, 2.5], [4.1, 0.7, -0.2], [1.9, 1.1, 0.4]];
        let a = svd3(&mat);
        let b = svd3(&mat);
        assert_eq!(a.u, b.u);
        assert_eq!(a.s, b.s);
        assert_eq!(a.vt, b.vt);
    }
}
