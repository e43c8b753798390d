//! Kabsch algorithm for optimal rigid-body superposition
//!
//! Given two sets of corresponding 3D points, finds the proper rotation
//! (and, for [`superpose`], the translation) that minimizes RMSD.

use lin_alg::f64::Vec3;

use crate::linalg::cloud::{center, ensure_finite, rmsd, scaled_cross_covariance, translate};
use crate::linalg::mat3::{det3, mat_mul};
use crate::linalg::{svd3, Rotation3};
use crate::AlignError;

/// Result of a full superposition
#[derive(Debug, Clone)]
pub struct AlignmentResult {
    /// Rotation applied to the centered mobile points
    pub rotation: Rotation3,
    /// Translation applied after rotation: `p' = p · R + t`
    pub translation: Vec3,
    /// Mobile coordinates after superposition
    pub aligned: Vec<[f64; 3]>,
    /// RMSD between the fitted points and their targets
    pub rmsd: f64,
}

/// Optimal rotation taking `a` onto `b`, so that `a · R ≈ b`.
///
/// Both clouds must already be centered on their own centroids; the
/// callers need those centroids for the translation anyway. Fewer than two
/// points carry no orientation, so N = 0 and N = 1 give the identity.
/// Degenerate (collinear, coplanar) input is not an error: any minimizing
/// proper rotation is returned.
pub fn kabsch(a: &[[f64; 3]], b: &[[f64; 3]]) -> Result<Rotation3, AlignError> {
    if a.len() != b.len() {
        return Err(AlignError::ShapeMismatch(a.len(), b.len()));
    }
    ensure_finite(a)?;
    ensure_finite(b)?;
    if a.len() < 2 {
        return Ok(Rotation3::identity());
    }

    // H = aᵀ · b = U · Σ · Vᵀ, up to a positive factor
    let h = scaled_cross_covariance(a, b);
    let svd = svd3(&h);

    // d = sign(det(U · Vᵀ)); fold it into the last column of U
    let d = if det3(&svd.u) * det3(&svd.vt) < 0.0 { -1.0 } else { 1.0 };
    let mut ud = svd.u;
    for row in ud.iter_mut() {
        row[2] *= d;
    }

    // R = U · diag(1, 1, d) · Vᵀ
    let rotation = Rotation3::from_rows(mat_mul(&ud, &svd.vt));
    ensure_proper(&rotation)?;
    Ok(rotation)
}

/// Reject a decomposition that did not produce a finite proper rotation.
pub(crate) fn ensure_proper(rotation: &Rotation3) -> Result<(), AlignError> {
    let finite = rotation.m.iter().flatten().all(|x| x.is_finite());
    if !finite || (rotation.determinant() - 1.0).abs() > 1e-6 {
        return Err(AlignError::InvalidInput(format!(
            "SVD did not yield a proper rotation: {:?}",
            rotation.m
        )));
    }
    Ok(())
}

/// Superpose `mobile` onto `target` (raw, uncentered coordinates).
///
/// Returns `mobileᶜ · R + centroid(target)` together with the rotation, the
/// equivalent translation `centroid(target) − centroid(mobile) · R` and the
/// RMSD after the fit.
pub fn superpose(mobile: &[[f64; 3]], target: &[[f64; 3]]) -> Result<AlignmentResult, AlignError> {
    if mobile.len() != target.len() {
        return Err(AlignError::ShapeMismatch(mobile.len(), target.len()));
    }
    let (mobile_c, mobile_centroid) = center(mobile);
    let (target_c, target_centroid) = center(target);

    let rotation = kabsch(&mobile_c, &target_c)?;
    let aligned = translate(&rotation.apply_all(&mobile_c), target_centroid);
    let rmsd = rmsd(&aligned, target)?;
    let translation = target_centroid - rotation.apply_vec3(mobile_centroid);

    log::debug!("superposed {} points, RMSD {:.4}", mobile.len(), rmsd);

    Ok(AlignmentResult {
        rotation,
        translation,
        aligned,
        rmsd,
    })
}

/// Align coordinate set `a` onto `b`, returning only the moved coordinates.
pub fn align_a_to_b(a: &[[f64; 3]], b: &[[f64; 3]]) -> Result<Vec<[f64; 3]>, AlignError> {
    superpose(a, b).map(|r| r.aligned)
}

/// Apply a rotation + translation to coordinates: `p' = p · R + t`
pub fn apply_transform(coords: &[[f64; 3]], rotation: &Rotation3, translation: Vec3) -> Vec<[f64; 3]> {
    translate(&rotation.apply_all(coords), translation)
}
