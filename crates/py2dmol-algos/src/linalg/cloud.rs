//! Point-cloud helpers: centroid, centering, RMSD, cross-covariance

use lin_alg::f64::Vec3;

use crate::AlignError;

/// Arithmetic mean of the points. An empty cloud has its centroid at the origin.
pub fn centroid(points: &[[f64; 3]]) -> Vec3 {
    if points.is_empty() {
        return Vec3::new_zero();
    }
    let mut sum = Vec3::new_zero();
    for p in points {
        sum += Vec3::new(p[0], p[1], p[2]);
    }
    sum / points.len() as f64
}

/// Subtract the centroid from every point, returning `(centered, centroid)`.
pub fn center(points: &[[f64; 3]]) -> (Vec<[f64; 3]>, Vec3) {
    let c = centroid(points);
    let centered = points
        .iter()
        .map(|p| [p[0] - c.x, p[1] - c.y, p[2] - c.z])
        .collect();
    (centered, c)
}

/// Translate every point by `offset`
pub fn translate(points: &[[f64; 3]], offset: Vec3) -> Vec<[f64; 3]> {
    points
        .iter()
        .map(|p| [p[0] + offset.x, p[1] + offset.y, p[2] + offset.z])
        .collect()
}

/// RMSD between two equal-length coordinate sets (no superposition).
///
/// Two empty sets have an RMSD of zero.
pub fn rmsd(a: &[[f64; 3]], b: &[[f64; 3]]) -> Result<f64, AlignError> {
    if a.len() != b.len() {
        return Err(AlignError::ShapeMismatch(a.len(), b.len()));
    }
    if a.is_empty() {
        return Ok(0.0);
    }
    let sum: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(p, q)| {
            let dx = p[0] - q[0];
            let dy = p[1] - q[1];
            let dz = p[2] - q[2];
            dx * dx + dy * dy + dz * dz
        })
        .sum();
    Ok((sum / a.len() as f64).sqrt())
}

/// Fail with [`AlignError::InvalidInput`] if any coordinate is NaN or infinite.
pub fn ensure_finite(points: &[[f64; 3]]) -> Result<(), AlignError> {
    match points.iter().position(|p| !p.iter().all(|x| x.is_finite())) {
        Some(i) => Err(AlignError::InvalidInput(format!(
            "non-finite coordinate at point {}: {:?}",
            i, points[i]
        ))),
        None => Ok(()),
    }
}

/// Cross-covariance `H = aᵀ · b`: `H[j][k] = Σ_i a_i[j] · b_i[k]`.
///
/// Callers guarantee equal lengths.
pub(crate) fn cross_covariance(a: &[[f64; 3]], b: &[[f64; 3]]) -> [[f64; 3]; 3] {
    let mut h = [[0.0f64; 3]; 3];
    for (p, q) in a.iter().zip(b.iter()) {
        for j in 0..3 {
            for k in 0..3 {
                h[j][k] += p[j] * q[k];
            }
        }
    }
    h
}

/// Largest absolute coordinate of the cloud
pub(crate) fn max_abs(points: &[[f64; 3]]) -> f64 {
    points.iter().flatten().fold(0.0, |m, x| m.max(x.abs()))
}

/// Cross-covariance of `a` and `b`, each first divided by its largest
/// absolute coordinate.
///
/// The result differs from [`cross_covariance`] by a positive factor, so its
/// singular vectors are the same, but its entries stay near unit size
/// whatever the coordinate scale, and squaring them cannot overflow or
/// underflow.
pub(crate) fn scaled_cross_covariance(a: &[[f64; 3]], b: &[[f64; 3]]) -> [[f64; 3]; 3] {
    let unit = |points: &[[f64; 3]]| -> Vec<[f64; 3]> {
        let m = max_abs(points);
        if m > 0.0 {
            points.iter().map(|p| [p[0] / m, p[1] / m, p[2] / m]).collect()
        } else {
            points.to_vec()
        }
    };
    cross_covariance(&unit(a), &unit(b))
}
