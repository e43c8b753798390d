//! Frame-to-frame alignment against a stored reference
//!
//! A [`TrajectoryAligner`] owns one reference frame and superposes incoming
//! frames onto it, removing rotational and translational jitter from an
//! animated sequence. The aligner is immutable while aligning, so one
//! instance can be shared across threads; each trajectory gets its own.

use lin_alg::f64::Vec3;
use rayon::prelude::*;

use super::kabsch::{kabsch, AlignmentResult};
use crate::linalg::cloud::{center, ensure_finite, rmsd};
use crate::AlignError;

/// Correspondences used to compute the rotation, as
/// `(frame_index, reference_index)` pairs.
///
/// The rotation and centroid offset found on these points are applied to
/// every point of the frame.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AlignmentSubset {
    pairs: Vec<(usize, usize)>,
}

impl AlignmentSubset {
    /// Same index on both sides
    pub fn from_indices(indices: &[usize]) -> Self {
        Self {
            pairs: indices.iter().map(|&i| (i, i)).collect(),
        }
    }

    pub fn from_pairs(pairs: Vec<(usize, usize)>) -> Self {
        Self { pairs }
    }

    pub fn pairs(&self) -> &[(usize, usize)] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    fn frame_points(&self, frame: &[[f64; 3]]) -> Result<Vec<[f64; 3]>, AlignError> {
        gather(frame, self.pairs.iter().map(|&(fi, _)| fi))
    }

    fn reference_points(&self, reference: &[[f64; 3]]) -> Result<Vec<[f64; 3]>, AlignError> {
        gather(reference, self.pairs.iter().map(|&(_, ri)| ri))
    }
}

fn gather(
    points: &[[f64; 3]],
    indices: impl Iterator<Item = usize>,
) -> Result<Vec<[f64; 3]>, AlignError> {
    indices
        .map(|i| {
            points.get(i).copied().ok_or(AlignError::SubsetOutOfRange {
                index: i,
                len: points.len(),
            })
        })
        .collect()
}

/// Aligns frames onto a fixed reference.
#[derive(Debug, Clone)]
pub struct TrajectoryAligner {
    reference: Vec<[f64; 3]>,
    subset: Option<AlignmentSubset>,
    /// Reference alignment points (whole cloud or subset), centered
    reference_centered: Vec<[f64; 3]>,
    /// Centroid of the reference alignment points
    reference_centroid: Vec3,
}

impl TrajectoryAligner {
    /// Align whole frames point-for-point against `reference`.
    pub fn new(reference: Vec<[f64; 3]>) -> Result<Self, AlignError> {
        let (reference_centered, reference_centroid) = prepare_reference(&reference, None)?;
        Ok(Self {
            reference,
            subset: None,
            reference_centered,
            reference_centroid,
        })
    }

    /// Compute alignment on `subset` only, moving every point of the frame.
    pub fn with_subset(reference: Vec<[f64; 3]>, subset: AlignmentSubset) -> Result<Self, AlignError> {
        let (reference_centered, reference_centroid) = prepare_reference(&reference, Some(&subset))?;
        Ok(Self {
            reference,
            subset: Some(subset),
            reference_centered,
            reference_centroid,
        })
    }

    pub fn reference(&self) -> &[[f64; 3]] {
        &self.reference
    }

    /// Centroid of the reference alignment points; aligned frames are placed here.
    pub fn reference_centroid(&self) -> Vec3 {
        self.reference_centroid
    }

    pub fn subset(&self) -> Option<&AlignmentSubset> {
        self.subset.as_ref()
    }

    /// Replace the reference. On error the previous reference is kept.
    pub fn set_reference(&mut self, reference: Vec<[f64; 3]>) -> Result<(), AlignError> {
        let (centered, centroid) = prepare_reference(&reference, self.subset.as_ref())?;
        self.reference = reference;
        self.reference_centered = centered;
        self.reference_centroid = centroid;
        Ok(())
    }

    /// Whether `frame` has the shape this aligner needs.
    pub fn is_compatible(&self, frame: &[[f64; 3]]) -> bool {
        match &self.subset {
            Some(subset) => subset.pairs.iter().all(|&(fi, _)| fi < frame.len()),
            None => frame.len() == self.reference.len(),
        }
    }

    /// Superpose `frame` onto the reference: `frameᶜ · R + centroid(reference)`.
    pub fn align(&self, frame: &[[f64; 3]]) -> Result<Vec<[f64; 3]>, AlignError> {
        self.align_with_result(frame).map(|r| r.aligned)
    }

    /// Like [`align`](Self::align), also reporting rotation, translation and
    /// the RMSD over the alignment points.
    pub fn align_with_result(&self, frame: &[[f64; 3]]) -> Result<AlignmentResult, AlignError> {
        ensure_finite(frame)?;
        let points = match &self.subset {
            Some(subset) => subset.frame_points(frame)?,
            None => {
                if frame.len() != self.reference.len() {
                    return Err(AlignError::ShapeMismatch(frame.len(), self.reference.len()));
                }
                frame.to_vec()
            }
        };

        let (frame_centered, frame_centroid) = center(&points);
        let rotation = kabsch(&frame_centered, &self.reference_centered)?;
        let fit_rmsd = rmsd(&rotation.apply_all(&frame_centered), &self.reference_centered)?;

        let rc = self.reference_centroid;
        let aligned = frame
            .iter()
            .map(|p| {
                let q = rotation.apply([
                    p[0] - frame_centroid.x,
                    p[1] - frame_centroid.y,
                    p[2] - frame_centroid.z,
                ]);
                [q[0] + rc.x, q[1] + rc.y, q[2] + rc.z]
            })
            .collect();
        let translation = rc - rotation.apply_vec3(frame_centroid);

        log::debug!(
            "aligned frame of {} points on {} pairs, RMSD {:.4}",
            frame.len(),
            points.len(),
            fit_rmsd
        );

        Ok(AlignmentResult {
            rotation,
            translation,
            aligned,
            rmsd: fit_rmsd,
        })
    }

    /// Align many frames in parallel. Fails on the first bad frame.
    pub fn align_batch(&self, frames: &[Vec<[f64; 3]>]) -> Result<Vec<Vec<[f64; 3]>>, AlignError> {
        frames.par_iter().map(|frame| self.align(frame)).collect()
    }
}

fn prepare_reference(
    reference: &[[f64; 3]],
    subset: Option<&AlignmentSubset>,
) -> Result<(Vec<[f64; 3]>, Vec3), AlignError> {
    ensure_finite(reference)?;
    let points = match subset {
        Some(subset) if subset.is_empty() => {
            return Err(AlignError::InvalidInput("alignment subset is empty".into()));
        }
        Some(subset) => subset.reference_points(reference)?,
        None => reference.to_vec(),
    };
    Ok(center(&points))
}
