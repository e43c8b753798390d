//! Structure objects: frame history, chosen view and per-object aligner
//!
//! The first frame added to an object is rotated into its best view and
//! becomes the alignment reference. Later frames are superposed onto that
//! reference so an animated trajectory does not tumble or drift.

use lin_alg::f64::Vec3;
use py2dmol_algos::{
    apply_transform, best_view_for, ensure_finite, AlignError, AlignmentSubset, Rotation3,
    TrajectoryAligner,
};
use serde::{Deserialize, Serialize};

use crate::error::{SceneError, SceneResult};
use crate::frame::Frame;
use crate::serde_helpers::vec3_serde;
use crate::settings::{AlignSettings, ReferencePolicy};

/// Accumulated orientation applied to an object's input coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObjectView {
    /// Product of every best-view rotation applied so far
    pub rotation: Rotation3,
    /// Pivot of the most recent orientation
    #[serde(with = "vec3_serde")]
    pub center: Vec3,
}

impl Default for ObjectView {
    fn default() -> Self {
        Self {
            rotation: Rotation3::identity(),
            center: Vec3::new_zero(),
        }
    }
}

/// A named structure and its frames
#[derive(Debug, Clone)]
pub struct StructureObject {
    name: String,
    frames: Vec<Frame>,
    view: ObjectView,
    settings: AlignSettings,
    subset: Option<AlignmentSubset>,
    aligner: Option<TrajectoryAligner>,
}

impl StructureObject {
    pub fn new(name: impl Into<String>, settings: AlignSettings) -> Self {
        Self {
            name: name.into(),
            frames: Vec::new(),
            view: ObjectView::default(),
            settings,
            subset: None,
            aligner: None,
        }
    }

    /// Rebuild an object from stored frames without moving them.
    ///
    /// The aligner reference is taken from the frame the reference policy
    /// points at: the first frame, or the last one for
    /// [`ReferencePolicy::PreviousFrame`].
    pub fn from_parts(
        name: impl Into<String>,
        settings: AlignSettings,
        frames: Vec<Frame>,
        view: ObjectView,
        subset: Option<AlignmentSubset>,
    ) -> SceneResult<Self> {
        let mut obj = Self {
            name: name.into(),
            frames,
            view,
            settings,
            subset,
            aligner: None,
        };
        for frame in &mut obj.frames {
            ensure_finite(&frame.coords)?;
            frame.drop_mismatched_metadata();
        }

        let reference = match obj.settings.reference {
            ReferencePolicy::FirstFrame => obj.frames.first(),
            ReferencePolicy::PreviousFrame => obj.frames.last(),
        };
        if let Some(reference) = reference.map(|f| f.coords.clone()) {
            obj.aligner = Some(obj.fitted_aligner(reference)?);
        }
        Ok(obj)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn view(&self) -> &ObjectView {
        &self.view
    }

    pub fn settings(&self) -> &AlignSettings {
        &self.settings
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn frame(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    /// Number of frames
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn subset(&self) -> Option<&AlignmentSubset> {
        self.subset.as_ref()
    }

    /// Coordinates incoming frames are currently aligned against
    pub fn reference(&self) -> Option<&[[f64; 3]]> {
        self.aligner.as_ref().map(|a| a.reference())
    }

    /// Append a frame, returning its index.
    ///
    /// The first frame is always put into its best view. Later frames are
    /// superposed onto the reference when `align` is set and their shape
    /// fits; frames that don't fit are stored as given. On error the object
    /// is left unchanged.
    pub fn add_frame(&mut self, mut frame: Frame, align: bool) -> SceneResult<usize> {
        ensure_finite(&frame.coords)?;
        frame.drop_mismatched_metadata();

        match self.aligner.as_mut() {
            Some(aligner) => {
                if align {
                    if aligner.is_compatible(&frame.coords) {
                        frame.coords = aligner.align(&frame.coords)?;
                    } else {
                        log::warn!(
                            "{}: frame {} has {} positions, reference has {}; storing unaligned",
                            self.name,
                            self.frames.len(),
                            frame.len(),
                            aligner.reference().len()
                        );
                    }
                }
                if self.settings.reference == ReferencePolicy::PreviousFrame {
                    if let Err(e) = aligner.set_reference(frame.coords.clone()) {
                        log::warn!("{}: keeping previous reference: {}", self.name, e);
                    }
                }
            }
            None => {
                let view = best_view_for(&frame.coords, self.settings.viewport)?;
                let aligner = self.fitted_aligner(view.coords.clone())?;
                frame.coords = view.coords;
                self.view = ObjectView {
                    rotation: view.rotation,
                    center: view.center,
                };
                self.aligner = Some(aligner);
            }
        }

        self.frames.push(frame);
        Ok(self.frames.len() - 1)
    }

    /// Align on `subset` from now on; `None` aligns on every position.
    ///
    /// Frames already stored are not moved. An out-of-range subset is
    /// rejected and the previous one kept.
    pub fn set_alignment_subset(&mut self, subset: Option<AlignmentSubset>) -> SceneResult<()> {
        if subset.as_ref().is_some_and(AlignmentSubset::is_empty) {
            return Err(AlignError::InvalidInput("alignment subset is empty".into()).into());
        }
        let previous = std::mem::replace(&mut self.subset, subset);
        if let Some(reference) = self.reference().map(<[_]>::to_vec) {
            match self.build_aligner(reference) {
                Ok(aligner) => self.aligner = Some(aligner),
                Err(e) => {
                    self.subset = previous;
                    return Err(e.into());
                }
            }
        }
        Ok(())
    }

    /// Rotate every frame into the best view of frame `index`.
    ///
    /// All frames move by the same rigid transform about that frame's
    /// centroid, so their relative alignment is preserved.
    pub fn orient(&mut self, index: usize) -> SceneResult<()> {
        let count = self.frames.len();
        let target = self
            .frames
            .get(index)
            .ok_or(SceneError::FrameOutOfRange { index, count })?;

        let view = best_view_for(&target.coords, self.settings.viewport)?;
        let translation = view.center - view.rotation.apply_vec3(view.center);

        let aligner = match self.reference() {
            Some(reference) => Some(self.build_aligner(apply_transform(
                reference,
                &view.rotation,
                translation,
            ))?),
            None => None,
        };
        for frame in &mut self.frames {
            frame.coords = apply_transform(&frame.coords, &view.rotation, translation);
        }
        self.aligner = aligner;
        self.view = ObjectView {
            rotation: self.view.rotation.then(&view.rotation),
            center: view.center,
        };

        log::info!(
            "{}: oriented on frame {} ({:.1}°)",
            self.name,
            index,
            view.rotation.angle().to_degrees()
        );
        Ok(())
    }

    /// Superpose every frame after the first onto the current reference.
    ///
    /// Runs in parallel. Frames whose shape doesn't fit the aligner are
    /// skipped. Returns the number of frames moved.
    pub fn realign_all(&mut self) -> SceneResult<usize> {
        let Some(aligner) = self.aligner.as_ref() else {
            return Ok(0);
        };

        let indices: Vec<usize> = (1..self.frames.len())
            .filter(|&i| aligner.is_compatible(&self.frames[i].coords))
            .collect();
        let batch: Vec<Vec<[f64; 3]>> = indices.iter().map(|&i| self.frames[i].coords.clone()).collect();
        let aligned = aligner.align_batch(&batch)?;

        for (i, coords) in indices.iter().zip(aligned) {
            self.frames[*i].coords = coords;
        }
        log::debug!("{}: realigned {} frames", self.name, indices.len());
        Ok(indices.len())
    }

    /// Aligner for a new reference. A subset that doesn't fit the
    /// reference is dropped with a warning and every position is used.
    fn fitted_aligner(&mut self, reference: Vec<[f64; 3]>) -> SceneResult<TrajectoryAligner> {
        match self.build_aligner(reference.clone()) {
            Err(AlignError::SubsetOutOfRange { index, len }) => {
                log::warn!(
                    "{}: alignment subset index {} out of range for {} positions; aligning on all positions",
                    self.name,
                    index,
                    len
                );
                let aligner = TrajectoryAligner::new(reference)?;
                self.subset = None;
                Ok(aligner)
            }
            other => Ok(other?),
        }
    }

    fn build_aligner(&self, reference: Vec<[f64; 3]>) -> Result<TrajectoryAligner, AlignError> {
        match &self.subset {
            Some(subset) => TrajectoryAligner::with_subset(reference, subset.clone()),
            None => TrajectoryAligner::new(reference),
        }
    }
}
