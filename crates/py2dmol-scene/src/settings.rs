//! Alignment settings
//!
//! One [`AlignSettings`] lives in the registry; every object created
//! afterwards takes a copy, so changing the registry settings never
//! re-aligns frames that are already stored.

use py2dmol_algos::Viewport;
use serde::{Deserialize, Serialize};

use crate::error::SceneResult;

/// Which frame later frames of an object are aligned against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferencePolicy {
    /// The object's first frame, after its best view was applied
    #[default]
    FirstFrame,
    /// The most recently stored frame
    PreviousFrame,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignSettings {
    /// Align frames after the first onto the reference
    pub align_frames: bool,
    pub reference: ReferencePolicy,
    /// Drawing surface used to pick the best view
    pub viewport: Viewport,
}

impl Default for AlignSettings {
    fn default() -> Self {
        Self {
            align_frames: true,
            reference: ReferencePolicy::FirstFrame,
            viewport: Viewport::default(),
        }
    }
}

impl AlignSettings {
    /// Parse settings from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> SceneResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> SceneResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
