//! JSON session files
//!
//! A session stores every object with its frames, metadata, view and
//! alignment subset. Loading puts frames back exactly as saved; nothing is
//! re-aligned or re-oriented.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use py2dmol_algos::AlignmentSubset;
use serde::{Deserialize, Serialize};

use crate::error::SceneResult;
use crate::frame::Frame;
use crate::object::{ObjectView, StructureObject};
use crate::registry::ObjectRegistry;
use crate::serde_helpers::version_serde;
use crate::settings::AlignSettings;

/// Session format version written by [`save_state`]
pub const SESSION_VERSION: &str = "2.0";

/// Serializable snapshot of an [`ObjectRegistry`]
///
/// Unknown keys (such as a viewer `config` block) are ignored on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(default = "default_version", deserialize_with = "version_serde::deserialize")]
    pub version: String,
    #[serde(default)]
    pub settings: AlignSettings,
    #[serde(default, rename = "current_object", alias = "active")]
    pub active: Option<String>,
    #[serde(default)]
    pub objects: Vec<ObjectRecord>,
}

fn default_version() -> String {
    SESSION_VERSION.to_string()
}

/// One object inside a [`SessionState`]
///
/// `chains` and `position_types` shared by every frame are stored once
/// here and left out of the frames; a frame without its own array takes
/// the object-level one on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub frames: Vec<Frame>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chains: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_types: Option<Vec<String>>,
    #[serde(default)]
    pub view: ObjectView,
    #[serde(default)]
    pub settings: AlignSettings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subset: Option<AlignmentSubset>,
}

impl ObjectRecord {
    fn from_object(obj: &StructureObject) -> Self {
        let mut frames = obj.frames().to_vec();
        let chains = hoist_shared(&mut frames, chains_of);
        let position_types = hoist_shared(&mut frames, position_types_of);
        Self {
            name: obj.name().to_string(),
            frames,
            chains,
            position_types,
            view: *obj.view(),
            settings: *obj.settings(),
            subset: obj.subset().cloned(),
        }
    }

    /// Frames with coordinates, object-level arrays filled in
    fn into_frames(self) -> Vec<Frame> {
        let total = self.frames.len();
        let frames: Vec<Frame> = self
            .frames
            .into_iter()
            .filter(|f| !f.is_empty())
            .map(|mut f| {
                if f.chains.is_none() {
                    f.chains = self.chains.clone();
                }
                if f.position_types.is_none() {
                    f.position_types = self.position_types.clone();
                }
                f
            })
            .collect();
        if frames.len() < total {
            log::warn!(
                "{}: skipping {} frames without coordinates",
                self.name,
                total - frames.len()
            );
        }
        frames
    }
}

fn chains_of(frame: &mut Frame) -> &mut Option<Vec<String>> {
    &mut frame.chains
}

fn position_types_of(frame: &mut Frame) -> &mut Option<Vec<String>> {
    &mut frame.position_types
}

/// Move a field out of the frames when every frame that has it agrees.
fn hoist_shared<T: Clone + PartialEq>(
    frames: &mut [Frame],
    field: fn(&mut Frame) -> &mut Option<T>,
) -> Option<T> {
    let shared = frames.iter_mut().find_map(|f| field(f).clone())?;
    if !frames
        .iter_mut()
        .all(|f| field(f).as_ref().map_or(true, |v| *v == shared))
    {
        return None;
    }
    for frame in frames.iter_mut() {
        *field(frame) = None;
    }
    Some(shared)
}

fn major_version(version: &str) -> Option<u32> {
    version.split('.').next()?.trim().parse().ok()
}

impl SessionState {
    pub fn from_registry(registry: &ObjectRegistry) -> Self {
        Self {
            version: SESSION_VERSION.to_string(),
            settings: *registry.settings(),
            active: registry.active_name().map(str::to_string),
            objects: registry.iter().map(ObjectRecord::from_object).collect(),
        }
    }

    /// Rebuild a registry.
    ///
    /// Frames without coordinates are skipped, and so are objects left
    /// without a name or without frames. If the saved active object is
    /// missing, the last restored object becomes active.
    pub fn into_registry(self) -> SceneResult<ObjectRegistry> {
        if major_version(&self.version).map_or(true, |v| v > 2) {
            log::warn!(
                "session version {} is not supported (expected {}); loading anyway",
                self.version,
                SESSION_VERSION
            );
        }

        let mut registry = ObjectRegistry::with_settings(self.settings);
        for record in self.objects {
            if record.name.is_empty() {
                log::warn!("skipping unnamed object in session");
                continue;
            }
            let (name, settings, view, subset) =
                (record.name.clone(), record.settings, record.view, record.subset.clone());
            let frames = record.into_frames();
            if frames.is_empty() {
                log::warn!("{}: skipping object without frames", name);
                continue;
            }
            registry.insert(StructureObject::from_parts(name, settings, frames, view, subset)?);
        }
        registry.set_active(self.active);

        log::info!("restored {} objects", registry.len());
        Ok(registry)
    }

    pub fn to_json(&self) -> SceneResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> SceneResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Write the registry to a JSON session file.
pub fn save_state(registry: &ObjectRegistry, path: &Path) -> SceneResult<()> {
    let state = SessionState::from_registry(registry);
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(&mut writer, &state)?;
    writer.flush()?;
    log::info!("saved {} objects to {}", state.objects.len(), path.display());
    Ok(())
}

/// Read a JSON session file into a fresh registry.
pub fn load_state(path: &Path) -> SceneResult<ObjectRegistry> {
    let reader = BufReader::new(File::open(path)?);
    let state: SessionState = serde_json::from_reader(reader)?;
    state.into_registry()
}
