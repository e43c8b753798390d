//! Named structure objects and the active-object cursor

use ahash::AHashMap;
use py2dmol_algos::AlignmentSubset;

use crate::error::{SceneError, SceneResult};
use crate::frame::Frame;
use crate::object::StructureObject;
use crate::settings::AlignSettings;

/// Registry of structure objects
///
/// Objects are kept in insertion order. Frames added without an object
/// name go to the active object, which is the one most recently created
/// or added to.
#[derive(Debug, Clone, Default)]
pub struct ObjectRegistry {
    objects: AHashMap<String, StructureObject>,
    order: Vec<String>,
    active: Option<String>,
    settings: AlignSettings,
}

impl ObjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: AlignSettings) -> Self {
        Self {
            settings,
            ..Default::default()
        }
    }

    pub fn settings(&self) -> &AlignSettings {
        &self.settings
    }

    /// Settings for objects created from now on
    pub fn set_settings(&mut self, settings: AlignSettings) {
        self.settings = settings;
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.objects.contains_key(name)
    }

    /// Object names in insertion order
    pub fn names(&self) -> &[String] {
        &self.order
    }

    /// Objects in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &StructureObject> {
        self.order.iter().filter_map(|name| self.objects.get(name))
    }

    pub fn get(&self, name: &str) -> Option<&StructureObject> {
        self.objects.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut StructureObject> {
        self.objects.get_mut(name)
    }

    pub fn active_name(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn active(&self) -> Option<&StructureObject> {
        self.active.as_deref().and_then(|name| self.objects.get(name))
    }

    /// Start a new, empty object and make it active.
    ///
    /// Without a name the object is named after the current object count,
    /// skipping names already taken. An existing object with the given name
    /// is replaced, discarding its frames and alignment reference.
    pub fn new_obj(&mut self, name: Option<&str>) -> String {
        let name = match name {
            Some(name) => name.to_string(),
            None => self.generate_name(),
        };

        if self.objects.contains_key(&name) {
            log::info!("replacing object '{}'", name);
        }
        self.order.retain(|n| n != &name);
        self.order.push(name.clone());
        self.objects
            .insert(name.clone(), StructureObject::new(name.clone(), self.settings));
        self.active = Some(name.clone());
        name
    }

    fn generate_name(&self) -> String {
        let mut id = self.objects.len();
        loop {
            let name = id.to_string();
            if !self.objects.contains_key(&name) {
                return name;
            }
            id += 1;
        }
    }

    /// Add a frame, returning the object name and the frame index.
    ///
    /// A name that exists selects that object; an unknown name creates it.
    /// Without a name the frame goes to the active object, or to a new one
    /// if the registry is empty. `align` falls back to the registry setting.
    pub fn add(
        &mut self,
        frame: Frame,
        name: Option<&str>,
        align: Option<bool>,
    ) -> SceneResult<(String, usize)> {
        let target = match name {
            Some(name) if self.objects.contains_key(name) => name.to_string(),
            Some(name) => self.new_obj(Some(name)),
            None => match self.active.clone() {
                Some(active) => active,
                None => self.new_obj(None),
            },
        };
        self.active = Some(target.clone());

        let align = align.unwrap_or(self.settings.align_frames);
        let obj = self
            .objects
            .get_mut(&target)
            .ok_or_else(|| SceneError::ObjectNotFound(target.clone()))?;
        let index = obj.add_frame(frame, align)?;
        Ok((target, index))
    }

    /// Remove an object. If it was active, the last remaining object
    /// becomes active.
    pub fn remove(&mut self, name: &str) -> Option<StructureObject> {
        let removed = self.objects.remove(name)?;
        self.order.retain(|n| n != name);
        if self.active.as_deref() == Some(name) {
            self.active = self.order.last().cloned();
        }
        Some(removed)
    }

    pub fn clear(&mut self) {
        self.objects.clear();
        self.order.clear();
        self.active = None;
    }

    /// Orient an object (default: active) on one of its frames
    /// (default: the last).
    pub fn orient(&mut self, name: Option<&str>, frame: Option<usize>) -> SceneResult<()> {
        let obj = self.resolve_mut(name)?;
        let index = match frame {
            Some(index) => index,
            None if obj.is_empty() => {
                return Err(SceneError::FrameOutOfRange { index: 0, count: 0 });
            }
            None => obj.len() - 1,
        };
        obj.orient(index)
    }

    /// Set the alignment subset of an object (default: active)
    pub fn set_alignment_subset(
        &mut self,
        name: Option<&str>,
        subset: Option<AlignmentSubset>,
    ) -> SceneResult<()> {
        self.resolve_mut(name)?.set_alignment_subset(subset)
    }

    /// Insert a fully built object, e.g. one restored from a session.
    pub(crate) fn insert(&mut self, obj: StructureObject) {
        let name = obj.name().to_string();
        self.order.retain(|n| n != &name);
        self.order.push(name.clone());
        self.objects.insert(name, obj);
    }

    /// Activate `name` if it exists, else the last object
    pub(crate) fn set_active(&mut self, name: Option<String>) {
        self.active = name
            .filter(|n| self.objects.contains_key(n))
            .or_else(|| self.order.last().cloned());
    }

    fn resolve_mut(&mut self, name: Option<&str>) -> SceneResult<&mut StructureObject> {
        let name = match name {
            Some(name) => name.to_string(),
            None => self.active.clone().ok_or(SceneError::NoActiveObject)?,
        };
        self.objects
            .get_mut(&name)
            .ok_or(SceneError::ObjectNotFound(name))
    }
}
