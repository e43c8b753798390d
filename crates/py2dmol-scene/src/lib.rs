//! py2Dmol scene layer
//!
//! Keeps named structure objects, their frame history and the view each one
//! was given, on top of the alignment routines in `py2dmol-algos`:
//!
//! - [`Frame`] - one set of positions with optional metadata
//! - [`StructureObject`] - frames of one structure, aligned as they arrive
//! - [`ObjectRegistry`] - named objects and the active-object cursor
//! - [`AlignSettings`] - alignment behavior for new objects
//! - [`save_state`] / [`load_state`] - JSON session files
//!
//! # Example
//!
//! ```ignore
//! use py2dmol_scene::{Frame, ObjectRegistry};
//!
//! let mut registry = ObjectRegistry::new();
//! for coords in trajectory {
//!     registry.add(Frame::new(coords), Some("traj"), None)?;
//! }
//! registry.orient(None, None)?;
//! ```

mod error;
mod frame;
mod object;
mod registry;
pub mod serde_helpers;
mod session;
mod settings;

pub use error::{SceneError, SceneResult};
pub use frame::Frame;
pub use object::{ObjectView, StructureObject};
pub use registry::ObjectRegistry;
pub use session::{load_state, save_state, ObjectRecord, SessionState, SESSION_VERSION};
pub use settings::{AlignSettings, ReferencePolicy};

pub use py2dmol_algos::{AlignError, AlignmentSubset, Rotation3, Viewport};
