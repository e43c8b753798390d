//! Error types for the scene crate

use py2dmol_algos::AlignError;
use thiserror::Error;

/// Scene-related errors
#[derive(Debug, Error)]
pub enum SceneError {
    /// Object not found in registry
    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    /// An operation needed an active object but none exists
    #[error("No active object")]
    NoActiveObject,

    /// Invalid frame index
    #[error("Invalid frame index: {index} (object has {count} frames)")]
    FrameOutOfRange { index: usize, count: usize },

    /// Alignment failure
    #[error(transparent)]
    Align(#[from] AlignError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Session (de)serialization error
    #[error("Session format error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for scene operations
pub type SceneResult<T> = Result<T, SceneError>;
