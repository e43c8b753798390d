//! A single set of positions plus optional per-position metadata

use serde::{Deserialize, Serialize};

/// One frame of a structure
///
/// Metadata arrays are optional. When present they must have one entry per
/// position; [`Frame::drop_mismatched_metadata`] discards any that don't.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub coords: Vec<[f64; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plddts: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chains: Option<Vec<String>>,
    /// Per-position residue class (protein, nucleic acid, ligand, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_types: Option<Vec<String>>,
    /// Per-position residue or atom name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_names: Option<Vec<String>>,
    /// Per-position residue sequence number as given in the source file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub residue_numbers: Option<Vec<i64>>,
}

impl Frame {
    pub fn new(coords: Vec<[f64; 3]>) -> Self {
        Self {
            coords,
            ..Default::default()
        }
    }

    pub fn with_plddts(mut self, plddts: Vec<f64>) -> Self {
        self.plddts = Some(plddts);
        self
    }

    pub fn with_chains(mut self, chains: Vec<String>) -> Self {
        self.chains = Some(chains);
        self
    }

    pub fn with_position_types(mut self, position_types: Vec<String>) -> Self {
        self.position_types = Some(position_types);
        self
    }

    pub fn with_position_names(mut self, position_names: Vec<String>) -> Self {
        self.position_names = Some(position_names);
        self
    }

    pub fn with_residue_numbers(mut self, residue_numbers: Vec<i64>) -> Self {
        self.residue_numbers = Some(residue_numbers);
        self
    }

    /// Number of positions
    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// Drop metadata arrays whose length differs from the position count.
    ///
    /// Returns the number of arrays dropped.
    pub fn drop_mismatched_metadata(&mut self) -> usize {
        let n = self.coords.len();
        [
            drop_if_mismatched(&mut self.plddts, n, "plDDT"),
            drop_if_mismatched(&mut self.chains, n, "chain"),
            drop_if_mismatched(&mut self.position_types, n, "position type"),
            drop_if_mismatched(&mut self.position_names, n, "position name"),
            drop_if_mismatched(&mut self.residue_numbers, n, "residue number"),
        ]
        .into_iter()
        .filter(|&dropped| dropped)
        .count()
    }
}

fn drop_if_mismatched<T>(field: &mut Option<Vec<T>>, n: usize, what: &str) -> bool {
    match field.as_ref().map(Vec::len) {
        Some(len) if len != n => {
            log::warn!("{what} length ({len}) does not match coordinate count ({n}); ignoring {what}s");
            *field = None;
            true
        }
        _ => false,
    }
}
