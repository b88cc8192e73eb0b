//! Input output module.
//!
//! Contains structs to serialize and deserialize network descriptions.
use crate::types::*;

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

pub mod fukui_tepco;

#[cfg(test)]
mod tests;

/// Electrical data of a single section.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SectionData {
    /// Real and imaginary parts of the load of each phase: `[re_u, im_u, re_v, im_v, re_w, im_w]`.
    pub load: [f64; 2 * NUM_PHASES],
    /// Real and imaginary parts of the impedance of each phase, laid out like `load`.
    pub impedance: [f64; 2 * NUM_PHASES],
    /// True if this section is fed by a substation.
    #[serde(default)]
    pub substation: bool,
}

impl SectionData {
    /// Complex load of each phase.
    pub fn load_phases(&self) -> PhaseValues {
        to_phases(&self.load)
    }

    /// Complex impedance of each phase.
    pub fn impedance_phases(&self) -> PhaseValues {
        to_phases(&self.impedance)
    }
}

fn to_phases(values: &[f64; 2 * NUM_PHASES]) -> PhaseValues {
    let mut out = ZERO_PHASES;
    for (i, phase) in out.iter_mut().enumerate() {
        *phase = Complex64::new(values[2 * i], values[2 * i + 1]);
    }
    out
}

/// YAML representation of a distribution network.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NetworkDocument {
    /// Each node is the list of switches and sections meeting at one physical point.
    pub nodes: Vec<Vec<String>>,
    /// Switch identifiers. The order of this list is the decision order.
    pub switches: Vec<String>,
    /// Section identifiers and their electrical data.
    pub sections: BTreeMap<String, SectionData>,
}

impl NetworkDocument {
    /// Parse a network document from YAML.
    pub fn from_yaml(content: &str) -> Result<NetworkDocument, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }

    /// Serialize this document to YAML.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    /// Read a network document from a YAML file.
    pub fn read_from_file<P: AsRef<Path>>(path: P) -> std::io::Result<NetworkDocument> {
        let content = std::fs::read_to_string(&path)?;
        NetworkDocument::from_yaml(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Number of substation sections.
    pub fn substation_count(&self) -> usize {
        self.sections.values().filter(|s| s.substation).count()
    }
}
