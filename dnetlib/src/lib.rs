//! # Distribution Network Evaluation Library
//!
//! Enumerates the radial switch configurations of a power distribution network that satisfy the
//! electrical operating limits, and finds the configuration with minimum resistive loss.
//!
//! Typical use:
//! ```no_run
//! use dnetlib::network::Network;
//!
//! let network = Network::read_from_file("networks/mesh.yaml").unwrap();
//! let configs = network.enumerate().unwrap();
//! let result = network.optimize(&configs).unwrap();
//! println!("{} {:?}", result.minimum_loss, result.open_switches);
//! ```

use serde::{Deserialize, Serialize};

pub mod config;
pub mod configset;
pub mod io;
pub mod network;
pub mod types;
pub mod utils;
pub mod zdd;

pub use config::Config;
pub use configset::ConfigSet;
pub use network::{Configuration, Network, OptimizationResult};

#[cfg(not(feature = "hashbrown"))]
pub(crate) use std::collections::HashMap;

#[cfg(feature = "hashbrown")]
pub(crate) use hashbrown::HashMap;

/// Represents the reasons why an evaluation attempt might fail.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", content = "content")]
pub enum DnetError {
    /// The network description or a query refers to something that does not exist or cannot be
    /// interpreted.
    BadInput(String),
    /// The topology, the decomposition or a decision diagram violates a structural invariant.
    Structural(String),
}

impl std::error::Error for DnetError {}

impl std::fmt::Display for DnetError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            DnetError::BadInput(reason) => write!(f, "Bad input: {}", reason),
            DnetError::Structural(reason) => write!(f, "Structural error: {}", reason),
        }
    }
}
