//! Electrical operating limits.

use serde::{Deserialize, Serialize};

/// Nominal line-to-line voltage in volts.
pub const NOMINAL_LINE_VOLTAGE: f64 = 6600.0;
/// Lowest acceptable line-to-line voltage in volts.
pub const MIN_LINE_VOLTAGE: f64 = 6300.0;
/// Highest acceptable line-to-line voltage in volts.
pub const MAX_LINE_VOLTAGE: f64 = 6900.0;
/// Highest acceptable current leaving a substation in amperes.
pub const MAX_CURRENT: f64 = 300.0;

/// Operating limits a configuration must respect to be feasible.
///
/// All voltages are per-phase. Fields missing from a deserialized document keep their default
/// values.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Highest current magnitude allowed at a substation, for each phase.
    pub max_current: f64,
    /// Phase voltage at the substation.
    pub sending_voltage: f64,
    /// Lowest and highest phase voltage allowed at every leaf section.
    pub voltage_range: (f64, f64),
}

impl Default for Config {
    fn default() -> Self {
        let sqrt3 = 3f64.sqrt();
        Config {
            max_current: MAX_CURRENT,
            sending_voltage: NOMINAL_LINE_VOLTAGE / sqrt3,
            voltage_range: (MIN_LINE_VOLTAGE / sqrt3, MAX_LINE_VOLTAGE / sqrt3),
        }
    }
}

impl Config {
    /// Returns true if the given phase voltage magnitude is within the allowed range.
    #[inline]
    pub fn is_voltage_acceptable(&self, voltage: f64) -> bool {
        let (low, high) = self.voltage_range;
        low <= voltage && voltage <= high
    }
}
