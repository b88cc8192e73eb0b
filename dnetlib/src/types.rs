//! Primitive data types.

use num_complex::Complex64;

/// Data type for switch indices, positions in the decision order.
pub type SwitchIndex = usize;
/// Data type for section indices, positions in the name order.
pub type SectionIndex = usize;
/// Data type for dual graph vertices, numbered from 1.
pub type Vertex = usize;
/// Data type for dual graph edges, always stored with the smaller vertex first.
pub type Edge = (Vertex, Vertex);
/// Data type for resistive power loss.
pub type Loss = f64;

/// Number of phases of the distribution system.
pub const NUM_PHASES: usize = 3;

/// One value for each phase.
pub type Phases<T> = [T; NUM_PHASES];

/// Per-phase complex quantity such as load, current or impedance.
pub type PhaseValues = Phases<Complex64>;

/// Per-phase zero.
pub const ZERO_PHASES: PhaseValues = [Complex64::new(0.0, 0.0); NUM_PHASES];
