//! Monte-Carlo lattice models: a forest-fire cellular automaton and site percolation
//! with a probability sweep driver.

pub mod fire;
pub mod grid;
pub mod output;
pub mod percolation;
pub mod sweep;

pub use fire::{FireMetrics, FireSimulation};
pub use grid::{CellState, Lattice, Site};
pub use percolation::PercolationLattice;
pub use sweep::{estimate_critical_probability, probabilities, run_sweep};
