use serde::{Serialize, Deserialize};

/// Cell counts of the fire lattice after a given number of timesteps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FireSnapshot {
    /// Number of completed timesteps when the counts were taken.
    pub step: u32,
    pub empty: usize,
    pub tree: usize,
    pub burning: usize,
}

impl FireSnapshot {
    /// Total number of cells counted.
    pub fn total(&self) -> usize {
        self.empty + self.tree + self.burning
    }
}

/// Empirical spanning probability for one occupation probability of a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SweepPoint {
    /// Site occupation probability.
    pub p: f64,
    /// Fraction of trials that produced a spanning cluster.
    pub spanning_fraction: f64,
}
