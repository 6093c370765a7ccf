pub mod config;
pub mod snapshot;

// Re-export key types for easier use by dependent crates
pub use config::{check_probability, FireConfig, OutputConfig, SamplingMode, SimulationConfig, SweepConfig};
pub use snapshot::{FireSnapshot, SweepPoint};
