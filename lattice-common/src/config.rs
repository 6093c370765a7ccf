use serde::{Deserialize, Serialize};
use anyhow::Result;
use std::path::Path;

/// Which cells the fire model evaluates on each timestep.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SamplingMode {
    /// Every cell is evaluated each step.
    #[default]
    Full,
    /// `max(1, size / 10)` distinct cells, drawn over the whole lattice, are evaluated
    /// each step. All other cells carry over unchanged.
    Subsampled,
}

// Configuration for the forest-fire automaton, loaded from config.toml
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct FireConfig {
    pub size: usize,
    pub steps: u32,
    pub fire_prob: f64,
    pub grow_prob: f64,
    #[serde(default)]
    pub sampling: SamplingMode,
    pub seed: u64,
    #[serde(default)]
    pub initial_tree_density: f64, // Fraction of cells seeded as trees before step 0
}

// Configuration for the percolation Monte-Carlo sweep
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SweepConfig {
    pub num_probabilities: usize,
    pub lattice_size: usize,
    pub trials_per_probability: u32,
    #[serde(default = "default_p_start")]
    pub p_start: f64,
    #[serde(default = "default_p_end")]
    pub p_end: f64,
    pub seed: u64,
    #[serde(default)]
    pub parallel: bool, // Fan probability values out over rayon
}

// Configuration for output settings
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct OutputConfig {
    pub base_filename: String,
    pub format: Option<String>, // Output format: "csv" (default) or "json"
}

// Default functions for the probability range
fn default_p_start() -> f64 {
    0.05
}

fn default_p_end() -> f64 {
    0.95
}

/// Main configuration structure, loaded from config.toml.
/// Either model section may be omitted; only the present ones are run.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SimulationConfig {
    #[serde(default)]
    pub fire: Option<FireConfig>,
    #[serde(default)]
    pub sweep: Option<SweepConfig>,
    pub output: OutputConfig,
}

/// Rejects probabilities outside [0, 1], NaN included.
pub fn check_probability(name: &str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        anyhow::bail!("{} must be within [0, 1], got {}.", name, value);
    }
    Ok(())
}

impl FireConfig {
    pub fn validate(&self) -> Result<()> {
        if self.size == 0 {
            anyhow::bail!("fire.size must be greater than 0.");
        }
        if self.steps == 0 {
            anyhow::bail!("fire.steps must be greater than 0.");
        }
        check_probability("fire.fire_prob", self.fire_prob)?;
        check_probability("fire.grow_prob", self.grow_prob)?;
        check_probability("fire.initial_tree_density", self.initial_tree_density)?;
        Ok(())
    }
}

impl SweepConfig {
    pub fn validate(&self) -> Result<()> {
        if self.num_probabilities == 0 {
            anyhow::bail!("sweep.num_probabilities must be greater than 0.");
        }
        if self.lattice_size == 0 {
            anyhow::bail!("sweep.lattice_size must be greater than 0.");
        }
        if self.trials_per_probability == 0 {
            anyhow::bail!("sweep.trials_per_probability must be greater than 0.");
        }
        check_probability("sweep.p_start", self.p_start)?;
        check_probability("sweep.p_end", self.p_end)?;
        // A single-value sweep only samples p_start.
        if self.num_probabilities > 1 && self.p_start > self.p_end {
            anyhow::bail!(
                "sweep.p_start ({}) must not exceed sweep.p_end ({}).",
                self.p_start,
                self.p_end
            );
        }
        Ok(())
    }
}

impl SimulationConfig {
    /// Loads the simulation configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        let config_str = std::fs::read_to_string(path_ref)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path_ref.display(), e))?;
        let config = Self::from_toml_str(&config_str)
            .map_err(|e| anyhow::anyhow!("Invalid config '{}': {}", path_ref.display(), e))?;
        Ok(config)
    }

    /// Parses and validates a configuration held in memory.
    pub fn from_toml_str(config_str: &str) -> Result<Self> {
        let config: SimulationConfig = toml::from_str(config_str)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(fire) = &self.fire {
            fire.validate()?;
        }
        if let Some(sweep) = &self.sweep {
            sweep.validate()?;
        }
        if self.output.base_filename.is_empty() {
            anyhow::bail!("output.base_filename must not be empty.");
        }
        match self.output.format.as_deref() {
            None | Some("csv") | Some("json") => Ok(()),
            Some(other) => anyhow::bail!("Unknown output format '{}'. Expected \"csv\" or \"json\".", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_CONFIG: &str = r#"
[fire]
size = 100
steps = 500
fire_prob = 0.001
grow_prob = 0.01
sampling = "subsampled"
seed = 42

[sweep]
num_probabilities = 30
lattice_size = 200
trials_per_probability = 100
seed = 7

[output]
base_filename = "results"
"#;

    #[test]
    fn parses_full_config_with_defaults() {
        let config = SimulationConfig::from_toml_str(FULL_CONFIG).unwrap();
        let fire = config.fire.unwrap();
        assert_eq!(fire.size, 100);
        assert_eq!(fire.sampling, SamplingMode::Subsampled);
        assert_eq!(fire.initial_tree_density, 0.0);

        let sweep = config.sweep.unwrap();
        assert_eq!(sweep.p_start, 0.05);
        assert_eq!(sweep.p_end, 0.95);
        assert!(!sweep.parallel);
        assert!(config.output.format.is_none());
    }

    #[test]
    fn model_sections_are_optional() {
        let config = SimulationConfig::from_toml_str("[output]\nbase_filename = \"out\"\n").unwrap();
        assert!(config.fire.is_none());
        assert!(config.sweep.is_none());
    }

    #[test]
    fn rejects_out_of_range_probability() {
        let bad = FULL_CONFIG.replace("fire_prob = 0.001", "fire_prob = 1.5");
        let err = SimulationConfig::from_toml_str(&bad).unwrap_err();
        assert!(err.to_string().contains("fire.fire_prob"));
    }

    #[test]
    fn rejects_zero_trials() {
        let bad = FULL_CONFIG.replace("trials_per_probability = 100", "trials_per_probability = 0");
        assert!(SimulationConfig::from_toml_str(&bad).is_err());
    }

    #[test]
    fn rejects_inverted_range() {
        let sweep = SweepConfig {
            num_probabilities: 3,
            lattice_size: 10,
            trials_per_probability: 5,
            p_start: 0.8,
            p_end: 0.2,
            seed: 1,
            parallel: false,
        };
        assert!(sweep.validate().is_err());
    }

    #[test]
    fn single_value_sweep_ignores_range_end() {
        let config = SimulationConfig::from_toml_str(
            "[sweep]\nnum_probabilities = 1\nlattice_size = 50\ntrials_per_probability = 200\np_start = 1.0\nseed = 1\n\n[output]\nbase_filename = \"out\"\n",
        )
        .unwrap();
        let sweep = config.sweep.unwrap();
        assert_eq!(sweep.p_start, 1.0);
        assert_eq!(sweep.p_end, 0.95);
    }

    #[test]
    fn rejects_nan_probability() {
        assert!(check_probability("p", f64::NAN).is_err());
        assert!(check_probability("p", 0.0).is_ok());
        assert!(check_probability("p", 1.0).is_ok());
    }

    #[test]
    fn rejects_unknown_output_format() {
        let bad = FULL_CONFIG.replace("base_filename = \"results\"", "base_filename = \"results\"\nformat = \"xml\"");
        assert!(SimulationConfig::from_toml_str(&bad).is_err());
    }
}
