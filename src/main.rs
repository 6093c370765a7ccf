use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::time::Instant;
use log::{info, warn, debug};

use lattice_common::{FireConfig, SimulationConfig, SweepConfig};
use lattice_sim::output::{self, OutputFormat};
use lattice_sim::{estimate_critical_probability, run_sweep, FireSimulation};

/// Forest-fire and percolation Monte-Carlo runs driven by a TOML config.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the simulation configuration file
    #[arg(default_value = "config.toml")]
    config: PathBuf,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize the logger
    env_logger::init();

    info!("Starting Lattice Simulation Engine...");

    // --- Load Configuration ---
    let config = SimulationConfig::load(&args.config)?;
    let format = OutputFormat::from_config(config.output.format.as_deref())?;
    debug!("Configuration: {:#?}", config);

    if config.fire.is_none() && config.sweep.is_none() {
        warn!("'{}' has neither a [fire] nor a [sweep] section. Nothing to run.", args.config.display());
    }

    if let Some(fire) = &config.fire {
        run_fire(fire, &config.output.base_filename, format)?;
    }
    if let Some(sweep) = &config.sweep {
        run_percolation(sweep, &config.output.base_filename, format)?;
    }

    info!("Simulation Complete.");
    Ok(())
}

fn run_fire(config: &FireConfig, base_filename: &str, format: OutputFormat) -> Result<()> {
    info!(
        "Forest fire: {}x{} lattice, {} steps, fire_prob {}, grow_prob {}, {:?} sampling.",
        config.size, config.size, config.steps, config.fire_prob, config.grow_prob, config.sampling
    );
    let mut sim = FireSimulation::new(config.clone())?;

    let start_time = Instant::now();
    let series = sim.run();
    let metrics = sim.metrics();
    info!(
        "Fire run finished in {:.3} s | totals over {} evaluations, one past the last saved row | spontaneous ignitions: {} | spread ignitions: {} | burned: {}",
        start_time.elapsed().as_secs_f64(),
        metrics.steps,
        metrics.new_ignitions,
        metrics.spread_ignitions,
        metrics.total_burned
    );

    output::save_fire_series(base_filename, format, &series)?;
    Ok(())
}

fn run_percolation(config: &SweepConfig, base_filename: &str, format: OutputFormat) -> Result<()> {
    let start_time = Instant::now();
    let points = run_sweep(config)?;
    info!("Sweep finished in {:.3} s.", start_time.elapsed().as_secs_f64());

    match estimate_critical_probability(&points) {
        Some(p_c) => info!("Estimated critical probability: {:.4}", p_c),
        None => warn!("Spanning fraction never crosses 0.5 in the sampled range; no critical probability estimate."),
    }

    output::save_sweep(base_filename, format, &points)?;
    Ok(())
}
