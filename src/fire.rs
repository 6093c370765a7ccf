use crate::grid::{CellState, Lattice};
use anyhow::Result;
use lattice_common::{FireConfig, FireSnapshot, SamplingMode};
use log::{debug, trace, warn};
use rand::prelude::*;
use rand::seq::index;
use serde::Serialize;

/// Running totals for one fire run. Only reset by constructing a new simulation.
///
/// Each `advance_step` evaluates into the next lattice, so the counters run one step
/// ahead of `lattice()` and `snapshot()`: they already include the transition whose
/// result becomes current on the following `advance_step`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FireMetrics {
    /// Trees that ignited spontaneously (`fire_prob` roll).
    pub new_ignitions: u64,
    /// Trees ignited by a burning 4-neighbour.
    pub spread_ignitions: u64,
    /// Burning cells processed (each becomes empty).
    pub total_burned: u64,
    /// Completed `advance_step` calls.
    pub steps: u32,
}

/// Ping-pong lattices for the fire automaton.
#[derive(Debug)]
struct FireState {
    // Read-only during a step
    current: Lattice<CellState>,
    // Write target during a step
    next: Lattice<CellState>,
    // Cells set burning by propagation this step; their own roll is skipped.
    ignited: Vec<bool>,
    // Flat indices evaluated this step, ascending.
    evaluated: Vec<usize>,
}

impl FireState {
    fn new(initial: Lattice<CellState>) -> Self {
        let len = initial.len();
        Self {
            next: initial.clone(),
            current: initial,
            ignited: vec![false; len],
            evaluated: Vec::with_capacity(len),
        }
    }

    /// Swaps the input and output lattices. Cells a step does not evaluate must still
    /// carry over, so the new output starts as a copy of the new input.
    fn swap_buffers(&mut self) {
        std::mem::swap(&mut self.current, &mut self.next);
        self.next.copy_from(&self.current);
        self.ignited.fill(false);
    }
}

/// Forest-fire cellular automaton on a square lattice with 4-neighbour spread.
pub struct FireSimulation<R = StdRng> {
    config: FireConfig,
    state: FireState,
    /// Source of uniform [0, 1) draws for growth, ignition and subsampling.
    rng: R,
    metrics: FireMetrics,
}

impl FireSimulation<StdRng> {
    /// Builds a simulation from config. The lattice starts empty, apart from trees
    /// seeded at `initial_tree_density`, using an RNG seeded with `config.seed`.
    pub fn new(config: FireConfig) -> Result<Self> {
        config.validate()?;
        let mut rng = StdRng::seed_from_u64(config.seed);
        let density = config.initial_tree_density;
        let initial = Lattice::from_fn(config.size, |_, _| {
            if density > 0.0 && rng.random::<f64>() < density {
                CellState::Tree
            } else {
                CellState::Empty
            }
        })?;
        Self::from_lattice(config, initial, rng)
    }
}

impl<R: Rng> FireSimulation<R> {
    /// Builds a simulation over an explicit initial lattice and RNG.
    /// `config.size` must match the lattice; `initial_tree_density` and `seed` are ignored.
    pub fn from_lattice(config: FireConfig, initial: Lattice<CellState>, rng: R) -> Result<Self> {
        config.validate()?;
        if initial.size() != config.size {
            anyhow::bail!(
                "Initial lattice size {} does not match fire.size {}.",
                initial.size(),
                config.size
            );
        }
        if config.sampling == SamplingMode::Subsampled && config.size < 20 {
            warn!(
                "Subsampled mode on a {}x{} lattice evaluates a single cell per step.",
                config.size, config.size
            );
        }
        debug!("Fire simulation parameters: {:#?}", config);

        let mut state = FireState::new(initial);
        if config.sampling == SamplingMode::Full {
            state.evaluated.extend(0..state.current.len());
        }

        Ok(Self { config, state, rng, metrics: FireMetrics::default() })
    }

    pub fn config(&self) -> &FireConfig {
        &self.config
    }

    /// Number of cells evaluated per step.
    pub fn cells_per_step(&self) -> usize {
        match self.config.sampling {
            SamplingMode::Full => self.state.current.len(),
            SamplingMode::Subsampled => (self.config.size / 10).max(1),
        }
    }

    /// Advances the automaton by one timestep: swap, then evaluate the new current
    /// lattice into the next one.
    pub fn advance_step(&mut self) {
        self.state.swap_buffers();

        if self.config.sampling == SamplingMode::Subsampled {
            let amount = self.cells_per_step();
            let len = self.state.current.len();
            self.state.evaluated.clear();
            self.state
                .evaluated
                .extend(index::sample(&mut self.rng, len, amount).into_iter());
            self.state.evaluated.sort_unstable();
        }

        let FireState { current, next, ignited, evaluated } = &mut self.state;
        let cells = current.cells();
        let out = next.cells_mut();

        // Phase 1: burning cells spread to tree neighbours, then burn out.
        let mut burned = 0u64;
        let mut spread = 0u64;
        for &idx in evaluated.iter() {
            if cells[idx] != CellState::Burning {
                continue;
            }
            let (row, col) = current.coords(idx);
            for (nr, nc) in current.neighbors(row, col) {
                let Some(n) = current.index(nr, nc) else { continue };
                if cells[n] == CellState::Tree && !ignited[n] {
                    ignited[n] = true;
                    out[n] = CellState::Burning;
                    spread += 1;
                }
            }
            out[idx] = CellState::Empty;
            burned += 1;
        }

        // Phase 2: growth and spontaneous ignition for everything not already ignited.
        let mut spontaneous = 0u64;
        for &idx in evaluated.iter() {
            if ignited[idx] {
                continue;
            }
            match cells[idx] {
                CellState::Empty => {
                    if self.rng.random::<f64>() < self.config.grow_prob {
                        out[idx] = CellState::Tree;
                    }
                }
                CellState::Tree => {
                    if self.rng.random::<f64>() < self.config.fire_prob {
                        out[idx] = CellState::Burning;
                        spontaneous += 1;
                    }
                }
                CellState::Burning => {}
            }
        }

        self.metrics.total_burned += burned;
        self.metrics.spread_ignitions += spread;
        self.metrics.new_ignitions += spontaneous;
        self.metrics.steps += 1;
        trace!(
            "Fire step {}: burned {}, spread {}, spontaneous {}",
            self.metrics.steps, burned, spread, spontaneous
        );
    }

    pub fn metrics(&self) -> FireMetrics {
        self.metrics
    }

    /// The lattice snapshots and queries read from.
    pub fn lattice(&self) -> &Lattice<CellState> {
        &self.state.current
    }

    /// Per-state counts of the current lattice. `step` is the number of transitions
    /// that produced it: the first `advance_step` only swaps in a copy of the
    /// initial lattice, so it is one less than the completed step count.
    pub fn snapshot(&self) -> FireSnapshot {
        let current = &self.state.current;
        FireSnapshot {
            step: self.metrics.steps.saturating_sub(1),
            empty: current.count(CellState::Empty),
            tree: current.count(CellState::Tree),
            burning: current.count(CellState::Burning),
        }
    }

    /// Runs `config.steps` timesteps, recording one snapshot after each.
    ///
    /// The last row reflects `steps - 1` transitions while `metrics()` afterwards
    /// covers all `steps` evaluations.
    pub fn run(&mut self) -> Vec<FireSnapshot> {
        let steps = self.config.steps;
        let mut series = Vec::with_capacity(steps as usize);
        for _ in 0..steps {
            self.advance_step();
            series.push(self.snapshot());
        }
        series
    }
}
