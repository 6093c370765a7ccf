use crate::percolation::PercolationLattice;
use anyhow::Result;
use lattice_common::{SweepConfig, SweepPoint};
use log::{debug, info};
use rand::prelude::*;
use rayon::prelude::*;

/// Occupation probabilities of a sweep, linearly spaced over `[p_start, p_end]`.
/// A single-value sweep uses `p_start`.
pub fn probabilities(config: &SweepConfig) -> Vec<f64> {
    let n = config.num_probabilities;
    if n == 1 {
        return vec![config.p_start];
    }
    let span = config.p_end - config.p_start;
    (0..n)
        .map(|i| {
            if i == n - 1 {
                config.p_end // Exact endpoint, no rounding drift
            } else {
                config.p_start + span * (i as f64 / (n - 1) as f64)
            }
        })
        .collect()
}

/// Fraction of `trials` fresh lattices at `p` that contain a spanning cluster.
pub fn spanning_fraction<R: Rng + ?Sized>(size: usize, p: f64, trials: u32, rng: &mut R) -> Result<f64> {
    if trials == 0 {
        anyhow::bail!("trials must be greater than 0.");
    }
    let mut spanning = 0u32;
    for _ in 0..trials {
        let mut lattice = PercolationLattice::new(size, p, rng)?;
        if lattice.run() {
            spanning += 1;
        }
    }
    Ok(spanning as f64 / trials as f64)
}

/// Runs the full Monte-Carlo sweep. Each probability value draws from its own RNG,
/// seeded in sampling order from `config.seed`, so serial and parallel runs agree.
pub fn run_sweep(config: &SweepConfig) -> Result<Vec<SweepPoint>> {
    config.validate()?;

    let mut master = StdRng::seed_from_u64(config.seed);
    let tasks: Vec<(f64, u64)> = probabilities(config)
        .into_iter()
        .map(|p| (p, master.random::<u64>()))
        .collect();

    info!(
        "Sweeping {} probabilities on a {}x{} lattice, {} trials each{}.",
        tasks.len(),
        config.lattice_size,
        config.lattice_size,
        config.trials_per_probability,
        if config.parallel {
            format!(" across {} Rayon threads", rayon::current_num_threads())
        } else {
            String::new()
        }
    );

    let evaluate = |&(p, seed): &(f64, u64)| -> Result<SweepPoint> {
        let mut rng = StdRng::seed_from_u64(seed);
        let spanning_fraction =
            spanning_fraction(config.lattice_size, p, config.trials_per_probability, &mut rng)?;
        debug!("p = {:.4}: spanning fraction {:.4}", p, spanning_fraction);
        Ok(SweepPoint { p, spanning_fraction })
    };

    // Indexed collect keeps sampling order regardless of completion order.
    if config.parallel {
        tasks.par_iter().map(evaluate).collect()
    } else {
        tasks.iter().map(evaluate).collect()
    }
}

/// Estimates the percolation threshold: the `p` at which the spanning fraction crosses
/// 0.5, linearly interpolated between the first pair of points that brackets it.
pub fn estimate_critical_probability(points: &[SweepPoint]) -> Option<f64> {
    const TARGET: f64 = 0.5;
    points.windows(2).find_map(|pair| {
        let (a, b) = (pair[0], pair[1]);
        let (lo, hi) = if a.spanning_fraction <= b.spanning_fraction {
            (a.spanning_fraction, b.spanning_fraction)
        } else {
            (b.spanning_fraction, a.spanning_fraction)
        };
        if !(lo..=hi).contains(&TARGET) {
            return None;
        }
        let rise = b.spanning_fraction - a.spanning_fraction;
        if rise == 0.0 {
            // Flat segment sitting exactly on the target
            return Some(a.p);
        }
        Some(a.p + (TARGET - a.spanning_fraction) * (b.p - a.p) / rise)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(n: usize, p_start: f64, p_end: f64) -> SweepConfig {
        SweepConfig {
            num_probabilities: n,
            lattice_size: 10,
            trials_per_probability: 20,
            p_start,
            p_end,
            seed: 11,
            parallel: false,
        }
    }

    #[test]
    fn probabilities_include_both_endpoints() {
        let ps = probabilities(&config(5, 0.05, 0.95));
        assert_eq!(ps.len(), 5);
        assert_eq!(ps[0], 0.05);
        assert_eq!(ps[4], 0.95);
        assert!((ps[2] - 0.5).abs() < 1e-12);
        assert!(ps.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn single_probability_uses_range_start() {
        assert_eq!(probabilities(&config(1, 0.3, 0.9)), vec![0.3]);
    }

    #[test]
    fn spanning_fraction_rejects_zero_trials() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(spanning_fraction(5, 0.5, 0, &mut rng).is_err());
    }

    #[test]
    fn sweep_is_monotone_at_the_extremes() {
        let points = run_sweep(&config(3, 0.0, 1.0)).unwrap();
        assert_eq!(points.len(), 3);
        assert_eq!(points[0].spanning_fraction, 0.0);
        assert_eq!(points[2].spanning_fraction, 1.0);
    }

    #[test]
    fn single_value_sweep_at_certain_occupation_with_default_range_end() {
        let mut cfg = config(1, 1.0, 0.95);
        cfg.lattice_size = 50;
        cfg.trials_per_probability = 200;
        let points = run_sweep(&cfg).unwrap();
        assert_eq!(points, vec![SweepPoint { p: 1.0, spanning_fraction: 1.0 }]);
    }

    #[test]
    fn same_seed_same_results() {
        let cfg = config(4, 0.4, 0.8);
        assert_eq!(run_sweep(&cfg).unwrap(), run_sweep(&cfg).unwrap());
    }

    #[test]
    fn critical_probability_interpolates_the_crossing() {
        let points = [
            SweepPoint { p: 0.4, spanning_fraction: 0.0 },
            SweepPoint { p: 0.5, spanning_fraction: 0.2 },
            SweepPoint { p: 0.6, spanning_fraction: 0.8 },
            SweepPoint { p: 0.7, spanning_fraction: 1.0 },
        ];
        let pc = estimate_critical_probability(&points).unwrap();
        assert!((pc - 0.55).abs() < 1e-12);
    }

    #[test]
    fn critical_probability_absent_without_crossing() {
        let points = [
            SweepPoint { p: 0.1, spanning_fraction: 0.0 },
            SweepPoint { p: 0.2, spanning_fraction: 0.1 },
        ];
        assert_eq!(estimate_critical_probability(&points), None);
        assert_eq!(estimate_critical_probability(&[]), None);
    }
}
