use crate::grid::{Lattice, Site};
use anyhow::Result;
use lattice_common::check_probability;
use rand::Rng;
use std::collections::VecDeque;

/// One site-percolation trial: a random occupancy lattice and its cluster labels.
#[derive(Debug, Clone)]
pub struct PercolationLattice {
    occupancy: Lattice<Site>,
    /// 0 = unlabeled, otherwise the cluster id (starting at 1).
    labels: Lattice<u32>,
    num_clusters: u32,
}

impl PercolationLattice {
    /// Occupies each site independently with `probability`, drawing in row-major order.
    pub fn new<R: Rng + ?Sized>(size: usize, probability: f64, rng: &mut R) -> Result<Self> {
        check_probability("probability", probability)?;
        let occupancy = Lattice::from_fn(size, |_, _| {
            if rng.random::<f64>() < probability {
                Site::Occupied
            } else {
                Site::Unoccupied
            }
        })?;
        Ok(Self::from_occupancy(occupancy))
    }

    /// Wraps a fixed occupancy lattice, unlabeled.
    pub fn from_occupancy(occupancy: Lattice<Site>) -> Self {
        Self {
            labels: occupancy.map(|_| 0u32),
            occupancy,
            num_clusters: 0,
        }
    }

    pub fn size(&self) -> usize {
        self.occupancy.size()
    }

    pub fn occupancy(&self) -> &Lattice<Site> {
        &self.occupancy
    }

    pub fn labels(&self) -> &Lattice<u32> {
        &self.labels
    }

    /// Number of clusters found by the last `label_clusters` call (0 before labeling).
    pub fn num_clusters(&self) -> u32 {
        self.num_clusters
    }

    /// Labels every 4-connected cluster of occupied sites. Seeds are taken in
    /// row-major order and each gets the next fresh id. Calling again is a no-op.
    pub fn label_clusters(&mut self) {
        let mut next_label = self.num_clusters + 1;
        let mut queue = VecDeque::new();
        for idx in 0..self.occupancy.len() {
            if self.occupancy.cells()[idx] == Site::Occupied && self.labels.cells()[idx] == 0 {
                let (row, col) = self.occupancy.coords(idx);
                self.flood_fill(row, col, next_label, &mut queue);
                next_label += 1;
            }
        }
        self.num_clusters = next_label - 1;
    }

    // Breadth-first; any traversal order yields the same partition.
    fn flood_fill(&mut self, row: usize, col: usize, label: u32, queue: &mut VecDeque<(usize, usize)>) {
        self.labels.set(row, col, label);
        queue.push_back((row, col));

        while let Some((r, c)) = queue.pop_front() {
            for (nr, nc) in self.occupancy.neighbors(r, c) {
                if self.occupancy.get(nr, nc) == Some(Site::Occupied) && self.labels.get(nr, nc) == Some(0) {
                    self.labels.set(nr, nc, label);
                    queue.push_back((nr, nc));
                }
            }
        }
    }

    /// True if one cluster touches both the top and bottom rows, or both the left and
    /// right columns. An unlabeled lattice never spans.
    pub fn is_spanning_cluster(&self) -> bool {
        let n = self.size();
        let mut seen = vec![false; self.num_clusters as usize + 1];

        let top_bottom = self.spans(&mut seen, (0..n).map(|i| (0, i)), (0..n).map(|i| (n - 1, i)));
        seen.fill(false);
        top_bottom || self.spans(&mut seen, (0..n).map(|i| (i, 0)), (0..n).map(|i| (i, n - 1)))
    }

    fn spans(
        &self,
        seen: &mut [bool],
        first: impl Iterator<Item = (usize, usize)>,
        mut second: impl Iterator<Item = (usize, usize)>,
    ) -> bool {
        for (r, c) in first {
            match self.labels.get(r, c) {
                Some(label) if label > 0 => seen[label as usize] = true,
                _ => {}
            }
        }
        second.any(|(r, c)| match self.labels.get(r, c) {
            Some(label) if label > 0 => seen[label as usize],
            _ => false,
        })
    }

    /// Labels the lattice and reports whether it percolates.
    pub fn run(&mut self) -> bool {
        self.label_clusters();
        self.is_spanning_cluster()
    }

    /// Number of sites in each cluster, indexed by `label - 1`.
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0usize; self.num_clusters as usize];
        for &label in self.labels.cells() {
            if label > 0 {
                sizes[label as usize - 1] += 1;
            }
        }
        sizes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn from_pattern(rows: &[&str]) -> PercolationLattice {
        let rows: Vec<Vec<Site>> = rows
            .iter()
            .map(|r| r.chars().map(|c| if c == '#' { Site::Occupied } else { Site::Unoccupied }).collect())
            .collect();
        PercolationLattice::from_occupancy(Lattice::from_rows(&rows).unwrap())
    }

    #[test]
    fn rejects_invalid_probability_and_size() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(PercolationLattice::new(10, 1.2, &mut rng).is_err());
        assert!(PercolationLattice::new(10, f64::NAN, &mut rng).is_err());
        assert!(PercolationLattice::new(0, 0.5, &mut rng).is_err());
    }

    #[test]
    fn labels_follow_row_major_seed_order() {
        let mut lattice = from_pattern(&["#.#", "#..", "..#"]);
        lattice.label_clusters();
        assert_eq!(lattice.num_clusters(), 3);
        let labels = lattice.labels();
        assert_eq!(labels.get(0, 0), Some(1));
        assert_eq!(labels.get(1, 0), Some(1));
        assert_eq!(labels.get(0, 2), Some(2));
        assert_eq!(labels.get(2, 2), Some(3));
        assert_eq!(labels.get(1, 1), Some(0));
        assert_eq!(lattice.cluster_sizes(), vec![2, 1, 1]);
    }

    #[test]
    fn diagonal_sites_are_separate_clusters() {
        let mut lattice = from_pattern(&["#.", ".#"]);
        assert!(!lattice.run());
        assert_eq!(lattice.num_clusters(), 2);
    }

    #[test]
    fn winding_path_spans_top_to_bottom() {
        let mut lattice = from_pattern(&[
            "#....",
            "###..",
            "..#..",
            "..###",
            "....#",
        ]);
        assert!(lattice.run());
        assert_eq!(lattice.num_clusters(), 1);
    }

    #[test]
    fn row_spans_left_to_right() {
        let mut lattice = from_pattern(&["....", "####", "....", "#..."]);
        assert!(lattice.run());
    }

    #[test]
    fn disconnected_boundary_clusters_do_not_span() {
        let mut lattice = from_pattern(&["##..", "....", "....", "..##"]);
        assert!(!lattice.run());
    }

    #[test]
    fn unlabeled_lattice_is_not_spanning() {
        let lattice = from_pattern(&["##", "##"]);
        assert!(!lattice.is_spanning_cluster());
        assert_eq!(lattice.num_clusters(), 0);
    }

    #[test]
    fn relabeling_is_idempotent() {
        let mut lattice = from_pattern(&["#.#", "#.#", "..."]);
        lattice.label_clusters();
        let first = lattice.labels().clone();
        lattice.label_clusters();
        assert_eq!(lattice.labels(), &first);
        assert_eq!(lattice.num_clusters(), 2);
    }

    #[test]
    fn single_site_spans_iff_occupied() {
        assert!(from_pattern(&["#"]).run());
        assert!(!from_pattern(&["."]).run());
    }

    #[test]
    fn extreme_probabilities() {
        let mut rng = StdRng::seed_from_u64(3);
        for size in [1, 2, 7, 40] {
            let mut full = PercolationLattice::new(size, 1.0, &mut rng).unwrap();
            assert!(full.run());
            assert_eq!(full.num_clusters(), 1);
        }
        for size in [2, 7, 40] {
            let mut empty = PercolationLattice::new(size, 0.0, &mut rng).unwrap();
            assert!(!empty.run());
            assert_eq!(empty.num_clusters(), 0);
        }
    }
}
