//! Pareto front management: dominance tracking, crowding-distance diversity,
//! hypervolume and expected-utility estimation.

use indexmap::IndexMap;
use log::{debug, warn};
use rand::Rng;

use crate::core::preference::sample_preference_vectors;

/// A non-dominated objective vector with attached run metadata.
#[derive(Clone, Debug)]
pub struct ParetoSolution {
    pub objectives: Vec<f64>,
    pub metadata: IndexMap<String, String>,
}

/// Maintains the set of mutually non-dominated objective vectors.
///
/// All objectives are minimized. Insertion is O(n) against the current front,
/// which is fine for the front sizes seen here (tens of members). Callers
/// inserting from multiple threads must serialize `add` behind a lock so that
/// the dominance check and the mutation stay atomic.
#[derive(Debug)]
pub struct ParetoFront {
    num_objectives: usize,
    solutions: Vec<ParetoSolution>,
}

impl ParetoFront {
    pub fn new(num_objectives: usize) -> Self {
        assert!(num_objectives >= 1, "need at least one objective");
        Self {
            num_objectives,
            solutions: Vec::new(),
        }
    }

    pub fn num_objectives(&self) -> usize {
        self.num_objectives
    }

    pub fn len(&self) -> usize {
        self.solutions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.solutions.is_empty()
    }

    pub fn solutions(&self) -> &[ParetoSolution] {
        &self.solutions
    }

    pub fn solution(&self, index: usize) -> &ParetoSolution {
        &self.solutions[index]
    }

    /// Checks if `u` dominates `v`: no worse in every coordinate and strictly
    /// better in at least one. A strict partial order: irreflexive, asymmetric
    /// and transitive. Equal vectors do not dominate each other.
    pub fn dominates(u: &[f64], v: &[f64]) -> bool {
        u.iter().zip(v.iter()).all(|(a, b)| a <= b) && u.iter().zip(v.iter()).any(|(a, b)| a < b)
    }

    /// Inserts a candidate outcome. Returns false if the candidate is
    /// dominated by an existing member (the front is left untouched);
    /// otherwise evicts every member the candidate dominates and inserts it.
    /// Equal vectors are mutually non-dominating and both persist.
    ///
    /// Objective values must be finite; degenerate episodes are the caller's
    /// problem to filter out before insertion.
    pub fn add(&mut self, objectives: Vec<f64>, metadata: IndexMap<String, String>) -> bool {
        assert_eq!(
            objectives.len(),
            self.num_objectives,
            "objective vector has wrong dimension"
        );
        if self
            .solutions
            .iter()
            .any(|s| Self::dominates(&s.objectives, &objectives))
        {
            return false;
        }
        self.solutions.retain(|s| !Self::dominates(&objectives, &s.objectives));
        debug!("added solution to Pareto front: {:?}", objectives);
        self.solutions.push(ParetoSolution { objectives, metadata });
        true
    }

    /// Per-member sum over each objective dimension of the normalized gap
    /// between its two neighbors when sorted along that dimension. Boundary
    /// members on each dimension get infinite distance, as does everything in
    /// a front of two or fewer members. A zero value range along a dimension
    /// contributes nothing (instead of dividing by zero).
    pub fn crowding_distance(&self) -> Vec<f64> {
        let n = self.solutions.len();
        if n <= 2 {
            return vec![f64::INFINITY; n];
        }

        let mut distances = vec![0.; n];
        for dim in 0..self.num_objectives {
            let mut order: Vec<usize> = (0..n).collect();
            order.sort_by(|a, b| {
                self.solutions[*a].objectives[dim]
                    .partial_cmp(&self.solutions[*b].objectives[dim])
                    .unwrap()
            });

            distances[order[0]] = f64::INFINITY;
            distances[order[n - 1]] = f64::INFINITY;

            let range = self.solutions[order[n - 1]].objectives[dim] - self.solutions[order[0]].objectives[dim];
            if range == 0. {
                continue;
            }
            for i in 1..n - 1 {
                let gap =
                    self.solutions[order[i + 1]].objectives[dim] - self.solutions[order[i - 1]].objectives[dim];
                distances[order[i]] += gap / range;
            }
        }
        distances
    }

    /// Picks up to `n` members from the sparsest regions of the front for
    /// further exploration. Returns (index, crowding distance) pairs; when the
    /// front is small enough, every member is returned. Ties are broken by
    /// insertion order.
    pub fn select_sparse(&self, n: usize) -> Vec<(usize, f64)> {
        let distances = self.crowding_distance();
        if self.solutions.len() <= n {
            return distances.into_iter().enumerate().collect();
        }

        let mut order: Vec<usize> = (0..distances.len()).collect();
        order.sort_by(|a, b| distances[*b].partial_cmp(&distances[*a]).unwrap());
        order.truncate(n);
        order.into_iter().map(|i| (i, distances[i])).collect()
    }

    /// Volume of objective space dominated by the front relative to a
    /// reference point (default: per-dimension front maximum scaled by 1.1).
    ///
    /// Exact for 2 and 3 objectives; returns `None` for higher dimensions
    /// rather than a silently wrong number.
    pub fn hypervolume(&self, reference_point: Option<&[f64]>) -> Option<f64> {
        if self.num_objectives != 2 && self.num_objectives != 3 {
            warn!(
                "hypervolume is not supported for {} objectives",
                self.num_objectives
            );
            return None;
        }
        if self.solutions.is_empty() {
            return Some(0.);
        }

        let reference: Vec<f64> = match reference_point {
            Some(point) => {
                assert_eq!(point.len(), self.num_objectives, "reference point has wrong dimension");
                point.to_vec()
            }
            None => (0..self.num_objectives)
                .map(|dim| {
                    self.solutions
                        .iter()
                        .map(|s| s.objectives[dim])
                        .fold(f64::NEG_INFINITY, f64::max)
                        * 1.1
                })
                .collect(),
        };

        // Only points strictly better than the reference on every axis
        // contribute volume.
        let points: Vec<Vec<f64>> = self
            .solutions
            .iter()
            .filter(|s| s.objectives.iter().zip(reference.iter()).all(|(o, r)| o < r))
            .map(|s| s.objectives.clone())
            .collect();
        if points.is_empty() {
            return Some(0.);
        }

        match self.num_objectives {
            2 => Some(Self::hypervolume_2d(&points, &reference)),
            3 => Some(Self::hypervolume_3d(&points, &reference)),
            _ => unreachable!(),
        }
    }

    /// Standard sweep: sort by the first objective and accumulate the
    /// rectangle each point adds below the running minimum of the second.
    fn hypervolume_2d(points: &[Vec<f64>], reference: &[f64]) -> f64 {
        let mut sorted = points.to_vec();
        sorted.sort_by(|a, b| {
            a[0].partial_cmp(&b[0])
                .unwrap()
                .then(a[1].partial_cmp(&b[1]).unwrap())
        });

        let mut volume = 0.;
        let mut min_y = reference[1];
        for point in &sorted {
            if point[1] < min_y {
                volume += (reference[0] - point[0]) * (min_y - point[1]);
                min_y = point[1];
            }
        }
        volume
    }

    /// Exact 3-D volume via a sweep over the third objective: between two
    /// consecutive cuts the dominated cross-section is constant and equals
    /// the 2-D hypervolume of the points at or below the lower cut.
    fn hypervolume_3d(points: &[Vec<f64>], reference: &[f64]) -> f64 {
        let mut cuts: Vec<f64> = points.iter().map(|p| p[2]).collect();
        cuts.sort_by(|a, b| a.partial_cmp(b).unwrap());
        cuts.dedup();

        let mut volume = 0.;
        for (i, &cut) in cuts.iter().enumerate() {
            let next_cut = if i + 1 < cuts.len() { cuts[i + 1] } else { reference[2] };
            let slab: Vec<Vec<f64>> = points
                .iter()
                .filter(|p| p[2] <= cut)
                .map(|p| vec![p[0], p[1]])
                .collect();
            volume += Self::hypervolume_2d(&slab, &reference[..2]) * (next_cut - cut);
        }
        volume
    }

    /// Monte-Carlo estimate of the average best-achievable scalarized utility
    /// across uniformly sampled preference vectors: for each sample, take the
    /// minimum dot product across the front and average the negation.
    /// Randomized; seed the RNG for deterministic results.
    pub fn expected_utility<R: Rng + ?Sized>(&self, n_samples: usize, rng: &mut R) -> f64 {
        if self.solutions.is_empty() || n_samples == 0 {
            return 0.;
        }

        let preferences = sample_preference_vectors(rng, n_samples, self.num_objectives);
        let mut total = 0.;
        for preference in &preferences {
            let best = self
                .solutions
                .iter()
                .map(|s| {
                    s.objectives
                        .iter()
                        .zip(preference.iter())
                        .map(|(o, w)| o * w)
                        .sum::<f64>()
                })
                .fold(f64::INFINITY, f64::min);
            total += -best;
        }
        total / n_samples as f64
    }
}
