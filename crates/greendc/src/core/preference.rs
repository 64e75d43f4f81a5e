//! Uniform sampling of preference vectors from the probability simplex.

use rand::Rng;
use rand_distr::{Dirichlet, Distribution};

/// Draws `n_vectors` weight vectors uniformly from the probability simplex of
/// dimension `n_objectives`: coordinates are non-negative and sum to one.
///
/// Uses a symmetric Dirichlet distribution with all concentration parameters
/// equal to one, which is exactly uniform over the simplex. Stateless; the
/// caller supplies the RNG, so seeded runs are reproducible.
pub fn sample_preference_vectors<R: Rng + ?Sized>(
    rng: &mut R,
    n_vectors: usize,
    n_objectives: usize,
) -> Vec<Vec<f64>> {
    assert!(n_objectives >= 1, "need at least one objective");
    if n_objectives == 1 {
        return vec![vec![1.]; n_vectors];
    }
    let dirichlet = Dirichlet::new(&vec![1.; n_objectives]).unwrap();
    (0..n_vectors).map(|_| dirichlet.sample(rng)).collect()
}
