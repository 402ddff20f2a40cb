//! AlphaGo root noise (§4.D.1): `prior' = (1-α)·prior + α·η`,
//! `η ~ Dir(β,…,β)`. Rather than the source's Go-specific
//! `β = 0.03·B²/|A|` (board-edge dependent, meaningless for a generic
//! `Environment`), `β` is the run-level `dirichlet_noise_param` applied
//! uniformly across the action count — see DESIGN.md.

use rand::Rng;
use rand_distr::{Distribution, Gamma};

/// Draws one sample from `Dir(beta, ..., beta)` over `n` categories using
/// the standard ratio-of-independent-gammas construction.
pub fn sample_dirichlet(n: usize, beta: f64, rng: &mut impl Rng) -> Vec<f64> {
    if n == 0 {
        return Vec::new();
    }
    let beta = beta.max(1e-6);
    let gamma = Gamma::new(beta, 1.0).expect("beta > 0");
    let draws: Vec<f64> = (0..n).map(|_| gamma.sample(rng)).collect();
    let total: f64 = draws.iter().sum();
    if total <= 0.0 {
        return vec![1.0 / n as f64; n];
    }
    draws.into_iter().map(|d| d / total).collect()
}

pub fn mix(prior: &[f64], noise: &[f64], coeff: f64) -> Vec<f64> {
    prior
        .iter()
        .zip(noise.iter())
        .map(|(p, e)| (1.0 - coeff) * p + coeff * e)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn sums_to_one() {
        let mut rng = StdRng::seed_from_u64(3);
        let noise = sample_dirichlet(5, 0.03, &mut rng);
        let total: f64 = noise.iter().sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn mix_preserves_simplex() {
        let prior = vec![0.25, 0.25, 0.25, 0.25];
        let mut rng = StdRng::seed_from_u64(4);
        let noise = sample_dirichlet(4, 0.03, &mut rng);
        let mixed = mix(&prior, &noise, 0.25);
        let total: f64 = mixed.iter().sum();
        assert!((total - 1.0).abs() < 1e-9);
    }
}
