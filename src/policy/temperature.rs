//! §4.E.4: decayed-temperature math. Kept as free functions over `f64`
//! rather than a trait-object schedule, matching the spec's closed formulas
//! exactly — there is nothing to dispatch on at runtime once `DecayFn` is
//! known.

use crate::config::DecayFn;
use crate::types::Temperature;

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

pub fn schedule(kind: DecayFn, n_hat: f64) -> f64 {
    match kind {
        DecayFn::NoDecay => 1.0,
        DecayFn::InvSqrt => 1.0 / (1.0 + n_hat).sqrt(),
        DecayFn::InvLog => 1.0 / (std::f64::consts::E + n_hat).ln(),
        DecayFn::Sigmoid => 2.0 * sigmoid(-n_hat),
    }
}

/// `T = max(T_min, T_init * schedule(visits / visits_scale))`.
pub fn temperature(
    kind: DecayFn,
    t_init: f64,
    t_min: f64,
    visits: u64,
    visits_scale: f64,
) -> Temperature {
    let n_hat = if visits_scale > 0.0 {
        visits as f64 / visits_scale
    } else {
        visits as f64
    };
    (t_init * schedule(kind, n_hat)).max(t_min)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_decay_is_constant() {
        assert_eq!(schedule(DecayFn::NoDecay, 0.0), 1.0);
        assert_eq!(schedule(DecayFn::NoDecay, 1e9), 1.0);
    }

    #[test]
    fn inv_sqrt_decreases_with_visits() {
        let a = schedule(DecayFn::InvSqrt, 0.0);
        let b = schedule(DecayFn::InvSqrt, 100.0);
        assert!(a > b);
    }

    #[test]
    fn temperature_floors_at_min() {
        let t = temperature(DecayFn::InvSqrt, 1.0, 0.2, 1_000_000, 1.0);
        assert!((t - 0.2).abs() < 1e-9);
    }
}
