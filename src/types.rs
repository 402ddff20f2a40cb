//! Dimensional-analysis-style aliases, following the teacher's convention of
//! naming scalar roles instead of passing bare `f64` around (`lib.rs`'s
//! `Utility`/`Probability`/`Entropy`).

/// A scalar trial return, from the acting player's perspective.
pub type Reward = f64;
/// A normalized probability mass.
pub type Probability = f64;
/// A Boltzmann/entropy temperature.
pub type Temperature = f64;

/// Bound required of `State`/`Action`/`Observation`: opaque domain values,
/// immutable after creation, with identity-by-value (§3).
pub trait Value: Clone + Eq + std::hash::Hash + Send + Sync + std::fmt::Debug {}
impl<T: Clone + Eq + std::hash::Hash + Send + Sync + std::fmt::Debug> Value for T {}
