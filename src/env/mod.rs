use crate::error::EnvironmentError;
use crate::types::{Reward, Value};
use rand::RngCore;
use std::collections::HashMap;

pub mod demo;

/// §4.A. States, actions, transitions, rewards, terminality. Implementors
/// are expected to be reentrant (§5); callers that cannot guarantee this
/// wrap their environment in a mutex themselves, the engine does not do it
/// for them.
///
/// In fully-observable environments `Observation = State`: the next state
/// and the observation coincide, and `observation_distribution`/
/// `sample_observation` degenerate to a point mass on `next_state`.
pub trait Environment: Send + Sync {
    type State: Value;
    type Action: Value + Ord;
    type Observation: Value;

    fn initial_state(&self) -> Self::State;
    fn is_terminal(&self, state: &Self::State) -> bool;

    /// Ordered: selection policies rely on a stable iteration order for the
    /// "first unsampled action" unexplored-first rule (§4.D.1).
    fn valid_actions(&self, state: &Self::State) -> Vec<Self::Action>;

    /// Must sum to 1. The engine does not assume this map is small, and
    /// never requires it be materialized outside of DP backups and
    /// probability-weighted transposition tests — `sample_transition` is
    /// the cheap path.
    fn transition_distribution(
        &self,
        state: &Self::State,
        action: &Self::Action,
    ) -> Result<HashMap<Self::State, f64>, EnvironmentError>;

    fn sample_transition(
        &self,
        state: &Self::State,
        action: &Self::Action,
        rng: &mut dyn RngCore,
    ) -> Result<Self::State, EnvironmentError>;

    fn observation_distribution(
        &self,
        action: &Self::Action,
        next_state: &Self::State,
    ) -> Result<HashMap<Self::Observation, f64>, EnvironmentError>;

    fn sample_observation(
        &self,
        action: &Self::Action,
        next_state: &Self::State,
        rng: &mut dyn RngCore,
    ) -> Result<Self::Observation, EnvironmentError>;

    fn reward(
        &self,
        state: &Self::State,
        action: &Self::Action,
        observation: &Self::Observation,
    ) -> Reward;
}

/// §4.F's "heuristic(state)" frontier evaluation, 0 if none supplied.
pub trait Heuristic<Env: Environment>: Send + Sync {
    fn evaluate(&self, state: &Env::State) -> Reward;
}

/// Always-zero heuristic, the engine's default when no value network or
/// rollout policy is plugged in.
pub struct ZeroHeuristic;
impl<Env: Environment> Heuristic<Env> for ZeroHeuristic {
    fn evaluate(&self, _state: &Env::State) -> Reward {
        0.0
    }
}

/// The Prior contract: PUCT/AlphaGo/RENTS consult this for `prior(a)`.
/// Returned weights are aligned by index with the `actions` slice and need
/// not be pre-normalized.
pub trait Prior<Env: Environment>: Send + Sync {
    fn prior(&self, state: &Env::State, actions: &[Env::Action]) -> Vec<f64>;
}

/// Uniform prior, the engine's default when no policy network is supplied.
pub struct UniformPrior;
impl<Env: Environment> Prior<Env> for UniformPrior {
    fn prior(&self, _state: &Env::State, actions: &[Env::Action]) -> Vec<f64> {
        let n = actions.len().max(1) as f64;
        vec![1.0 / n; actions.len()]
    }
}
