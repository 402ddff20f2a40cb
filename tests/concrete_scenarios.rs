//! §8 concrete scenarios 1, 3, 4 and 6, built only from public API. Scenarios
//! 3 and 4 isolate the exact mechanism spec.md describes (the `is_opponent`
//! read-time sign flip; Dirichlet noise applied only at the root) by driving
//! `backup_chance`/`select_action` directly with controlled inputs, instead
//! of hoping a full stochastic search converges the same way twice.

use std::sync::Arc;
use std::time::Duration;
use thts::config::{Algorithm, SearchConfig};
use thts::env::demo::{ChainEnv, ChainAction};
use thts::env::{Environment, Prior};
use thts::error::EnvironmentError;
use thts::manager::Manager;
use thts::node::DecisionNode;
use thts::policy::{BackupPolicy, SelectPolicy};
use thts::pool::Pool;
use thts::types::Reward;
use rand::RngCore;
use std::collections::HashMap;

/// Scenario 1: chain-length-10, UCT, `bias=1.0`. Across several seeds the
/// recommended first step should be `Advance` in the overwhelming majority
/// of runs (spec asks for >95% over 20 repeats; we check 8 seeds here to
/// keep the suite fast while still exercising the same claim).
#[test]
fn chain_length_10_uct_recommends_advance() {
    let seeds = [60415, 1, 2, 3, 4, 5, 6, 7];
    let mut advances = 0;
    for &seed in &seeds {
        let config = SearchConfig {
            algorithm: Algorithm::Uct,
            bias: 1.0,
            max_depth: 12,
            num_threads: 1,
            seed,
            ..Default::default()
        };
        let env = Arc::new(ChainEnv::new(10));
        let manager = Arc::new(Manager::with_defaults(config, env.clone()).unwrap());
        let root = Arc::new(DecisionNode::root(env.initial_state()));
        let pool = Pool::new(manager.clone(), root.clone(), None);
        pool.run_trials(Some(5_000), None, true);
        if root.recommend_action(&manager) == ChainAction::Advance {
            advances += 1;
        }
        pool.join();
    }
    assert!(advances >= 7, "expected Advance in almost every run, got {advances}/8");
}

/// Scenario 3 (the §8 property-6 sign mechanism): a D-node's `recommend_action`
/// reads children's DP value through its own `is_opponent` flip. Two roots
/// over the same state/children, differing only in `is_opponent`, must
/// recommend opposite actions when the children's raw DP values are
/// themselves an exact +/- pair.
#[test]
fn opponent_root_recommends_the_mirrored_action() {
    let config = SearchConfig {
        algorithm: Algorithm::Puct,
        use_dp_value: true,
        recommend_most_visited: false,
        num_threads: 1,
        ..Default::default()
    };
    let env = Arc::new(ChainEnv::new(10));
    let manager = Manager::with_defaults(config, env.clone()).unwrap();

    let mover_root = DecisionNode::new(env.initial_state(), 0, 0, false);
    let opponent_root = DecisionNode::new(env.initial_state(), 0, 0, true);

    for root in [&mover_root, &opponent_root] {
        root.visit(&manager);
        let (advance_child, _) = root.create_child(&ChainAction::Advance, &manager);
        advance_child.visit(&manager);
        manager.backup.backup_chance(&advance_child, &manager, -0.4);

        let (retreat_child, _) = root.create_child(&ChainAction::Retreat, &manager);
        retreat_child.visit(&manager);
        manager.backup.backup_chance(&retreat_child, &manager, 0.4);
    }

    // Not the opponent: argmax of the raw DP values picks Retreat (+0.4).
    assert_eq!(mover_root.recommend_action(&manager), ChainAction::Retreat);
    // The opponent: the same raw values read through `-q` pick the mirror
    // action, Advance (-(-0.4) = 0.4 is now the larger score).
    assert_eq!(opponent_root.recommend_action(&manager), ChainAction::Advance);
}

struct SkewedPrior;
impl<Env: Environment> Prior<Env> for SkewedPrior {
    fn prior(&self, _state: &Env::State, actions: &[Env::Action]) -> Vec<f64> {
        let n = actions.len().max(1);
        let mut weights = vec![0.05; n];
        let last = n - 1;
        weights[last] = 1.0 - 0.05 * (n - 1) as f64;
        weights
    }
}

/// Scenario 4: with a skewed (non-uniform) prior, a non-root D-node's
/// selection is deterministic (no noise mixed in), while the root mixes in a
/// fresh Dirichlet draw every call and so occasionally prefers a different
/// action than the prior's top pick.
#[test]
fn dirichlet_noise_only_perturbs_the_root() {
    use thts::env::demo::{FrozenLakeEnv, GridAction};

    let config = SearchConfig {
        algorithm: Algorithm::AlphaGo,
        dirichlet_noise_coeff: 0.75,
        dirichlet_noise_param: 1.0,
        num_threads: 1,
        ..Default::default()
    };
    let env = Arc::new(FrozenLakeEnv::new(8, 0.1));
    let manager = Manager::new(
        config,
        env.clone(),
        Arc::new(thts::env::ZeroHeuristic),
        Arc::new(SkewedPrior),
    )
    .unwrap();

    let root = DecisionNode::root(env.initial_state());
    let non_root = DecisionNode::new(env.initial_state(), 1, 1, false);
    root.visit(&manager);
    non_root.visit(&manager);

    let mut root_non_top = 0;
    let mut non_root_non_top = 0;
    for _ in 0..300 {
        let mut ctx = manager.new_context();
        if manager.select.select_action(&root, &manager, &mut ctx) != GridAction::Right {
            root_non_top += 1;
        }
        let mut ctx = manager.new_context();
        if manager.select.select_action(&non_root, &manager, &mut ctx) != GridAction::Right {
            non_root_non_top += 1;
        }
    }

    assert_eq!(non_root_non_top, 0, "a non-root node must not see Dirichlet noise");
    assert!(root_non_top > 0, "the root must occasionally deviate from the top prior action");
}

/// An environment whose transition takes a fixed wall-clock delay, used to
/// exercise the `max_time` budget without needing millions of trials.
#[derive(Clone)]
struct SlowEnv {
    inner: ChainEnv,
}

impl Environment for SlowEnv {
    type State = usize;
    type Action = ChainAction;
    type Observation = usize;

    fn initial_state(&self) -> Self::State {
        self.inner.initial_state()
    }

    fn is_terminal(&self, state: &Self::State) -> bool {
        self.inner.is_terminal(state)
    }

    fn valid_actions(&self, state: &Self::State) -> Vec<Self::Action> {
        self.inner.valid_actions(state)
    }

    fn transition_distribution(
        &self,
        state: &Self::State,
        action: &Self::Action,
    ) -> Result<HashMap<Self::State, f64>, EnvironmentError> {
        self.inner.transition_distribution(state, action)
    }

    fn sample_transition(
        &self,
        state: &Self::State,
        action: &Self::Action,
        rng: &mut dyn RngCore,
    ) -> Result<Self::State, EnvironmentError> {
        std::thread::sleep(Duration::from_millis(1));
        self.inner.sample_transition(state, action, rng)
    }

    fn observation_distribution(
        &self,
        action: &Self::Action,
        next_state: &Self::State,
    ) -> Result<HashMap<Self::Observation, f64>, EnvironmentError> {
        self.inner.observation_distribution(action, next_state)
    }

    fn sample_observation(
        &self,
        action: &Self::Action,
        next_state: &Self::State,
        rng: &mut dyn RngCore,
    ) -> Result<Self::Observation, EnvironmentError> {
        self.inner.sample_observation(action, next_state, rng)
    }

    fn reward(&self, state: &Self::State, action: &Self::Action, observation: &Self::Observation) -> Reward {
        self.inner.reward(state, action, observation)
    }
}

/// Scenario 6: a blocking `run_trials` with both a trial cap and a time cap
/// returns close to the time budget, and completed backups never exceed the
/// requested trial cap.
#[test]
fn budget_is_honoured_on_a_slow_environment() {
    let config = SearchConfig {
        algorithm: Algorithm::Uct,
        max_depth: 4,
        num_threads: 2,
        ..Default::default()
    };
    let env = Arc::new(SlowEnv { inner: ChainEnv::new(10) });
    let manager = Arc::new(Manager::with_defaults(config, env.clone()).unwrap());
    let root = Arc::new(DecisionNode::root(env.initial_state()));
    let pool = Pool::new(manager, root.clone(), None);

    let start = std::time::Instant::now();
    pool.run_trials(Some(100_000), Some(Duration::from_millis(200)), true);
    let elapsed = start.elapsed();

    assert!(elapsed < Duration::from_secs(2), "budget overrun: {elapsed:?}");
    assert!(pool.completed_backups() <= 100_000);
    pool.join();
}
