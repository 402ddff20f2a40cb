//! Parallel Monte-Carlo tree search over (PO)MDPs and two-player zero-sum
//! games: one concurrent tree-expansion engine shared by UCB-family
//! (UCT/PUCT/AlphaGo), softmax/entropy-family (MENTS/RENTS/TENTS/DENTS) and
//! empirical-sampling (EST) selection and backup rules.
//!
//! `Manager` owns configuration, the environment, the RNG and the
//! transposition tables; `Pool` drives worker threads that each repeatedly
//! run `trial::run_trial` against the shared `DecisionNode`/`ChanceNode`
//! graph. See `DESIGN.md` for how each module grounds in the source corpus
//! this crate was built from.

pub mod config;
pub mod env;
pub mod error;
pub mod logger;
pub mod manager;
pub mod node;
pub mod policy;
pub mod pool;
pub mod trial;
pub mod types;

pub use config::{Algorithm, SearchConfig};
pub use env::{Environment, Heuristic, Prior};
pub use error::{ConfigError, EnvironmentError, TreeInvariantError};
pub use logger::Logger;
pub use manager::Manager;
pub use node::{ChanceNode, DecisionNode};
pub use pool::Pool;

use std::sync::Arc;

/// Convenience entry point: builds a `Manager` and a fresh root, wraps them
/// in a `Pool`, matching the shape of the teacher's own `fn init()`
/// top-level constructor.
pub fn search<Env: Environment + 'static>(
    config: SearchConfig,
    env: Arc<Env>,
) -> Result<Pool<Env>, ConfigError> {
    let manager = Arc::new(Manager::with_defaults(config, env.clone())?);
    let root = Arc::new(DecisionNode::root(env.initial_state()));
    Ok(Pool::new(manager, root, None))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::demo::ChainEnv;
    use std::time::Duration;

    #[test]
    fn search_recommends_optimal_first_step_on_chain() {
        let config = SearchConfig {
            algorithm: Algorithm::Uct,
            bias: 1.0,
            max_depth: 12,
            num_threads: 1,
            seed: 60415,
            ..Default::default()
        };
        let env = Arc::new(ChainEnv::new(10));
        let pool = search(config, env).unwrap();
        pool.run_trials(Some(5_000), None, true);
        let action = pool.root().recommend_action(pool.manager());
        assert_eq!(action, crate::env::demo::ChainAction::Advance);
        pool.join();
    }

    #[test]
    fn zero_trials_recommends_without_panicking() {
        let config = SearchConfig { num_threads: 1, ..Default::default() };
        let env = Arc::new(ChainEnv::new(10));
        let pool = search(config, env).unwrap();
        pool.run_trials(Some(0), Some(Duration::from_millis(1)), true);
        let _ = pool.root().recommend_action(pool.manager());
        pool.join();
    }
}
