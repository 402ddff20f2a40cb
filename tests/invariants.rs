//! §8 testable properties 1, 2 and 4, driven only through the crate's public
//! surface (`Pool`/`Manager`/`DecisionNode`/`ShardedMap`).

use std::sync::Arc;
use std::time::Duration;
use thts::config::{Algorithm, SearchConfig};
use thts::env::demo::ChainEnv;
use thts::manager::Manager;
use thts::node::DecisionNode;
use thts::pool::Pool;

/// Property 1: at quiescence (no trials in flight), every visited node has
/// `b == n`.
#[test]
fn backups_equal_visits_at_quiescence() {
    let config = SearchConfig {
        algorithm: Algorithm::Uct,
        max_depth: 12,
        num_threads: 4,
        seed: 17,
        ..Default::default()
    };
    let env = Arc::new(ChainEnv::new(10));
    let manager = Arc::new(Manager::with_defaults(config, env.clone()).unwrap());
    let root = Arc::new(DecisionNode::root(env.initial_state()));
    let pool = Pool::new(manager, root.clone(), None);

    pool.run_trials(Some(2_000), None, true);
    pool.join();

    assert_eq!(root.get_num_backups(), root.get_num_visits());
}

/// Property 2: a D-node's children see at most as many visits as the node
/// itself.
#[test]
fn child_visits_never_exceed_parent_visits() {
    let config = SearchConfig {
        algorithm: Algorithm::Uct,
        max_depth: 12,
        num_threads: 4,
        seed: 23,
        ..Default::default()
    };
    let env = Arc::new(ChainEnv::new(10));
    let manager = Arc::new(Manager::with_defaults(config, env.clone()).unwrap());
    let root = Arc::new(DecisionNode::root(env.initial_state()));
    let pool = Pool::new(manager, root.clone(), None);

    pool.run_trials(Some(2_000), None, true);
    pool.join();

    let mut child_visits_sum = 0u64;
    for a in root.legal_actions() {
        if root.has_child(&a) {
            child_visits_sum += root.get_child(&a).get_num_visits();
        }
    }
    assert!(child_visits_sum <= root.get_num_visits());
}

/// Property 4: the transposition table hands out exactly one object per
/// key, even across repeated lookups.
#[test]
fn transposition_table_dedups_by_key() {
    let config = SearchConfig { num_threads: 1, ..Default::default() };
    let env = Arc::new(ChainEnv::new(10));
    let manager = Manager::with_defaults(config, env).unwrap();

    let key = (3usize, 7usize);
    let (first, inserted_first) = manager
        .transposition
        .decision_table()
        .get_or_insert_with(key, || Arc::new(DecisionNode::new(7, 3, 3, false)));
    assert!(inserted_first);

    let (second, inserted_second) = manager
        .transposition
        .decision_table()
        .get_or_insert_with(key, || Arc::new(DecisionNode::new(7, 3, 3, false)));
    assert!(!inserted_second);
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(manager.transposition.decision_table().len(), 1);
}

/// Round-trip boundary: recommending after zero trials must not panic and
/// must return a legal action.
#[test]
fn recommend_after_zero_trials_is_a_legal_action() {
    let config = SearchConfig { num_threads: 1, ..Default::default() };
    let env = Arc::new(ChainEnv::new(10));
    let manager = Arc::new(Manager::with_defaults(config, env.clone()).unwrap());
    let root = Arc::new(DecisionNode::root(env.initial_state()));
    let pool = Pool::new(manager.clone(), root.clone(), None);

    pool.run_trials(Some(0), Some(Duration::from_millis(1)), true);
    let action = root.recommend_action(&manager);
    let legal = root.legal_actions();
    assert!(legal.contains(&action));
    pool.join();
}
