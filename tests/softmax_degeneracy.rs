//! §8 property 5: the softmax family's selection distribution degenerates to
//! uniform as `T -> infinity` and to greedy as `T -> 0`, driven only through
//! `SelectPolicy::select_action` with two children whose `soft_value` is set
//! directly via `BackupPolicy::backup_chance` (no statistical MCTS
//! convergence required to observe the kernel's own shape).

use std::sync::Arc;
use thts::config::{Algorithm, SearchConfig};
use thts::env::demo::{ChainAction, ChainEnv};
use thts::manager::Manager;
use thts::node::DecisionNode;
use thts::policy::{BackupPolicy, SelectPolicy};

fn build_root_with_two_children(config: SearchConfig) -> (Manager<ChainEnv>, DecisionNode<ChainEnv>) {
    let env = Arc::new(ChainEnv::new(10));
    let manager = Manager::with_defaults(config, env.clone()).unwrap();
    let root = DecisionNode::root(env.initial_state());
    root.visit(&manager);

    let (low, _) = root.create_child(&ChainAction::Advance, &manager);
    low.visit(&manager);
    manager.backup.backup_chance(&low, &manager, 0.0);

    let (high, _) = root.create_child(&ChainAction::Retreat, &manager);
    high.visit(&manager);
    manager.backup.backup_chance(&high, &manager, 1.0);

    (manager, root)
}

fn fraction_picking_high_value_action(manager: &Manager<ChainEnv>, root: &DecisionNode<ChainEnv>, draws: u32) -> f64 {
    let mut hits = 0u32;
    for _ in 0..draws {
        let mut ctx = manager.new_context();
        if manager.select.select_action(root, manager, &mut ctx) == ChainAction::Retreat {
            hits += 1;
        }
    }
    hits as f64 / draws as f64
}

#[test]
fn high_temperature_is_close_to_uniform() {
    let config = SearchConfig {
        algorithm: Algorithm::Ments,
        temp_init: 1000.0,
        temp_decay_min: 0.01,
        num_threads: 1,
        ..Default::default()
    };
    let (manager, root) = build_root_with_two_children(config);
    let frac = fraction_picking_high_value_action(&manager, &root, 2_000);
    assert!((frac - 0.5).abs() < 0.1, "expected near-uniform selection, got {frac}");
}

#[test]
fn low_temperature_is_greedy() {
    let config = SearchConfig {
        algorithm: Algorithm::Ments,
        temp_init: 0.001,
        temp_decay_min: 0.001,
        num_threads: 1,
        ..Default::default()
    };
    let (manager, root) = build_root_with_two_children(config);
    let frac = fraction_picking_high_value_action(&manager, &root, 500);
    assert!(frac > 0.95, "expected greedy selection of the higher-value action, got {frac}");
}
