//! §4.F: one trial, run by a single worker thread against the shared node
//! graph. Four phases: selection (descend using each node's policy),
//! expansion (lazily create the next child), frontier evaluation (the
//! heuristic, zero by default), and backup (walk the visited path in
//! reverse, accumulating the return).
//!
//! The driver holds the visited path explicitly (`Vec<NodeHandle<Env>>`)
//! rather than relying on parent pointers on the nodes themselves (§9
//! design note: cyclic back-references are the one thing this rewrite
//! drops — nothing needs to walk upward through the graph itself once the
//! driver already has the path in hand).

use crate::env::Environment;
use crate::error::EnvironmentError;
use crate::manager::Manager;
use crate::node::{DecisionNode, NodeHandle};
use crate::types::Reward;
use std::sync::Arc;

/// Runs exactly one trial to completion. Returns `Ok(())` on a normal
/// finish; an `Err` means the environment raised `EnvironmentError`
/// mid-trial and the trial was abandoned without a backup (§7: recoverable,
/// the pool stays alive and simply runs another trial).
pub fn run_trial<Env: Environment>(
    manager: &Manager<Env>,
    root: &Arc<DecisionNode<Env>>,
) -> Result<(), EnvironmentError> {
    let mut ctx = manager.new_context();
    let mut path: Vec<NodeHandle<Env>> = Vec::new();
    let mut rewards: Vec<Reward> = Vec::new();

    root.visit(manager);
    let mut frontier = root.clone();
    let mut expanded_new_decision = false;

    loop {
        if frontier.is_leaf(manager) {
            break;
        }
        let action = frontier.select_action(manager, &mut ctx);
        let (chance_child, _) = frontier.create_child(&action, manager);
        chance_child.visit(manager);
        path.push(NodeHandle::Chance(chance_child.clone()));

        let (next_state, observation) =
            chance_child.sample_transition_and_observation(manager, &mut ctx)?;
        let reward = manager.env.reward(&chance_child.state, &chance_child.action, &observation);
        rewards.push(reward);

        let (decision_child, is_new) =
            chance_child.create_child(&observation, next_state, manager);
        decision_child.visit(manager);
        path.push(NodeHandle::Decision(decision_child.clone()));
        frontier = decision_child;

        if manager.config.mcts_mode && is_new {
            expanded_new_decision = true;
            break;
        }
    }

    let heuristic_value = manager.heuristic.evaluate(&frontier.state);
    let _ = expanded_new_decision;

    let mut g = heuristic_value;
    manager.observe_return_magnitude(g);

    let mut reward_idx = rewards.len();
    for handle in path.iter().rev() {
        match handle {
            NodeHandle::Decision(d) => d.backup(manager, g),
            NodeHandle::Chance(c) => {
                reward_idx -= 1;
                g += rewards[reward_idx];
                manager.observe_return_magnitude(g);
                c.backup(manager, g);
            }
        }
    }
    root.backup(manager, g);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Algorithm, SearchConfig};
    use crate::env::demo::ChainEnv;
    use crate::manager::Manager;

    #[test]
    fn single_trial_backs_up_root() {
        let config = SearchConfig {
            algorithm: Algorithm::Uct,
            max_depth: 12,
            num_threads: 1,
            ..Default::default()
        };
        let env = Arc::new(ChainEnv::new(10));
        let manager = Manager::with_defaults(config, env.clone()).unwrap();
        let root = Arc::new(DecisionNode::root(env.initial_state()));
        run_trial(&manager, &root).unwrap();
        assert_eq!(root.get_num_backups(), 1);
        assert_eq!(root.get_num_visits(), 1);
    }

    #[test]
    fn many_trials_keep_b_le_n() {
        let config = SearchConfig {
            algorithm: Algorithm::Uct,
            max_depth: 12,
            num_threads: 1,
            ..Default::default()
        };
        let env = Arc::new(ChainEnv::new(10));
        let manager = Manager::with_defaults(config, env.clone()).unwrap();
        let root = Arc::new(DecisionNode::root(env.initial_state()));
        for _ in 0..200 {
            run_trial(&manager, &root).unwrap();
        }
        assert_eq!(root.get_num_backups(), root.get_num_visits());
        assert_eq!(root.get_num_backups(), 200);
    }
}
