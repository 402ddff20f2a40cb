use super::decision::DecisionNode;
use crate::env::Environment;
use crate::error::TreeInvariantError;
use crate::manager::{Context, Manager};
use crate::types::Reward;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

pub(crate) struct ChanceInner<Env: Environment> {
    pub children: HashMap<Env::Observation, Arc<DecisionNode<Env>>>,
    pub next_state_distribution: Option<HashMap<Env::State, f64>>,
    pub empirical_mean: Reward,
    pub dp_value: Reward,
    pub soft_value: Reward,
}

impl<Env: Environment> ChanceInner<Env> {
    fn new(default_q: Reward) -> Self {
        Self {
            children: HashMap::new(),
            next_state_distribution: None,
            empirical_mean: default_q,
            dp_value: default_q,
            soft_value: default_q,
        }
    }
}

/// §3 chance node: a `(state, action)` pair at `(decision_depth,
/// decision_timestep)`.
pub struct ChanceNode<Env: Environment> {
    pub state: Env::State,
    pub action: Env::Action,
    pub depth: usize,
    pub timestep: usize,
    n: AtomicU64,
    b: AtomicU64,
    pub(crate) inner: Mutex<ChanceInner<Env>>,
}

impl<Env: Environment> ChanceNode<Env> {
    pub fn new(state: Env::State, action: Env::Action, depth: usize, timestep: usize) -> Self {
        Self {
            state,
            action,
            depth,
            timestep,
            n: AtomicU64::new(0),
            b: AtomicU64::new(0),
            inner: Mutex::new(ChanceInner::new(0.0)),
        }
    }

    pub fn get_num_visits(&self) -> u64 {
        self.n.load(Ordering::SeqCst)
    }

    pub fn get_num_backups(&self) -> u64 {
        self.b.load(Ordering::SeqCst)
    }

    /// Lazily caches the next-state distribution (used by DP backups),
    /// then increments `n`. The cheap `sample_transition` path is used for
    /// the actual descent; this cache is only consulted by backups that
    /// need the full expectation (§4.A).
    pub fn visit(&self, manager: &Manager<Env>) {
        {
            let mut inner = self.inner.lock().unwrap();
            if inner.next_state_distribution.is_none() {
                if let Ok(dist) = manager.env.transition_distribution(&self.state, &self.action) {
                    inner.next_state_distribution = Some(dist);
                }
            }
        }
        self.n.fetch_add(1, Ordering::SeqCst);
    }

    pub fn has_child(&self, observation: &Env::Observation) -> bool {
        self.inner.lock().unwrap().children.contains_key(observation)
    }

    pub fn get_child(&self, observation: &Env::Observation) -> Arc<DecisionNode<Env>> {
        match self.inner.lock().unwrap().children.get(observation) {
            Some(c) => c.clone(),
            None => TreeInvariantError::MissingChild.panic(),
        }
    }

    /// Chance-node analogue of `DecisionNode::create_child`, keyed by
    /// observation (§4.C). The `bool` reports whether this call allocated a
    /// brand-new decision node object (§4.F `mcts_mode` stopping rule).
    pub fn create_child(
        &self,
        observation: &Env::Observation,
        next_state: Env::State,
        manager: &Manager<Env>,
    ) -> (Arc<DecisionNode<Env>>, bool) {
        if let Some(existing) = self.inner.lock().unwrap().children.get(observation) {
            return (existing.clone(), false);
        }

        let is_opponent = if manager.config.is_two_player_game {
            (self.timestep + 1) % 2 == 1
        } else {
            false
        };

        let (child, is_new) = if manager.config.use_transposition_table {
            let key = (self.depth + 1, next_state.clone());
            manager.transposition.decision_table().get_or_insert_with(key, || {
                Arc::new(DecisionNode::new(
                    next_state.clone(),
                    self.depth + 1,
                    self.timestep + 1,
                    is_opponent,
                ))
            })
        } else {
            (
                Arc::new(DecisionNode::new(
                    next_state.clone(),
                    self.depth + 1,
                    self.timestep + 1,
                    is_opponent,
                )),
                true,
            )
        };

        let mut inner = self.inner.lock().unwrap();
        let installed = inner
            .children
            .entry(observation.clone())
            .or_insert(child)
            .clone();
        (installed, is_new)
    }

    /// §4.A/§4.F: samples the next state from the environment's transition
    /// model, then the observation derived from it. Returns both, since the
    /// caller needs `next_state` to key/construct the child decision node
    /// whether or not `Observation == State`.
    pub fn sample_transition_and_observation(
        &self,
        manager: &Manager<Env>,
        ctx: &mut Context,
    ) -> Result<(Env::State, Env::Observation), crate::error::EnvironmentError> {
        let next_state = manager.env.sample_transition(&self.state, &self.action, &mut ctx.rng)?;
        let observation = manager.select.sample_observation(self, &next_state, manager, ctx)?;
        Ok((next_state, observation))
    }

    pub fn backup(&self, manager: &Manager<Env>, g: Reward) {
        manager.backup.backup_chance(self, manager, g);
        self.b.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn with_inner<R>(&self, f: impl FnOnce(&mut ChanceInner<Env>) -> R) -> R {
        let mut guard = self.inner.lock().unwrap();
        f(&mut guard)
    }
}
