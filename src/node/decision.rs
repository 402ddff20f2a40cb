use super::chance::ChanceNode;
use crate::env::Environment;
use crate::error::TreeInvariantError;
use crate::manager::{Context, Manager};
use crate::policy::alias::AliasTable;
use crate::types::{Probability, Reward};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Everything about a D-node that is only consistent immediately after a
/// `backup` completes under the node lock (§3 invariant 6).
pub(crate) struct DecisionInner<Env: Environment> {
    pub children: HashMap<Env::Action, Arc<ChanceNode<Env>>>,
    pub legal_actions: Option<Vec<Env::Action>>,
    pub prior: Option<Vec<Probability>>,
    pub soft_value: Reward,
    pub subtree_entropy: f64,
    pub dp_value: Reward,
    pub empirical_mean: Reward,
    pub alias: Option<AliasTable>,
    pub backups_since_alias: u32,
    pub alias_support_len: usize,
}

impl<Env: Environment> DecisionInner<Env> {
    fn new(default_q: Reward) -> Self {
        Self {
            children: HashMap::new(),
            legal_actions: None,
            prior: None,
            soft_value: default_q,
            subtree_entropy: 0.0,
            dp_value: default_q,
            empirical_mean: default_q,
            alias: None,
            backups_since_alias: 0,
            alias_support_len: 0,
        }
    }
}

/// §3 decision node: a state at `(decision_depth, decision_timestep)`.
pub struct DecisionNode<Env: Environment> {
    pub state: Env::State,
    pub depth: usize,
    pub timestep: usize,
    pub is_opponent: bool,
    is_root: bool,
    n: AtomicU64,
    b: AtomicU64,
    pub(crate) inner: Mutex<DecisionInner<Env>>,
}

impl<Env: Environment> DecisionNode<Env> {
    pub fn new(state: Env::State, depth: usize, timestep: usize, is_opponent: bool) -> Self {
        Self::with_root(state, depth, timestep, is_opponent, false)
    }

    pub fn root(state: Env::State) -> Self {
        Self::with_root(state, 0, 0, false, true)
    }

    fn with_root(
        state: Env::State,
        depth: usize,
        timestep: usize,
        is_opponent: bool,
        is_root: bool,
    ) -> Self {
        Self {
            state,
            depth,
            timestep,
            is_opponent,
            is_root,
            n: AtomicU64::new(0),
            b: AtomicU64::new(0),
            inner: Mutex::new(DecisionInner::new(0.0)),
        }
    }

    pub fn is_root(&self) -> bool {
        self.is_root
    }

    pub fn get_num_visits(&self) -> u64 {
        self.n.load(Ordering::SeqCst)
    }

    pub fn get_num_backups(&self) -> u64 {
        self.b.load(Ordering::SeqCst)
    }

    pub fn is_leaf(&self, manager: &Manager<Env>) -> bool {
        manager.env.is_terminal(&self.state) || self.depth >= manager.config.max_depth
    }

    /// Lazily caches `valid_actions`, then increments `n`. `n` increases
    /// before selection returns, strictly before `b` can increase for the
    /// same visit (§3 invariant 2, §4.C).
    pub fn visit(&self, manager: &Manager<Env>) {
        {
            let mut inner = self.inner.lock().unwrap();
            if inner.legal_actions.is_none() {
                let actions = manager.env.valid_actions(&self.state);
                if manager.config.heuristic_pseudo_trials > 0 {
                    inner.empirical_mean = manager.heuristic.evaluate(&self.state);
                    inner.dp_value = inner.empirical_mean;
                    inner.soft_value = inner.empirical_mean;
                }
                inner.legal_actions = Some(actions);
            }
        }
        self.n.fetch_add(1, Ordering::SeqCst);
    }

    pub fn legal_actions(&self) -> Vec<Env::Action> {
        self.inner
            .lock()
            .unwrap()
            .legal_actions
            .clone()
            .expect("visit() must run before legal_actions() is read")
    }

    pub fn has_child(&self, action: &Env::Action) -> bool {
        self.inner.lock().unwrap().children.contains_key(action)
    }

    pub fn get_child(&self, action: &Env::Action) -> Arc<ChanceNode<Env>> {
        match self.inner.lock().unwrap().children.get(action) {
            Some(c) => c.clone(),
            None => TreeInvariantError::MissingChild.panic(),
        }
    }

    /// §4.C child-creation algorithm: at most one child object per key,
    /// even under concurrent creators. The `bool` reports whether this call
    /// is the one that allocated a brand-new child (used by the trial
    /// driver's `mcts_mode` stopping rule, §4.F).
    pub fn create_child(
        &self,
        action: &Env::Action,
        manager: &Manager<Env>,
    ) -> (Arc<ChanceNode<Env>>, bool) {
        if let Some(existing) = self.inner.lock().unwrap().children.get(action) {
            return (existing.clone(), false);
        }

        let (child, is_new) = if manager.config.use_transposition_table {
            let key = (self.depth, self.state.clone(), action.clone());
            manager.transposition.chance_table().get_or_insert_with(key, || {
                Arc::new(ChanceNode::new(
                    self.state.clone(),
                    action.clone(),
                    self.depth,
                    self.timestep,
                ))
            })
        } else {
            (
                Arc::new(ChanceNode::new(
                    self.state.clone(),
                    action.clone(),
                    self.depth,
                    self.timestep,
                )),
                true,
            )
        };

        let mut inner = self.inner.lock().unwrap();
        let installed = inner.children.entry(action.clone()).or_insert(child).clone();
        (installed, is_new)
    }

    /// Lazily computes and caches `manager.prior.prior(state, actions)`
    /// (§4.D.1 AlphaGo/§4.D.2 RENTS both consult this). Cached once per
    /// node since the prior is a pure function of state.
    pub fn ensure_prior(&self, manager: &Manager<Env>) -> Vec<crate::types::Probability> {
        let actions = self.legal_actions();
        self.with_inner(|inner| {
            if let Some(p) = &inner.prior {
                return p.clone();
            }
            let p = manager.prior.prior(&self.state, &actions);
            inner.prior = Some(p.clone());
            p
        })
    }

    pub fn select_action(&self, manager: &Manager<Env>, ctx: &mut Context) -> Env::Action {
        manager.select.select_action(self, manager, ctx)
    }

    pub fn recommend_action(&self, manager: &Manager<Env>) -> Env::Action {
        manager.select.recommend_action(self, manager)
    }

    pub fn backup(&self, manager: &Manager<Env>, g: Reward) {
        manager.backup.backup_decision(self, manager, g);
        self.b.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn with_inner<R>(&self, f: impl FnOnce(&mut DecisionInner<Env>) -> R) -> R {
        let mut guard = self.inner.lock().unwrap();
        f(&mut guard)
    }
}
