//! §4.B: process-wide configuration plus the shared RNG, transposition
//! tables and per-thread context registry. The manager itself is immutable
//! after construction; only the RNG and transposition tables are mutated,
//! each under its own discipline (a single mutex for the RNG, shard mutexes
//! for the tables).

use crate::config::SearchConfig;
use crate::env::{Environment, Heuristic, Prior, UniformPrior, ZeroHeuristic};
use crate::node::{ChanceNode, DecisionNode};
use crate::policy::{self, BackupPolicy, SelectPolicy};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// A fixed-shard-count map guarded by one mutex per shard, selected by
/// hash. Backs both transposition tables (§4.B/§4.C, §8 testable property
/// 4: at most one object per key).
pub struct ShardedMap<K, V> {
    shards: Vec<Mutex<HashMap<K, V>>>,
}

impl<K, V> ShardedMap<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(shard_count: usize) -> Self {
        let shard_count = shard_count.max(1);
        Self {
            shards: (0..shard_count).map(|_| Mutex::new(HashMap::new())).collect(),
        }
    }

    fn shard_index(&self, key: &K) -> usize {
        use std::hash::Hasher;
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() as usize) % self.shards.len()
    }

    /// Returns the existing value for `key`, or inserts `make()`'s result
    /// and returns that. Exactly one call to `make` wins across concurrent
    /// callers with the same key, because the whole read-or-insert happens
    /// under one shard lock acquisition. The `bool` reports whether this
    /// call was the one that inserted (§8 testable property 4).
    pub fn get_or_insert_with(&self, key: K, make: impl FnOnce() -> V) -> (V, bool) {
        let idx = self.shard_index(&key);
        let mut shard = self.shards[idx].lock().unwrap();
        if let Some(v) = shard.get(&key) {
            return (v.clone(), false);
        }
        let v = make();
        shard.insert(key, v.clone());
        (v, true)
    }

    pub fn len(&self) -> usize {
        self.shards.iter().map(|s| s.lock().unwrap().len()).sum()
    }
}

/// The two node tables (§3 lifecycle: identical `(decision_depth, state)`
/// for D-nodes, `(decision_depth, state, action)` for C-nodes, share one
/// object).
pub struct TranspositionTables<Env: Environment> {
    decisions: ShardedMap<(usize, Env::State), Arc<DecisionNode<Env>>>,
    chances: ShardedMap<(usize, Env::State, Env::Action), Arc<ChanceNode<Env>>>,
}

impl<Env: Environment> TranspositionTables<Env> {
    pub fn new(shard_count: usize) -> Self {
        Self {
            decisions: ShardedMap::new(shard_count),
            chances: ShardedMap::new(shard_count),
        }
    }

    pub fn decision_table(&self) -> &ShardedMap<(usize, Env::State), Arc<DecisionNode<Env>>> {
        &self.decisions
    }

    pub fn chance_table(
        &self,
    ) -> &ShardedMap<(usize, Env::State, Env::Action), Arc<ChanceNode<Env>>> {
        &self.chances
    }
}

/// Per-trial, per-thread scratchpad (§4.B `new_context`). Holds its own RNG
/// seeded from the manager's shared RNG so a trial can draw many times
/// without recontending the shared RNG lock (§5).
pub struct Context {
    pub rng: StdRng,
    /// Cache for `dirichlet_redraw_once_per_trial`: the root's noise draw,
    /// reused for every root visit made by this trial instead of redrawing
    /// (§9 design note, second Open Question).
    pub root_dirichlet_noise: Option<Vec<f64>>,
}

impl Context {
    pub fn gen_range_f64(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// §4.B. Shared by every worker thread; handed to every node by `Arc`
/// reference rather than kept as module-level global state (design note 9).
pub struct Manager<Env: Environment> {
    pub config: SearchConfig,
    pub env: Arc<Env>,
    pub heuristic: Arc<dyn Heuristic<Env>>,
    pub prior: Arc<dyn Prior<Env>>,
    pub select: Arc<dyn SelectPolicy<Env>>,
    pub backup: Arc<dyn BackupPolicy<Env>>,
    pub transposition: TranspositionTables<Env>,
    rng: Mutex<StdRng>,
    /// Running estimate of `|q|_max` over the root subtree, backing
    /// `AUTO_BIAS` (§4.D.1).
    abs_q_max_bits: AtomicU64,
}

impl<Env: Environment + 'static> Manager<Env> {
    pub fn new(
        config: SearchConfig,
        env: Arc<Env>,
        heuristic: Arc<dyn Heuristic<Env>>,
        prior: Arc<dyn Prior<Env>>,
    ) -> Result<Self, crate::error::ConfigError> {
        config.validate()?;
        let (select, backup) = policy::build::<Env>(&config);
        let shard_count = config.num_transposition_table_mutexes;
        let seed = config.seed;
        Ok(Self {
            transposition: TranspositionTables::new(shard_count),
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            abs_q_max_bits: AtomicU64::new(crate::config::AUTO_BIAS_MIN.to_bits()),
            config,
            env,
            heuristic,
            prior,
            select,
            backup,
        })
    }

    pub fn with_defaults(config: SearchConfig, env: Arc<Env>) -> Result<Self, crate::error::ConfigError> {
        Self::new(config, env, Arc::new(ZeroHeuristic), Arc::new(UniformPrior))
    }

    pub fn new_context(&self) -> Context {
        let seed: u64 = self.rng.lock().unwrap().gen();
        Context {
            rng: StdRng::seed_from_u64(seed),
            root_dirichlet_noise: None,
        }
    }

    /// `c = max(AUTO_BIAS_MIN, |q|_max)` when `bias == AUTO_BIAS` (§4.D.1).
    pub fn auto_bias(&self) -> f64 {
        f64::from_bits(self.abs_q_max_bits.load(Ordering::Relaxed))
    }

    pub fn observe_return_magnitude(&self, g: f64) {
        let mag = g.abs();
        let mut current = self.auto_bias();
        while mag > current {
            let prev_bits = current.to_bits();
            match self.abs_q_max_bits.compare_exchange_weak(
                prev_bits,
                mag.to_bits(),
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(_) => current = self.auto_bias(),
            }
        }
    }

    pub fn bias(&self) -> f64 {
        if self.config.bias_is_auto() {
            self.auto_bias().max(crate::config::AUTO_BIAS_MIN)
        } else {
            self.config.bias
        }
    }
}
