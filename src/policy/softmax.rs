//! §4.D.2/§4.E: the softmax family (MENTS/RENTS/TENTS/DENTS) plus EST.
//! Selection samples from `(1−ε)·kernel + ε·prior`, where `kernel` is a
//! per-action weight derived from each child's cached `soft_value`
//! (maintained by the matching `BackupPolicy` in `backup.rs`) and varies by
//! variant; sampling uses the alias method (`alias.rs`) so resampling after
//! a single backup stays O(1) amortized instead of rebuilding a CDF on
//! every visit.

use super::alias::AliasTable;
use super::temperature;
use crate::config::DecayFn;
use crate::env::Environment;
use crate::error::EnvironmentError;
use crate::manager::{Context, Manager};
use crate::node::{ChanceNode, DecisionNode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoftmaxVariant {
    Ments,
    Rents,
    Tents,
    Dents,
    Est,
}

impl SoftmaxVariant {
    /// DENTS is ENTS with a decayed temperature schedule; the other three
    /// softmax members run at the configured constant temperature (§4.E.4).
    pub fn decays_temperature(self) -> bool {
        matches!(self, SoftmaxVariant::Dents)
    }

    /// TENTS/DENTS project onto the Tsallis simplex (sparse support);
    /// MENTS/RENTS/EST use the ordinary (Shannon-entropy) softmax.
    pub fn uses_tsallis(self) -> bool {
        matches!(self, SoftmaxVariant::Tents | SoftmaxVariant::Dents)
    }
}

/// Standard sparsemax projection (Martins & Astudillo 2016): the Euclidean
/// projection of `logits` onto the probability simplex, which is exactly
/// the Tsallis-entropy maximizing policy over `z = q/temperature`.
pub(crate) fn sparsemax(logits: &[f64]) -> Vec<f64> {
    let k = logits.len();
    if k == 0 {
        return Vec::new();
    }
    let mut sorted = logits.to_vec();
    sorted.sort_by(|a, b| b.partial_cmp(a).unwrap());
    let mut cumsum = 0.0;
    let mut tau = sorted[0] - 1.0;
    let mut support = 1usize;
    for (j, z) in sorted.iter().enumerate() {
        cumsum += z;
        let j1 = (j + 1) as f64;
        if 1.0 + j1 * z > cumsum {
            support = j + 1;
            tau = (cumsum - 1.0) / j1;
        }
    }
    let _ = support;
    logits.iter().map(|z| (z - tau).max(0.0)).collect()
}

fn softmax(logits: &[f64], shift: bool) -> Vec<f64> {
    weighted_softmax(logits, &vec![1.0; logits.len()], shift)
}

/// §4.D.2 RENTS kernel: `π(a) ∝ prior(a) · exp(Q̂/T)`. Also the general
/// weighted-softmax building block MENTS reuses with uniform weights.
/// `shift` is `config.shift_pseudo_q_values` (§6): subtracting `max(logits)`
/// before exponentiating doesn't change the normalized distribution, only
/// its numerical stability, so the flag can be turned off without changing
/// the selection policy's meaning.
pub(crate) fn weighted_softmax(logits: &[f64], weights: &[f64], shift: bool) -> Vec<f64> {
    let max = if shift {
        logits.iter().cloned().fold(f64::NEG_INFINITY, f64::max)
    } else {
        0.0
    };
    let exps: Vec<f64> = logits.iter().zip(weights).map(|(z, w)| w * (z - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    if total <= 0.0 {
        let n = logits.len().max(1) as f64;
        return vec![1.0 / n; logits.len()];
    }
    exps.into_iter().map(|e| e / total).collect()
}

pub struct Softmax {
    variant: SoftmaxVariant,
}

impl Softmax {
    pub fn new(variant: SoftmaxVariant) -> Self {
        Self { variant }
    }

    fn temperature<Env: Environment>(&self, node: &DecisionNode<Env>, manager: &Manager<Env>) -> f64 {
        let config = &manager.config;
        let decay = if self.variant.decays_temperature() {
            config.temp_decay_fn
        } else {
            DecayFn::NoDecay
        };
        let visits_scale = if node.is_root() {
            config.root_node_visits_scale
        } else {
            config.visits_scale
        };
        temperature::temperature(
            decay,
            config.temp_init,
            config.temp_decay_min,
            node.get_num_visits(),
            visits_scale,
        )
    }

    /// Per-action `q / temperature` logits. EST selects directly over each
    /// child's `empirical_mean` (§4.D.2: "EST: select by softmax over
    /// empirical means directly") since EST is wired to
    /// `EmpiricalMeanBackup` and never maintains `soft_value`; every other
    /// variant pulls its own `soft_value` (unexplored actions fall back to
    /// `default_q_value`, §4.E.1). Both fields are stored canonically like
    /// `dp_value` (see `ucb.rs`), so the §3 invariant-5 sign flip is applied
    /// here, at the reading node, based on this node's own `is_opponent`.
    fn logits<Env: Environment>(
        &self,
        node: &DecisionNode<Env>,
        manager: &Manager<Env>,
        actions: &[Env::Action],
        temp: f64,
    ) -> Vec<f64> {
        let t = temp.max(1e-9);
        actions
            .iter()
            .map(|a| {
                let q = if node.has_child(a) {
                    node.get_child(a).with_inner(|inner| {
                        if self.variant == SoftmaxVariant::Est {
                            inner.empirical_mean
                        } else {
                            inner.soft_value
                        }
                    })
                } else {
                    manager.config.default_q_value
                };
                let q = if node.is_opponent { -q } else { q };
                q / t
            })
            .collect()
    }

    /// §4.D.2: the variant kernel, then mixed with the prior (or uniform,
    /// if no prior is configured — `UniformPrior` is the engine default, so
    /// that case and "no prior" coincide): `π = (1−ε)·kernel + ε·prior`.
    fn distribution<Env: Environment>(
        &self,
        node: &DecisionNode<Env>,
        manager: &Manager<Env>,
        actions: &[Env::Action],
    ) -> Vec<f64> {
        let shift = manager.config.shift_pseudo_q_values;
        let temp = self.temperature(node, manager);
        let logits = self.logits(node, manager, actions, temp);
        let kernel = match self.variant {
            SoftmaxVariant::Tents | SoftmaxVariant::Dents => sparsemax(&logits),
            SoftmaxVariant::Rents => weighted_softmax(&logits, &node.ensure_prior(manager), shift),
            SoftmaxVariant::Ments | SoftmaxVariant::Est => softmax(&logits, shift),
        };

        let eps = if node.is_root() {
            manager.config.root_node_epsilon
        } else {
            manager.config.epsilon
        };
        let mixed = if eps <= 0.0 {
            kernel
        } else {
            let prior = node.ensure_prior(manager);
            kernel.iter().zip(&prior).map(|(k, p)| (1.0 - eps) * k + eps * p).collect()
        };
        self.mask_under_construction(node, manager, actions, mixed)
    }

    /// §4.D.2/§6 `avoid_selecting_children_under_construction`: a child
    /// whose visit count has already outrun its backup count is mid-descent
    /// on another thread and hasn't reported a value for this round yet;
    /// drop it from the support and renormalise instead of selecting into
    /// it. Falls back to the un-masked distribution if every action would
    /// be masked out, so a fully in-flight node never produces a
    /// degenerate all-zero distribution.
    fn mask_under_construction<Env: Environment>(
        &self,
        node: &DecisionNode<Env>,
        manager: &Manager<Env>,
        actions: &[Env::Action],
        weights: Vec<f64>,
    ) -> Vec<f64> {
        if !manager.config.avoid_selecting_children_under_construction {
            return weights;
        }
        let masked: Vec<f64> = actions
            .iter()
            .zip(&weights)
            .map(|(a, w)| {
                if node.has_child(a) {
                    let child = node.get_child(a);
                    if child.get_num_visits() > child.get_num_backups() {
                        return 0.0;
                    }
                }
                *w
            })
            .collect();
        let total: f64 = masked.iter().sum();
        if total <= 0.0 {
            return weights;
        }
        masked.into_iter().map(|w| w / total).collect()
    }
}

impl<Env: Environment> super::SelectPolicy<Env> for Softmax {
    fn select_action(
        &self,
        node: &DecisionNode<Env>,
        manager: &Manager<Env>,
        ctx: &mut Context,
    ) -> Env::Action {
        let actions = node.legal_actions();
        assert!(!actions.is_empty(), "decision node has no legal actions");

        if let Some(a) = actions.iter().find(|a| !node.has_child(a)) {
            return a.clone();
        }

        let needs_rebuild = node.with_inner(|inner| {
            !manager.config.alias_use_caching
                || super::ucb::alias_needs_rebuild(
                    &inner.alias,
                    inner.backups_since_alias,
                    manager.config.alias_recompute_freq,
                    actions.len(),
                    inner.alias_support_len,
                )
        });

        let table = if needs_rebuild {
            let probs = self.distribution(node, manager, &actions);
            let table = AliasTable::build(&probs);
            node.with_inner(|inner| {
                inner.alias = Some(table.clone());
                inner.backups_since_alias = 0;
                inner.alias_support_len = actions.len();
            });
            table
        } else {
            node.with_inner(|inner| inner.alias.clone().expect("alias table present"))
        };

        let idx = table.sample(&mut ctx.rng);
        actions[idx].clone()
    }

    fn sample_observation(
        &self,
        node: &ChanceNode<Env>,
        next_state: &Env::State,
        manager: &Manager<Env>,
        ctx: &mut Context,
    ) -> Result<Env::Observation, EnvironmentError> {
        manager.env.sample_observation(&node.action, next_state, &mut ctx.rng)
    }

    fn recommend_action(&self, node: &DecisionNode<Env>, manager: &Manager<Env>) -> Env::Action {
        super::ucb::recommend_by_visits_or_value(node, manager)
    }
}
