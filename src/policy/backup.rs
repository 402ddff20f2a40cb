//! §4.E: value propagation, invoked under the node lock. Every scalar a
//! node stores (`empirical_mean`/`dp_value`/`soft_value`) lives in one fixed
//! canonical orientation — backups here never negate `g` or a child's
//! value for two-player games; that sign flip is applied only when a node
//! later *reads* a child's value back out, via its own `is_opponent` flag
//! (see `ucb.rs`'s module doc and `softmax.rs::logits`).

use super::softmax::SoftmaxVariant;
use super::temperature;
use crate::config::DecayFn;
use crate::env::Environment;
use crate::manager::Manager;
use crate::node::chance::ChanceInner;
use crate::node::{ChanceNode, DecisionNode};
use crate::types::Reward;

/// UCT's running mean: `Q <- Q + (g - Q) / n` (§4.E.1), using the
/// post-this-backup count so that the first backup sets `Q := g` exactly.
fn incorporate_mean(mean: &mut Reward, g: Reward, n_after: u64) {
    let n = n_after.max(1) as f64;
    *mean += (g - *mean) / n;
}

/// §4.E.2 D-node rule, shared by `DynamicProgrammingBackup` and DENTS's own
/// `dp_value` maintenance: `max_a Q(a)` if not opponent, else `min_a Q(a)`,
/// over unflipped (canonical) children; an empty-children node falls back
/// to `fallback` (its own empirical mean) rather than an infinite value.
fn dp_max_or_min(children: impl Iterator<Item = Reward>, is_opponent: bool, fallback: Reward) -> Reward {
    let best = if is_opponent {
        children.fold(f64::INFINITY, f64::min)
    } else {
        children.fold(f64::NEG_INFINITY, f64::max)
    };
    if best.is_finite() {
        best
    } else {
        fallback
    }
}

/// §4.E.2 C-node rule: the expectation of children's `dp_value` under the
/// cached transition distribution, falling back to `fallback` when the
/// distribution or a matching child is unavailable (§4.A: the engine never
/// requires `transition_distribution` to be cheap or even implemented).
fn dp_expectation_from_distribution<Env: Environment>(inner: &ChanceInner<Env>, fallback: Reward) -> Reward {
    match &inner.next_state_distribution {
        Some(dist) if !dist.is_empty() => {
            let mut expectation = 0.0;
            let mut mass = 0.0;
            for (next_state, p) in dist {
                if let Some(child) = inner.children.values().find(|c| &c.state == next_state) {
                    expectation += p * child.with_inner(|ci| ci.dp_value);
                    mass += p;
                }
            }
            if mass > 0.0 {
                expectation / mass
            } else {
                fallback
            }
        }
        _ => fallback,
    }
}

pub struct EmpiricalMeanBackup;

impl<Env: Environment> super::BackupPolicy<Env> for EmpiricalMeanBackup {
    fn backup_decision(&self, node: &DecisionNode<Env>, _manager: &Manager<Env>, g: Reward) {
        let n_after = node.get_num_backups() + 1;
        node.with_inner(|inner| {
            incorporate_mean(&mut inner.empirical_mean, g, n_after);
            inner.backups_since_alias += 1;
        });
    }

    fn backup_chance(&self, node: &ChanceNode<Env>, _manager: &Manager<Env>, g: Reward) {
        let n_after = node.get_num_backups() + 1;
        node.with_inner(|inner| incorporate_mean(&mut inner.empirical_mean, g, n_after));
    }
}

/// PUCT/AlphaGo's full-expectation backup (§4.E.2).
pub struct DynamicProgrammingBackup;

impl<Env: Environment> super::BackupPolicy<Env> for DynamicProgrammingBackup {
    fn backup_decision(&self, node: &DecisionNode<Env>, _manager: &Manager<Env>, g: Reward) {
        let n_after = node.get_num_backups() + 1;
        let is_opponent = node.is_opponent;
        node.with_inner(|inner| {
            incorporate_mean(&mut inner.empirical_mean, g, n_after);
            let values = inner.children.values().map(|c| c.with_inner(|ci| ci.dp_value));
            inner.dp_value = dp_max_or_min(values, is_opponent, inner.empirical_mean);
        });
    }

    fn backup_chance(&self, node: &ChanceNode<Env>, _manager: &Manager<Env>, g: Reward) {
        let n_after = node.get_num_backups() + 1;
        node.with_inner(|inner| {
            incorporate_mean(&mut inner.empirical_mean, g, n_after);
            inner.dp_value = dp_expectation_from_distribution(inner, inner.empirical_mean);
        });
    }
}

/// §4.E.3/§4.E.4: the softmax family's entropy-regularized backup. Shared
/// by MENTS/RENTS/TENTS/DENTS; only the kernel and the temperature schedule
/// vary between them.
pub struct EntropyBackup {
    variant: SoftmaxVariant,
}

impl EntropyBackup {
    pub fn new(variant: SoftmaxVariant) -> Self {
        Self { variant }
    }

    /// The backed-up value uses its own `value_temp_*` schedule (§6),
    /// independent of the `temp_*` schedule `softmax.rs` uses for the
    /// selection distribution — the two may differ (e.g. a run that
    /// anneals the acting policy but keeps backed-up values at a fixed
    /// temperature for stability).
    fn value_temp(&self, config: &crate::config::SearchConfig, visits: u64, is_root: bool) -> f64 {
        let decay = if self.variant.decays_temperature() {
            config.value_temp_decay_fn
        } else {
            DecayFn::NoDecay
        };
        let visits_scale = if is_root {
            config.value_temp_root_visits_scale
        } else {
            config.value_temp_visits_scale
        };
        temperature::temperature(decay, config.value_temp_init, config.value_temp_decay_min, visits, visits_scale)
    }

    /// DENTS's `π`, the *selection* distribution (§4.D.2/§4.E.3), uses the
    /// `temp_*` schedule rather than `value_temp_*` — it is literally the
    /// same sparsemax kernel `softmax.rs` samples from, recomputed here to
    /// build `subtree_entropy`.
    fn selection_temp(&self, config: &crate::config::SearchConfig, visits: u64, is_root: bool) -> f64 {
        let decay = if self.variant.decays_temperature() {
            config.temp_decay_fn
        } else {
            DecayFn::NoDecay
        };
        let visits_scale = if is_root {
            config.root_node_visits_scale
        } else {
            config.visits_scale
        };
        temperature::temperature(decay, config.temp_init, config.temp_decay_min, visits, visits_scale)
    }

    /// `temp * log(Σ_i w_i * exp(q_i/temp))`, numerically stabilized by
    /// subtracting `max(q)`. MENTS uses uniform weights; RENTS weights by
    /// the prior (§4.E.3).
    fn log_sum_exp(&self, qs: &[Reward], weights: &[f64], temp: f64) -> Reward {
        let t = temp.max(1e-9);
        let max = qs.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        if !max.is_finite() {
            return 0.0;
        }
        let sum: f64 = qs.iter().zip(weights).map(|(q, w)| w * ((q - max) / t).exp()).sum();
        if sum <= 0.0 {
            return max;
        }
        max + t * sum.ln()
    }

    /// `Σ_i p_i(q_i + temp/2 (1 - p_i))`, the value of the sparsemax policy
    /// under Tsallis regularization (§4.E.4; `p` from `softmax::sparsemax`).
    fn tsallis_value(&self, qs: &[Reward], temp: f64) -> Reward {
        let t = temp.max(1e-9);
        let logits: Vec<f64> = qs.iter().map(|q| q / t).collect();
        let probs = super::softmax::sparsemax(&logits);
        qs.iter().zip(&probs).map(|(q, p)| p * (q + t * 0.5 * (1.0 - p))).sum()
    }
}

impl<Env: Environment> super::BackupPolicy<Env> for EntropyBackup {
    fn backup_decision(&self, node: &DecisionNode<Env>, manager: &Manager<Env>, g: Reward) {
        let n_after = node.get_num_backups() + 1;
        let is_opponent = node.is_opponent;
        let value_temp = self.value_temp(&manager.config, node.get_num_visits(), node.is_root());
        let actions = node.legal_actions();
        let prior = if self.variant == SoftmaxVariant::Rents {
            Some(node.ensure_prior(manager))
        } else {
            None
        };
        let selection_temp = if self.variant == SoftmaxVariant::Dents {
            Some(self.selection_temp(&manager.config, node.get_num_visits(), node.is_root()))
        } else {
            None
        };

        node.with_inner(|inner| {
            incorporate_mean(&mut inner.empirical_mean, g, n_after);
            inner.backups_since_alias += 1;

            // §4.E.3: V_i = soft_value(child) if expanded, else
            // default_q_value; flipped here, at the reading node, exactly
            // like `ucb.rs`'s q̃ (values are stored canonically).
            let qs: Vec<Reward> = actions
                .iter()
                .map(|a| {
                    let raw = inner
                        .children
                        .get(a)
                        .map(|c| c.with_inner(|ci| ci.soft_value))
                        .unwrap_or(manager.config.default_q_value);
                    if is_opponent {
                        -raw
                    } else {
                        raw
                    }
                })
                .collect();

            match self.variant {
                SoftmaxVariant::Ments => {
                    inner.soft_value = self.log_sum_exp(&qs, &vec![1.0; qs.len()], value_temp);
                    inner.subtree_entropy = value_temp;
                }
                SoftmaxVariant::Rents => {
                    let weights = prior.clone().unwrap_or_else(|| vec![1.0; qs.len()]);
                    inner.soft_value = self.log_sum_exp(&qs, &weights, value_temp);
                    inner.subtree_entropy = value_temp;
                }
                SoftmaxVariant::Tents => {
                    inner.soft_value = self.tsallis_value(&qs, value_temp);
                    inner.subtree_entropy = value_temp;
                }
                SoftmaxVariant::Dents => {
                    // dp_value tracks the same max/min rule as
                    // DynamicProgrammingBackup, feeding `use_dp_value`
                    // below.
                    let dp_children = inner.children.values().map(|c| c.with_inner(|ci| ci.dp_value));
                    inner.dp_value = dp_max_or_min(dp_children, is_opponent, inner.empirical_mean);

                    // H = Σ_i π_i (V_i - log π_i), π the selection
                    // distribution (§4.D.2/§4.E.3: sparsemax over Q̂/T_s).
                    let sel_temp = selection_temp.unwrap_or(1.0).max(1e-9);
                    let sel_logits: Vec<f64> = qs.iter().map(|q| q / sel_temp).collect();
                    let pi = super::softmax::sparsemax(&sel_logits);
                    let entropy: f64 = pi
                        .iter()
                        .zip(&qs)
                        .map(|(p, v)| if *p > 0.0 { p * (v - p.ln()) } else { 0.0 })
                        .sum();
                    inner.subtree_entropy = entropy;

                    let base = if manager.config.use_dp_value {
                        inner.dp_value
                    } else {
                        inner.empirical_mean
                    };
                    inner.soft_value = base + value_temp * entropy;
                }
                SoftmaxVariant::Est => unreachable!("EST uses EmpiricalMeanBackup"),
            }
        });
    }

    fn backup_chance(&self, node: &ChanceNode<Env>, _manager: &Manager<Env>, g: Reward) {
        let n_after = node.get_num_backups() + 1;
        let is_dents = self.variant == SoftmaxVariant::Dents;
        node.with_inner(|inner| {
            incorporate_mean(&mut inner.empirical_mean, g, n_after);
            if is_dents {
                // §4.E.3: "at C-nodes, DENTS does both a DP backup and an
                // entropy backup"; the entropy half is the same
                // average-of-children rule below, so only `dp_value` needs
                // separate maintenance here.
                inner.dp_value = dp_expectation_from_distribution(inner, inner.empirical_mean);
            }
            // A chance node's soft value is the expectation of its own
            // children's soft values — the entropy bonus belongs to the
            // acting player's decision (§4.E.3).
            if inner.children.is_empty() {
                inner.soft_value = inner.empirical_mean;
            } else {
                let n = inner.children.len() as f64;
                inner.soft_value = inner
                    .children
                    .values()
                    .map(|c| c.with_inner(|ci| ci.soft_value))
                    .sum::<f64>()
                    / n;
            }
        });
    }
}
