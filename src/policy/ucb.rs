//! §4.D.1: UCT, PUCT and AlphaGo selection. One struct, one runtime
//! variant tag, rather than the source's inheritance chain (design note 9).
//!
//! Convention used throughout this module and `backup.rs`: every node's
//! stored scalar (`empirical_mean`/`dp_value`/`soft_value`) is kept in one
//! fixed canonical orientation, written and accumulated without ever being
//! negated. The §3 invariant-5 sign only enters when a node reads one of
//! its own children's values back out, via that node's own `is_opponent`
//! flag (`q̃ = q` if this node is not the opponent, `-q` if it is) — never
//! at storage or backup-accumulation time.

use super::alias::AliasTable;
use super::dirichlet;
use crate::config::SearchConfig;
use crate::env::Environment;
use crate::error::EnvironmentError;
use crate::manager::{Context, Manager};
use crate::node::{ChanceNode, DecisionNode};
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UcbVariant {
    Uct,
    Puct,
    AlphaGo,
}

pub struct Ucb {
    variant: UcbVariant,
}

impl Ucb {
    pub fn new(variant: UcbVariant) -> Self {
        Self { variant }
    }

    fn uses_prior(&self) -> bool {
        matches!(self.variant, UcbVariant::Puct | UcbVariant::AlphaGo)
    }

    fn root_prior<Env: Environment>(
        &self,
        node: &DecisionNode<Env>,
        manager: &Manager<Env>,
        ctx: &mut Context,
        base_prior: &[f64],
        actions: &[Env::Action],
    ) -> Vec<f64> {
        if !(self.variant == UcbVariant::AlphaGo && node.is_root()) {
            return base_prior.to_vec();
        }
        let coeff = manager.config.dirichlet_noise_coeff;
        let beta = manager.config.dirichlet_noise_param;
        if manager.config.dirichlet_redraw_once_per_trial {
            if ctx.root_dirichlet_noise.is_none() {
                ctx.root_dirichlet_noise =
                    Some(dirichlet::sample_dirichlet(actions.len(), beta, &mut ctx.rng));
            }
            let noise = ctx.root_dirichlet_noise.clone().unwrap();
            dirichlet::mix(base_prior, &noise, coeff)
        } else {
            let noise = dirichlet::sample_dirichlet(actions.len(), beta, &mut ctx.rng);
            dirichlet::mix(base_prior, &noise, coeff)
        }
    }

    fn ucb_term(&self, total_visits: u64, child_visits: u64, config: &SearchConfig) -> f64 {
        let n = total_visits as f64;
        let n_a = child_visits as f64;
        match self.variant {
            UcbVariant::Uct => unreachable!("uct scores separately"),
            UcbVariant::Puct => n.powf(config.puct_power) / n_a.max(1.0),
            UcbVariant::AlphaGo => n.sqrt() / (1.0 + n_a),
        }
    }
}

impl<Env: Environment> super::SelectPolicy<Env> for Ucb {
    fn select_action(
        &self,
        node: &DecisionNode<Env>,
        manager: &Manager<Env>,
        ctx: &mut Context,
    ) -> Env::Action {
        let actions = node.legal_actions();
        assert!(!actions.is_empty(), "decision node has no legal actions");

        if manager.config.epsilon_exploration > 0.0 && ctx.gen_range_f64() < manager.config.epsilon_exploration {
            let i = ctx.rng.gen_range(0..actions.len());
            return actions[i].clone();
        }

        if !self.uses_prior() {
            if let Some(a) = actions.iter().find(|a| !node.has_child(a)) {
                return a.clone();
            }
        }

        let base_prior = if self.uses_prior() {
            Some(node.ensure_prior(manager))
        } else {
            None
        };
        let prior = base_prior
            .as_ref()
            .map(|p| self.root_prior(node, manager, ctx, p, &actions));

        let total_visits = node.get_num_visits();
        let bias = manager.bias();
        let mut best_idx = 0usize;
        let mut best_score = f64::NEG_INFINITY;
        let mut tied = Vec::new();

        for (i, a) in actions.iter().enumerate() {
            let child = if node.has_child(a) {
                Some(node.get_child(a))
            } else {
                None
            };
            let child_visits = child.as_ref().map(|c| c.get_num_visits()).unwrap_or(0);
            // UCT reads the empirical mean; PUCT/AlphaGo read the DP value
            // (§4.D.1) — only one of the two is ever written per algorithm.
            // Both are stored in one fixed canonical orientation (never
            // mover-relative); `q_tilde` applies the §4.D.1 sign flip for
            // this node's own `is_opponent`.
            let q = child
                .as_ref()
                .map(|c| {
                    c.with_inner(|inner| match self.variant {
                        UcbVariant::Uct => inner.empirical_mean,
                        UcbVariant::Puct | UcbVariant::AlphaGo => inner.dp_value,
                    })
                })
                .unwrap_or(manager.config.default_q_value);
            let q = if node.is_opponent { -q } else { q };

            let score = match self.variant {
                UcbVariant::Uct => {
                    if child_visits == 0 {
                        f64::INFINITY
                    } else {
                        q + bias * ((total_visits.max(1) as f64).ln() / child_visits as f64).sqrt()
                    }
                }
                UcbVariant::Puct | UcbVariant::AlphaGo => {
                    let p = prior.as_ref().map(|p| p[i]).unwrap_or(1.0);
                    q + bias * manager.config.prior_policy_search_weight * p
                        * self.ucb_term(total_visits, child_visits, &manager.config)
                }
            };

            if score > best_score {
                best_score = score;
                best_idx = i;
                tied.clear();
                tied.push(i);
            } else if score == best_score {
                tied.push(i);
            }
        }

        let chosen = if tied.len() > 1 {
            tied[ctx.rng.gen_range(0..tied.len())]
        } else {
            best_idx
        };
        actions[chosen].clone()
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
        recommend_by_visits_or_value(node, manager)
    }
}

/// §4.D.3: shared by every algorithm. `most-visited` argmax `n`, ties by
/// empirical mean; `best-value` argmax the algorithm's own value field.
pub fn recommend_by_visits_or_value<Env: Environment>(
    node: &DecisionNode<Env>,
    manager: &Manager<Env>,
) -> Env::Action {
    let actions = node.legal_actions();
    assert!(!actions.is_empty());
    if !actions.iter().any(|a| node.has_child(a)) {
        return actions[0].clone();
    }

    let mut best_idx = 0usize;
    let mut best_score = f64::NEG_INFINITY;
    let mut best_tiebreak = f64::NEG_INFINITY;
    for (i, a) in actions.iter().enumerate() {
        let Some(child) = (if node.has_child(a) { Some(node.get_child(a)) } else { None }) else {
            continue;
        };
        // best-value picks the action best for *this* node's mover (§4.D.3);
        // values are stored canonically, so the opponent's best move
        // maximizes the negated value.
        let mean = child.with_inner(|inner| inner.empirical_mean);
        let mean = if node.is_opponent { -mean } else { mean };
        let (score, tiebreak) = if manager.config.recommend_most_visited {
            // most-visited ties are broken by empirical mean (§4.D.3).
            (child.get_num_visits() as f64, mean)
        } else {
            let raw = child.with_inner(|inner| {
                if manager.config.use_dp_value {
                    inner.dp_value
                } else if manager.config.algorithm.is_softmax_family() {
                    inner.soft_value
                } else {
                    inner.empirical_mean
                }
            });
            let raw = if node.is_opponent { -raw } else { raw };
            (raw, f64::NEG_INFINITY)
        };
        if score > best_score || (score == best_score && tiebreak > best_tiebreak) {
            best_score = score;
            best_tiebreak = tiebreak;
            best_idx = i;
        }
    }
    actions[best_idx].clone()
}

/// Alias-table refresh policy shared by the softmax family (§4.D.2, design
/// note 9): rebuild every `alias_recompute_freq * |A|` backups, or sooner
/// if `avoid_children_under_construction` changes the eligible support by
/// more than 25%.
pub(crate) fn alias_needs_rebuild(
    existing: &Option<AliasTable>,
    backups_since: u32,
    recompute_freq: u32,
    support_len: usize,
    last_support_len: usize,
) -> bool {
    if existing.is_none() {
        return true;
    }
    let threshold = (recompute_freq.max(1) as usize) * support_len.max(1);
    if backups_since as usize >= threshold {
        return true;
    }
    if last_support_len > 0 {
        let delta = (support_len as f64 - last_support_len as f64).abs() / last_support_len as f64;
        if delta > 0.25 {
            return true;
        }
    }
    false
}
