//! §4.D/§4.E and design note 9: a single node type per kind (D/C),
//! polymorphic over two traits instead of the UCT→PUCT→AlphaGo /
//! MENTS→DBMENTS→DENTS inheritance chains in the source. Algorithm identity
//! is a `(Box<dyn SelectPolicy>, Box<dyn BackupPolicy>)` pair plus the
//! `SearchConfig` record (§6), assembled once by `build` and shared by every
//! node through the `Manager`.

pub mod alias;
pub mod backup;
pub mod dirichlet;
pub mod softmax;
pub mod temperature;
pub mod ucb;

use crate::config::{Algorithm, SearchConfig};
use crate::env::Environment;
use crate::error::EnvironmentError;
use crate::manager::{Context, Manager};
use crate::node::{ChanceNode, DecisionNode};
use crate::types::Reward;
use std::sync::Arc;

/// Node-local action/observation selection. Shared by every node of a given
/// kind; variant behaviour (UCT vs PUCT vs AlphaGo, or the softmax kernels)
/// lives entirely inside the implementor.
pub trait SelectPolicy<Env: Environment>: Send + Sync {
    fn select_action(
        &self,
        node: &DecisionNode<Env>,
        manager: &Manager<Env>,
        ctx: &mut Context,
    ) -> Env::Action;

    fn sample_observation(
        &self,
        node: &ChanceNode<Env>,
        next_state: &Env::State,
        manager: &Manager<Env>,
        ctx: &mut Context,
    ) -> Result<Env::Observation, EnvironmentError>;

    /// §4.D.3: called once after the search completes.
    fn recommend_action(&self, node: &DecisionNode<Env>, manager: &Manager<Env>) -> Env::Action;
}

/// Node-local value propagation, invoked under the node lock (§4.E).
pub trait BackupPolicy<Env: Environment>: Send + Sync {
    fn backup_decision(&self, node: &DecisionNode<Env>, manager: &Manager<Env>, g: Reward);
    fn backup_chance(&self, node: &ChanceNode<Env>, manager: &Manager<Env>, g: Reward);
}

/// Builds the `(select, backup)` pair for a resolved `Algorithm`. The two
/// Open Questions from spec §9 are resolved here once and documented in
/// `DESIGN.md`: PUCT uses a single canonical default set
/// (`puct_power=0.5`, bias inherited from UCT's `AUTO_BIAS`), and AlphaGo
/// Dirichlet noise is redrawn on every root visit unless
/// `dirichlet_redraw_once_per_trial` is set.
pub fn build<Env: Environment + 'static>(
    config: &SearchConfig,
) -> (Arc<dyn SelectPolicy<Env>>, Arc<dyn BackupPolicy<Env>>) {
    match config.algorithm {
        Algorithm::Uct => (
            Arc::new(ucb::Ucb::new(ucb::UcbVariant::Uct)),
            Arc::new(backup::EmpiricalMeanBackup),
        ),
        Algorithm::Puct => (
            Arc::new(ucb::Ucb::new(ucb::UcbVariant::Puct)),
            Arc::new(backup::DynamicProgrammingBackup),
        ),
        Algorithm::AlphaGo => (
            Arc::new(ucb::Ucb::new(ucb::UcbVariant::AlphaGo)),
            Arc::new(backup::DynamicProgrammingBackup),
        ),
        Algorithm::Ments => (
            Arc::new(softmax::Softmax::new(softmax::SoftmaxVariant::Ments)),
            Arc::new(backup::EntropyBackup::new(softmax::SoftmaxVariant::Ments)),
        ),
        Algorithm::Rents => (
            Arc::new(softmax::Softmax::new(softmax::SoftmaxVariant::Rents)),
            Arc::new(backup::EntropyBackup::new(softmax::SoftmaxVariant::Rents)),
        ),
        Algorithm::Tents => (
            Arc::new(softmax::Softmax::new(softmax::SoftmaxVariant::Tents)),
            Arc::new(backup::EntropyBackup::new(softmax::SoftmaxVariant::Tents)),
        ),
        Algorithm::Dents => (
            Arc::new(softmax::Softmax::new(softmax::SoftmaxVariant::Dents)),
            Arc::new(backup::EntropyBackup::new(softmax::SoftmaxVariant::Dents)),
        ),
        Algorithm::Est => (
            Arc::new(softmax::Softmax::new(softmax::SoftmaxVariant::Est)),
            Arc::new(backup::EmpiricalMeanBackup),
        ),
    }
}
