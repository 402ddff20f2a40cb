//! §3/§4.C: the alternating decision/chance node graph. One concrete struct
//! per node kind, shared (`Arc`) rather than tree-owned, so a transposition
//! table can coalesce the tree into a DAG without changing any call site.

pub mod chance;
pub mod decision;

pub use chance::ChanceNode;
pub use decision::DecisionNode;

use crate::env::Environment;
use std::sync::Arc;

/// One stop on the path a trial walks, used by the driver so that backup
/// can replay the path in reverse without nodes needing owning parent
/// pointers (design note 9: parent back-references are the one thing we
/// drop entirely, since nothing actually needs to walk upward through the
/// graph itself — the driver already holds the path).
#[derive(Clone)]
pub enum NodeHandle<Env: Environment> {
    Decision(Arc<DecisionNode<Env>>),
    Chance(Arc<ChanceNode<Env>>),
}
