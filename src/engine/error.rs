//! Contract failures of the engine.
//!
//! These are the only conditions that abort an operation. Unresolved,
//! ambiguous and malformed content is never an error; it is reported through
//! validation findings.

use thiserror::Error;

use crate::base::{ArtifactId, NodeId};
use crate::model::{ElementKind, NodeState};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// A lifecycle step was requested out of order.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Unknown node: {0}")]
    UnknownNode(NodeId),

    #[error("Unknown artifact: {0}")]
    UnknownArtifact(ArtifactId),

    #[error("No edit transaction is open")]
    NoTransaction,

    #[error("An edit transaction is already open")]
    TransactionOpen,

    /// Raw content may only change between `begin_edit` and `commit_edit`.
    #[error("Node {0} is not being edited")]
    NotEditing(NodeId),

    #[error("Node {node} ({kind}) has no name to rename")]
    NotRenamable { node: NodeId, kind: ElementKind },
}

impl EngineError {
    /// A step needed `required` but the node was in `actual`.
    pub fn wrong_state(node: NodeId, step: &str, actual: NodeState, required: NodeState) -> Self {
        Self::InvariantViolation(format!(
            "cannot {step} {node}: node is {actual:?}, expected at least {required:?}"
        ))
    }
}
