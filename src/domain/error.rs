//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::node::NodeId;

/// Tree errors represent structural rule violations.
/// They are raised where detected and never recovered internally.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("duplicate key '{key}' under node '{parent}'")]
    DuplicateKey { key: String, parent: String },

    #[error("node '{key}' not found while resolving '{path}'")]
    NodeNotFound { key: String, path: String },

    #[error("node '{key}' has no children")]
    ChildrenNotFound { key: String },

    #[error("action not allowed on node '{key}': {reason}")]
    ActionNotAllowed { key: String, reason: String },

    #[error("invalid key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("stale node handle: {0}")]
    InvalidNode(NodeId),
}

impl TreeError {
    pub(crate) fn not_allowed(key: &str, reason: impl Into<String>) -> Self {
        TreeError::ActionNotAllowed {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type for tree operations.
pub type TreeResult<T> = Result<T, TreeError>;
