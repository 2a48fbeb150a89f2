//! Structured change events surfaced at the root of a tree.

use crate::domain::NodeId;

/// Nodes appended to a parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeAddEvent {
    pub items: Vec<NodeId>,
}

/// Nodes detached from a parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRemoveEvent {
    pub items: Vec<NodeId>,
}

/// Nodes inserted at a position; `index` is where the first item landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeInsertEvent {
    pub items: Vec<NodeId>,
    pub index: usize,
}

/// Common view over the event kinds.
pub trait NodeEvent: Clone {
    fn items(&self) -> &[NodeId];

    fn is_empty(&self) -> bool {
        self.items().is_empty()
    }
}

impl NodeEvent for NodeAddEvent {
    fn items(&self) -> &[NodeId] {
        &self.items
    }
}

impl NodeEvent for NodeRemoveEvent {
    fn items(&self) -> &[NodeId] {
        &self.items
    }
}

impl NodeEvent for NodeInsertEvent {
    fn items(&self) -> &[NodeId] {
        &self.items
    }
}
