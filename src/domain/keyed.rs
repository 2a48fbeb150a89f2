//! Keyed tree: children stored by unique key.

use indexmap::IndexMap;
use tracing::{debug, instrument};

use crate::domain::error::{TreeError, TreeResult};
use crate::domain::node::{Node, NodeArena, NodeId, TreeSettings};
use crate::domain::traits::{Tree, TreeMutation};

/// Children of a keyed node, in insertion order.
pub type KeyedChildren = IndexMap<String, NodeId>;

pub type KeyedNode<T> = Node<T, KeyedChildren>;

/// Tree whose children are looked up by key in O(1).
///
/// Sibling keys are unique; adding a second child with the same key fails
/// with [`TreeError::DuplicateKey`]. Removing a key that is not present is
/// not an error.
#[derive(Debug)]
pub struct KeyedTree<T> {
    nodes: NodeArena<T, KeyedChildren>,
}

impl<T> Default for KeyedTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> KeyedTree<T> {
    pub fn new() -> Self {
        Self::with_settings(TreeSettings::default())
    }

    pub fn with_settings(settings: TreeSettings) -> Self {
        Self {
            nodes: NodeArena::new(settings),
        }
    }

    fn take_children(&mut self, parent: NodeId) -> TreeResult<KeyedChildren> {
        Ok(std::mem::take(&mut self.nodes.node_mut(parent)?.children))
    }
}

impl<T> Tree for KeyedTree<T> {
    type Data = T;
    type Children = KeyedChildren;
    const POSITIONAL: bool = false;

    fn settings(&self) -> &TreeSettings {
        self.nodes.settings()
    }

    fn new_node(&mut self, key: impl Into<String>, data: Option<T>) -> TreeResult<NodeId> {
        self.nodes.insert(key.into(), data)
    }

    fn get(&self, id: NodeId) -> Option<&KeyedNode<T>> {
        self.nodes.get(id)
    }

    fn child_by_key(&self, id: NodeId, key: &str) -> TreeResult<Option<NodeId>> {
        Ok(self.nodes.node(id)?.children.get(key).copied())
    }

    fn free(&mut self, id: NodeId) -> TreeResult<usize> {
        self.nodes.free(id)
    }

    fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

impl<T> TreeMutation for KeyedTree<T> {
    #[instrument(level = "trace", skip(self))]
    fn add(&mut self, parent: NodeId, child: NodeId) -> TreeResult<()> {
        let key = self.nodes.key(child)?.to_string();
        let parent_node = self.nodes.node(parent)?;
        if parent_node.children.contains_key(&key) {
            return Err(TreeError::DuplicateKey {
                key,
                parent: parent_node.key.clone(),
            });
        }
        self.nodes.ensure_attachable(parent, child)?;

        self.nodes.set_parent(child, Some(parent))?;
        self.nodes.node_mut(parent)?.children.insert(key, child);
        debug!(?parent, ?child, "added child");
        Ok(())
    }

    #[instrument(level = "trace", skip(self))]
    fn remove(&mut self, parent: NodeId, child: NodeId) -> TreeResult<Option<NodeId>> {
        let key = self.nodes.key(child)?.to_string();
        let removed = self.nodes.node_mut(parent)?.children.shift_remove(&key);
        if let Some(removed) = removed {
            self.nodes.set_parent(removed, None)?;
            debug!(?parent, ?removed, "removed child");
        }
        Ok(removed)
    }

    #[instrument(level = "trace", skip(self, predicate))]
    fn remove_where<P>(&mut self, parent: NodeId, mut predicate: P) -> TreeResult<Vec<NodeId>>
    where
        P: FnMut(&KeyedNode<T>) -> bool,
    {
        let children = self.take_children(parent)?;
        let (removed, kept): (KeyedChildren, KeyedChildren) = children
            .into_iter()
            .partition(|(_, child)| self.nodes.get(*child).is_some_and(&mut predicate));
        self.nodes.node_mut(parent)?.children = kept;

        let removed: Vec<NodeId> = removed.into_values().collect();
        self.nodes.detach_all(&removed)?;
        debug!(?parent, count = removed.len(), "removed matching children");
        Ok(removed)
    }

    #[instrument(level = "trace", skip(self))]
    fn clear(&mut self, parent: NodeId) -> TreeResult<Vec<NodeId>> {
        let removed: Vec<NodeId> = self.take_children(parent)?.into_values().collect();
        self.nodes.detach_all(&removed)?;
        debug!(?parent, count = removed.len(), "cleared children");
        Ok(removed)
    }

    /// Fails with [`TreeError::ActionNotAllowed`] when `id` is a root.
    #[instrument(level = "trace", skip(self))]
    fn delete(&mut self, id: NodeId) -> TreeResult<Vec<NodeId>> {
        let parent = self.nodes.node(id)?.parent;
        match parent {
            Some(parent) => Ok(self.remove(parent, id)?.into_iter().collect()),
            None => Err(TreeError::not_allowed(
                self.nodes.key(id)?,
                "a root node cannot delete itself",
            )),
        }
    }
}
