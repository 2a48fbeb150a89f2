//! Capability traits shared by the tree variants and their observable wrapper.
//!
//! * [`Tree`]: node identity, traversal and path resolution
//! * [`TreeMutation`]: add/remove operations common to both variants
//! * [`PositionalMutation`]: index-based operations, indexed variant only

use uuid::Uuid;

use crate::domain::error::{TreeError, TreeResult};
use crate::domain::node::{ChildStore, Node, NodeId, TreeSettings};

/// Read access to a tree: node identity, traversal and path resolution.
pub trait Tree {
    /// Payload carried by each node.
    type Data;
    /// Children container of each node.
    type Children: ChildStore;
    /// Whether the tree supports positional insertion.
    const POSITIONAL: bool;

    fn settings(&self) -> &TreeSettings;

    /// Creates a standalone node (a root until it is attached).
    fn new_node(&mut self, key: impl Into<String>, data: Option<Self::Data>) -> TreeResult<NodeId>;

    fn get(&self, id: NodeId) -> Option<&Node<Self::Data, Self::Children>>;

    /// First direct child of `id` carrying `key`.
    fn child_by_key(&self, id: NodeId, key: &str) -> TreeResult<Option<NodeId>>;

    /// Releases a detached subtree, returning the number of freed nodes.
    fn free(&mut self, id: NodeId) -> TreeResult<usize>;

    /// Number of live nodes in the arena, across all disconnected trees.
    fn node_count(&self) -> usize;

    /// Creates a standalone node keyed with the root key.
    fn new_root(&mut self) -> TreeResult<NodeId> {
        let key = self.settings().root_key.clone();
        self.new_node(key, None)
    }

    /// Creates a standalone node with a random unique key.
    fn new_unkeyed(&mut self, data: Option<Self::Data>) -> TreeResult<NodeId> {
        self.new_node(Uuid::new_v4().to_string(), data)
    }

    fn node(&self, id: NodeId) -> TreeResult<&Node<Self::Data, Self::Children>> {
        self.get(id).ok_or(TreeError::InvalidNode(id))
    }

    fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    fn key(&self, id: NodeId) -> TreeResult<&str> {
        Ok(self.node(id)?.key())
    }

    fn data(&self, id: NodeId) -> TreeResult<Option<&Self::Data>> {
        Ok(self.node(id)?.data())
    }

    fn parent(&self, id: NodeId) -> TreeResult<Option<NodeId>> {
        Ok(self.node(id)?.parent())
    }

    fn is_root(&self, id: NodeId) -> TreeResult<bool> {
        Ok(self.node(id)?.is_root())
    }

    fn is_leaf(&self, id: NodeId) -> TreeResult<bool> {
        Ok(self.node(id)?.is_leaf())
    }

    /// Number of direct children.
    fn child_count(&self, id: NodeId) -> TreeResult<usize> {
        Ok(self.node(id)?.children().count())
    }

    /// Direct children in iteration order.
    fn children(&self, id: NodeId) -> TreeResult<Vec<NodeId>> {
        Ok(self.node(id)?.children().ids())
    }

    /// Parent chain of `id`, nearest first, excluding `id` itself.
    fn ancestors(&self, id: NodeId) -> Ancestors<'_, Self>
    where
        Self: Sized,
    {
        Ancestors {
            tree: self,
            next: self.get(id).and_then(|n| n.parent()),
        }
    }

    /// Resolves the root by walking parent references.
    fn root(&self, id: NodeId) -> TreeResult<NodeId>
    where
        Self: Sized,
    {
        self.node(id)?;
        Ok(self.ancestors(id).last().unwrap_or(id))
    }

    /// Number of ancestors above `id`.
    fn level(&self, id: NodeId) -> TreeResult<usize>
    where
        Self: Sized,
    {
        self.node(id)?;
        Ok(self.ancestors(id).count())
    }

    /// Separator-joined keys from the topmost ancestor down to `id`.
    ///
    /// A top node keyed with the root key is left out, so that
    /// `element_at(root(id), path(id))` resolves back to `id`.
    fn path(&self, id: NodeId) -> TreeResult<String>
    where
        Self: Sized,
    {
        let mut keys = vec![self.key(id)?];
        for ancestor in self.ancestors(id) {
            keys.push(self.key(ancestor)?);
        }
        keys.reverse();
        if keys.first() == Some(&self.settings().root_key.as_str()) {
            keys.remove(0);
        }
        Ok(keys.join(&self.settings().path_separator.to_string()))
    }

    /// Resolves a separator-delimited path of keys starting at `id`.
    ///
    /// A leading root key, or a leading segment equal to the key of `id`, is
    /// skipped. Empty segments are ignored.
    fn element_at(&self, id: NodeId, path: &str) -> TreeResult<NodeId> {
        let settings = self.settings();
        let receiver_key = self.key(id)?;
        let mut segments = path
            .split(settings.path_separator)
            .filter(|segment| !segment.is_empty())
            .peekable();
        if let Some(first) = segments.peek() {
            if *first == settings.root_key || *first == receiver_key {
                segments.next();
            }
        }

        let mut current = id;
        for segment in segments {
            current = self
                .child_by_key(current, segment)?
                .ok_or_else(|| TreeError::NodeNotFound {
                    key: segment.to_string(),
                    path: path.to_string(),
                })?;
        }
        Ok(current)
    }

    /// Pre-order traversal of the subtree rooted at `id`, `id` included.
    fn descendants(&self, id: NodeId) -> PreOrder<'_, Self>
    where
        Self: Sized,
    {
        let stack = if self.contains(id) { vec![id] } else { Vec::new() };
        PreOrder { tree: self, stack }
    }

    /// Height of the subtree rooted at `id`; a leaf has depth 1.
    fn depth(&self, id: NodeId) -> TreeResult<usize> {
        self.node(id)?;
        let mut stack = vec![(id, 1)];
        let mut max = 0;
        while let Some((current, level)) = stack.pop() {
            max = max.max(level);
            for child in self.children(current)? {
                stack.push((child, level + 1));
            }
        }
        Ok(max)
    }

    /// Leaf nodes of the subtree rooted at `id`, in pre-order.
    fn leaves(&self, id: NodeId) -> TreeResult<Vec<NodeId>>
    where
        Self: Sized,
    {
        self.node(id)?;
        Ok(self
            .descendants(id)
            .filter(|&n| self.get(n).is_some_and(|node| node.is_leaf()))
            .collect())
    }
}

/// Structural mutations shared by both variants.
///
/// Every operation keeps `child.parent == parent` for all attached children.
/// Removed nodes are detached: their parent is cleared and they become
/// standalone roots that may be attached again or freed.
pub trait TreeMutation: Tree {
    fn add(&mut self, parent: NodeId, child: NodeId) -> TreeResult<()>;

    /// Adds each child in turn.
    ///
    /// Not all-or-nothing: children added before a failing one stay attached.
    fn add_all(&mut self, parent: NodeId, children: &[NodeId]) -> TreeResult<()> {
        for &child in children {
            self.add(parent, child)?;
        }
        Ok(())
    }

    /// Removes the child of `parent` carrying the key of `child`.
    ///
    /// Returns the node actually detached, if any.
    fn remove(&mut self, parent: NodeId, child: NodeId) -> TreeResult<Option<NodeId>>;

    /// Removes each child in turn; earlier removals stay in effect on failure.
    fn remove_all(&mut self, parent: NodeId, children: &[NodeId]) -> TreeResult<Vec<NodeId>> {
        let mut removed = Vec::with_capacity(children.len());
        for &child in children {
            removed.extend(self.remove(parent, child)?);
        }
        Ok(removed)
    }

    /// Removes every direct child matching `predicate`.
    fn remove_where<P>(&mut self, parent: NodeId, predicate: P) -> TreeResult<Vec<NodeId>>
    where
        P: FnMut(&Node<Self::Data, Self::Children>) -> bool;

    /// Removes all direct children.
    fn clear(&mut self, parent: NodeId) -> TreeResult<Vec<NodeId>>;

    /// Asks the parent of `id` to remove it.
    ///
    /// Returns the detached nodes. Root handling differs per variant.
    fn delete(&mut self, id: NodeId) -> TreeResult<Vec<NodeId>>;
}

/// Index-based access and mutation, indexed variant only.
pub trait PositionalMutation: TreeMutation {
    fn first(&self, id: NodeId) -> TreeResult<NodeId>;

    fn last(&self, id: NodeId) -> TreeResult<NodeId>;

    /// Replaces the first child, returning the detached previous one.
    fn set_first(&mut self, id: NodeId, node: NodeId) -> TreeResult<NodeId>;

    /// Replaces the last child, returning the detached previous one.
    fn set_last(&mut self, id: NodeId, node: NodeId) -> TreeResult<NodeId>;

    fn child_at(&self, id: NodeId, index: usize) -> TreeResult<Option<NodeId>>;

    fn index_where<P>(&self, id: NodeId, predicate: P, start: usize) -> TreeResult<Option<usize>>
    where
        P: FnMut(&Node<Self::Data, Self::Children>) -> bool;

    fn first_where<P>(&self, id: NodeId, predicate: P) -> TreeResult<Option<NodeId>>
    where
        P: FnMut(&Node<Self::Data, Self::Children>) -> bool;

    fn last_where<P>(&self, id: NodeId, predicate: P) -> TreeResult<Option<NodeId>>
    where
        P: FnMut(&Node<Self::Data, Self::Children>) -> bool;

    fn first_where_or<P, F>(&self, id: NodeId, predicate: P, or_else: F) -> TreeResult<NodeId>
    where
        P: FnMut(&Node<Self::Data, Self::Children>) -> bool,
        F: FnOnce() -> NodeId,
    {
        Ok(self.first_where(id, predicate)?.unwrap_or_else(or_else))
    }

    fn last_where_or<P, F>(&self, id: NodeId, predicate: P, or_else: F) -> TreeResult<NodeId>
    where
        P: FnMut(&Node<Self::Data, Self::Children>) -> bool,
        F: FnOnce() -> NodeId,
    {
        Ok(self.last_where(id, predicate)?.unwrap_or_else(or_else))
    }

    /// Inserts `node` at `index`.
    ///
    /// # Panics
    /// If `index` is greater than the number of children.
    fn insert(&mut self, id: NodeId, index: usize, node: NodeId) -> TreeResult<()>;

    /// Inserts `nodes` starting at `index`, keeping their order.
    ///
    /// Not all-or-nothing: nodes inserted before a failing one stay attached.
    ///
    /// # Panics
    /// If `index` is greater than the number of children.
    fn insert_all(&mut self, id: NodeId, index: usize, nodes: &[NodeId]) -> TreeResult<()> {
        for (offset, &node) in nodes.iter().enumerate() {
            self.insert(id, index + offset, node)?;
        }
        Ok(())
    }

    /// Inserts `node` right after the sibling keyed like `anchor`.
    fn insert_after(&mut self, id: NodeId, anchor: NodeId, node: NodeId) -> TreeResult<usize>;

    /// Inserts `node` right before the sibling keyed like `anchor`.
    fn insert_before(&mut self, id: NodeId, anchor: NodeId, node: NodeId) -> TreeResult<usize>;

    /// Removes and returns the child at `index`.
    ///
    /// # Panics
    /// If `index` is out of bounds.
    fn remove_at(&mut self, id: NodeId, index: usize) -> TreeResult<NodeId>;
}

/// Iterator over the parent chain of a node.
pub struct Ancestors<'a, Tr> {
    tree: &'a Tr,
    next: Option<NodeId>,
}

impl<Tr: Tree> Iterator for Ancestors<'_, Tr> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.tree.get(current).and_then(|n| n.parent());
        Some(current)
    }
}

/// Pre-order iterator over a subtree.
pub struct PreOrder<'a, Tr> {
    tree: &'a Tr,
    stack: Vec<NodeId>,
}

impl<Tr: Tree> Iterator for PreOrder<'_, Tr> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;
        if let Some(node) = self.tree.get(current) {
            // Push children in reverse order for left-to-right traversal
            self.stack.extend(node.children().ids().into_iter().rev());
        }
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{IndexedTree, KeyedTree};
    use rstest::rstest;

    fn unkeyed_pair<Tr: Tree<Data = u32>>(mut tree: Tr) {
        let first = tree.new_unkeyed(Some(1)).unwrap();
        let second = tree.new_unkeyed(None).unwrap();

        let key = tree.key(first).unwrap();
        assert!(Uuid::parse_str(key).is_ok(), "key {key} is not a uuid");
        assert_ne!(key, tree.key(second).unwrap());
        assert_eq!(tree.data(first).unwrap(), Some(&1));
        assert!(tree.is_root(first).unwrap());
        assert!(tree.is_leaf(first).unwrap());
    }

    #[rstest]
    #[case::keyed(true)]
    #[case::indexed(false)]
    fn given_tree_when_creating_unkeyed_nodes_then_keys_are_unique_uuids(#[case] keyed: bool) {
        if keyed {
            unkeyed_pair(KeyedTree::new());
        } else {
            unkeyed_pair(IndexedTree::new());
        }
    }

    #[test]
    fn given_unkeyed_children_when_adding_to_keyed_tree_then_no_collision() {
        let mut tree: KeyedTree<u32> = KeyedTree::new();
        let root = tree.new_root().unwrap();
        let children: Vec<NodeId> = (0..3).map(|i| tree.new_unkeyed(Some(i)).unwrap()).collect();

        tree.add_all(root, &children).unwrap();

        assert_eq!(tree.children(root).unwrap(), children);
    }
}
