//! Node storage shared by the keyed and indexed tree variants.

use std::fmt;

use generational_arena::{Arena, Index};
use indexmap::IndexMap;
use tracing::instrument;

use crate::domain::error::{TreeError, TreeResult};

/// Key reserved for root nodes.
pub const ROOT_KEY: &str = "/";

/// Separator between keys in a node path.
pub const PATH_SEPARATOR: char = '.';

/// Handle to a node in a tree's arena.
///
/// Handles are cheap to copy and never own the node they point at. A handle
/// becomes stale once its node is freed; using it afterwards yields
/// [`TreeError::InvalidNode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(Index);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (slot, generation) = self.0.into_raw_parts();
        write!(f, "#{}v{}", slot, generation)
    }
}

/// Naming rules for a tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeSettings {
    /// Key given to nodes created with `new_root`
    pub root_key: String,
    /// Separator between keys in a path
    pub path_separator: char,
}

impl Default for TreeSettings {
    fn default() -> Self {
        Self {
            root_key: ROOT_KEY.to_string(),
            path_separator: PATH_SEPARATOR,
        }
    }
}

/// Children container of a node.
pub trait ChildStore: Default + fmt::Debug {
    /// Child handles in iteration order.
    fn ids(&self) -> Vec<NodeId>;

    fn count(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.count() == 0
    }
}

impl ChildStore for Vec<NodeId> {
    fn ids(&self) -> Vec<NodeId> {
        self.clone()
    }

    fn count(&self) -> usize {
        self.len()
    }
}

impl ChildStore for IndexMap<String, NodeId> {
    fn ids(&self) -> Vec<NodeId> {
        self.values().copied().collect()
    }

    fn count(&self) -> usize {
        self.len()
    }
}

/// Tree node in the arena.
#[derive(Debug)]
pub struct Node<T, C> {
    pub(crate) key: String,
    pub(crate) data: Option<T>,
    /// Non-owning back-reference, `None` for roots
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: C,
}

impl<T, C: ChildStore> Node<T, C> {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &C {
        &self.children
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Arena storage holding every node of one tree value.
///
/// Several disconnected trees may share an arena: freshly created nodes are
/// standalone roots until they are attached somewhere.
#[derive(Debug)]
pub(crate) struct NodeArena<T, C> {
    arena: Arena<Node<T, C>>,
    settings: TreeSettings,
}

impl<T, C: ChildStore> NodeArena<T, C> {
    pub(crate) fn new(settings: TreeSettings) -> Self {
        Self {
            arena: Arena::new(),
            settings,
        }
    }

    pub(crate) fn settings(&self) -> &TreeSettings {
        &self.settings
    }

    pub(crate) fn len(&self) -> usize {
        self.arena.len()
    }

    pub(crate) fn get(&self, id: NodeId) -> Option<&Node<T, C>> {
        self.arena.get(id.0)
    }

    pub(crate) fn node(&self, id: NodeId) -> TreeResult<&Node<T, C>> {
        self.arena.get(id.0).ok_or(TreeError::InvalidNode(id))
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> TreeResult<&mut Node<T, C>> {
        self.arena.get_mut(id.0).ok_or(TreeError::InvalidNode(id))
    }

    pub(crate) fn key(&self, id: NodeId) -> TreeResult<&str> {
        Ok(self.node(id)?.key())
    }

    #[instrument(level = "trace", skip(self, data))]
    pub(crate) fn insert(&mut self, key: String, data: Option<T>) -> TreeResult<NodeId> {
        self.validate_key(&key)?;
        let idx = self.arena.insert(Node {
            key,
            data,
            parent: None,
            children: C::default(),
        });
        Ok(NodeId(idx))
    }

    fn validate_key(&self, key: &str) -> TreeResult<()> {
        if key.is_empty() {
            return Err(TreeError::InvalidKey {
                key: key.to_string(),
                reason: "key must not be empty".to_string(),
            });
        }
        if key.contains(self.settings.path_separator) {
            return Err(TreeError::InvalidKey {
                key: key.to_string(),
                reason: format!(
                    "key must not contain the path separator '{}'",
                    self.settings.path_separator
                ),
            });
        }
        Ok(())
    }

    /// Checks that `child` is a standalone root that may be placed under `parent`.
    pub(crate) fn ensure_attachable(&self, parent: NodeId, child: NodeId) -> TreeResult<()> {
        self.node(parent)?;
        let node = self.node(child)?;
        if node.parent.is_some() {
            return Err(TreeError::not_allowed(
                node.key(),
                "node is already attached to a parent",
            ));
        }
        let mut current = Some(parent);
        while let Some(ancestor) = current {
            if ancestor == child {
                return Err(TreeError::not_allowed(
                    node.key(),
                    "node cannot be attached beneath itself",
                ));
            }
            current = self.get(ancestor).and_then(|n| n.parent);
        }
        Ok(())
    }

    pub(crate) fn set_parent(&mut self, id: NodeId, parent: Option<NodeId>) -> TreeResult<()> {
        self.node_mut(id)?.parent = parent;
        Ok(())
    }

    /// Clears the parent of every node in `ids`.
    pub(crate) fn detach_all(&mut self, ids: &[NodeId]) -> TreeResult<()> {
        for &id in ids {
            self.set_parent(id, None)?;
        }
        Ok(())
    }

    /// Releases a standalone subtree, returning the number of freed nodes.
    #[instrument(level = "debug", skip(self))]
    pub(crate) fn free(&mut self, id: NodeId) -> TreeResult<usize> {
        let node = self.node(id)?;
        if !node.is_root() {
            return Err(TreeError::not_allowed(
                node.key(),
                "only detached nodes can be freed",
            ));
        }
        let mut stack = vec![id];
        let mut freed = 0;
        while let Some(current) = stack.pop() {
            if let Some(node) = self.arena.remove(current.0) {
                stack.extend(node.children.ids());
                freed += 1;
            }
        }
        Ok(freed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    type VecArena = NodeArena<u32, Vec<NodeId>>;

    fn arena() -> VecArena {
        NodeArena::new(TreeSettings::default())
    }

    #[rstest]
    #[case("")]
    #[case("a.b")]
    #[case(".")]
    fn given_invalid_key_when_inserting_then_rejects(#[case] key: &str) {
        let mut nodes = arena();
        let result = nodes.insert(key.to_string(), None);
        assert!(matches!(result, Err(TreeError::InvalidKey { .. })));
        assert_eq!(nodes.len(), 0);
    }

    #[test]
    fn given_custom_separator_when_inserting_dotted_key_then_accepts() {
        let mut nodes: VecArena = NodeArena::new(TreeSettings {
            root_key: "root".to_string(),
            path_separator: '/',
        });
        assert!(nodes.insert("a.b".to_string(), None).is_ok());
        assert!(nodes.insert("a/b".to_string(), None).is_err());
    }

    #[test]
    fn given_attached_node_when_checking_attachable_then_not_allowed() {
        let mut nodes = arena();
        let a = nodes.insert("a".into(), None).unwrap();
        let b = nodes.insert("b".into(), None).unwrap();
        let c = nodes.insert("c".into(), None).unwrap();
        nodes.set_parent(b, Some(a)).unwrap();
        nodes.node_mut(a).unwrap().children.push(b);

        assert!(matches!(
            nodes.ensure_attachable(c, b),
            Err(TreeError::ActionNotAllowed { .. })
        ));
        // a is an ancestor of b
        assert!(matches!(
            nodes.ensure_attachable(b, a),
            Err(TreeError::ActionNotAllowed { .. })
        ));
        assert!(nodes.ensure_attachable(b, c).is_ok());
    }

    #[test]
    fn given_standalone_subtree_when_freed_then_handles_become_stale() {
        let mut nodes = arena();
        let a = nodes.insert("a".into(), Some(1)).unwrap();
        let b = nodes.insert("b".into(), Some(2)).unwrap();
        nodes.set_parent(b, Some(a)).unwrap();
        nodes.node_mut(a).unwrap().children.push(b);

        assert!(nodes.free(b).is_err(), "attached node must not be freed");
        assert_eq!(nodes.free(a).unwrap(), 2);
        assert_eq!(nodes.node(b).unwrap_err(), TreeError::InvalidNode(b));
        assert_eq!(nodes.len(), 0);
    }

    #[test]
    fn given_node_id_when_displayed_then_shows_slot_and_generation() {
        let mut nodes = arena();
        let a = nodes.insert("a".into(), None).unwrap();
        assert_eq!(a.to_string(), "#0v0");
    }
}
