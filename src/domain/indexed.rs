//! Indexed tree: children form an ordered sequence.

use tracing::{debug, instrument};

use crate::domain::error::{TreeError, TreeResult};
use crate::domain::node::{Node, NodeArena, NodeId, TreeSettings};
use crate::domain::traits::{PositionalMutation, Tree, TreeMutation};

/// Children of an indexed node, in positional order.
pub type IndexedChildren = Vec<NodeId>;

pub type IndexedNode<T> = Node<T, IndexedChildren>;

/// Tree whose children keep their position.
///
/// Sibling keys need not be unique; key-based operations use the first
/// sibling with a matching key. Unlike [`KeyedTree`](crate::domain::KeyedTree),
/// removing a key that is not present fails with [`TreeError::NodeNotFound`],
/// and deleting a root clears its children instead of failing.
#[derive(Debug)]
pub struct IndexedTree<T> {
    nodes: NodeArena<T, IndexedChildren>,
}

impl<T> Default for IndexedTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> IndexedTree<T> {
    pub fn new() -> Self {
        Self::with_settings(TreeSettings::default())
    }

    pub fn with_settings(settings: TreeSettings) -> Self {
        Self {
            nodes: NodeArena::new(settings),
        }
    }

    fn child_list(&self, id: NodeId) -> TreeResult<&IndexedChildren> {
        Ok(&self.nodes.node(id)?.children)
    }

    fn child_list_mut(&mut self, id: NodeId) -> TreeResult<&mut IndexedChildren> {
        Ok(&mut self.nodes.node_mut(id)?.children)
    }

    /// Position of the first child of `id` keyed like `sibling`.
    fn position_of(&self, id: NodeId, sibling: NodeId) -> TreeResult<usize> {
        let key = self.nodes.key(sibling)?;
        self.child_list(id)?
            .iter()
            .position(|&c| self.nodes.get(c).is_some_and(|n| n.key == key))
            .ok_or_else(|| TreeError::NodeNotFound {
                key: key.to_string(),
                path: self.child_path(id, key),
            })
    }

    /// Path a child of `id` keyed `key` would have.
    fn child_path(&self, id: NodeId, key: &str) -> String {
        match self.path(id) {
            Ok(parent) if !parent.is_empty() => {
                format!("{}{}{}", parent, self.settings().path_separator, key)
            }
            _ => key.to_string(),
        }
    }

    fn children_not_found(&self, id: NodeId) -> TreeError {
        TreeError::ChildrenNotFound {
            key: self.nodes.key(id).unwrap_or_default().to_string(),
        }
    }

    fn replace_at(&mut self, id: NodeId, index: usize, node: NodeId) -> TreeResult<NodeId> {
        self.nodes.ensure_attachable(id, node)?;
        let previous = std::mem::replace(&mut self.child_list_mut(id)?[index], node);
        self.nodes.set_parent(node, Some(id))?;
        self.nodes.set_parent(previous, None)?;
        debug!(?id, index, ?previous, ?node, "replaced child");
        Ok(previous)
    }
}

impl<T> Tree for IndexedTree<T> {
    type Data = T;
    type Children = IndexedChildren;
    const POSITIONAL: bool = true;

    fn settings(&self) -> &TreeSettings {
        self.nodes.settings()
    }

    fn new_node(&mut self, key: impl Into<String>, data: Option<T>) -> TreeResult<NodeId> {
        self.nodes.insert(key.into(), data)
    }

    fn get(&self, id: NodeId) -> Option<&IndexedNode<T>> {
        self.nodes.get(id)
    }

    fn child_by_key(&self, id: NodeId, key: &str) -> TreeResult<Option<NodeId>> {
        Ok(self
            .child_list(id)?
            .iter()
            .copied()
            .find(|&c| self.nodes.get(c).is_some_and(|n| n.key == key)))
    }

    fn free(&mut self, id: NodeId) -> TreeResult<usize> {
        self.nodes.free(id)
    }

    fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

impl<T> TreeMutation for IndexedTree<T> {
    #[instrument(level = "trace", skip(self))]
    fn add(&mut self, parent: NodeId, child: NodeId) -> TreeResult<()> {
        self.nodes.ensure_attachable(parent, child)?;
        self.nodes.set_parent(child, Some(parent))?;
        self.child_list_mut(parent)?.push(child);
        debug!(?parent, ?child, "added child");
        Ok(())
    }

    /// Fails with [`TreeError::NodeNotFound`] when no child carries the key of `child`.
    #[instrument(level = "trace", skip(self))]
    fn remove(&mut self, parent: NodeId, child: NodeId) -> TreeResult<Option<NodeId>> {
        let index = self.position_of(parent, child)?;
        self.remove_at(parent, index).map(Some)
    }

    #[instrument(level = "trace", skip(self, predicate))]
    fn remove_where<P>(&mut self, parent: NodeId, mut predicate: P) -> TreeResult<Vec<NodeId>>
    where
        P: FnMut(&IndexedNode<T>) -> bool,
    {
        let children = std::mem::take(self.child_list_mut(parent)?);
        let (removed, kept): (Vec<NodeId>, Vec<NodeId>) = children
            .into_iter()
            .partition(|&c| self.nodes.get(c).is_some_and(&mut predicate));
        *self.child_list_mut(parent)? = kept;

        self.nodes.detach_all(&removed)?;
        debug!(?parent, count = removed.len(), "removed matching children");
        Ok(removed)
    }

    #[instrument(level = "trace", skip(self))]
    fn clear(&mut self, parent: NodeId) -> TreeResult<Vec<NodeId>> {
        let removed = std::mem::take(self.child_list_mut(parent)?);
        self.nodes.detach_all(&removed)?;
        debug!(?parent, count = removed.len(), "cleared children");
        Ok(removed)
    }

    /// Clears the children of `id` when it is a root.
    #[instrument(level = "trace", skip(self))]
    fn delete(&mut self, id: NodeId) -> TreeResult<Vec<NodeId>> {
        let parent = self.nodes.node(id)?.parent;
        match parent {
            Some(parent) => Ok(self.remove(parent, id)?.into_iter().collect()),
            None => self.clear(id),
        }
    }
}

impl<T> PositionalMutation for IndexedTree<T> {
    fn first(&self, id: NodeId) -> TreeResult<NodeId> {
        self.child_list(id)?
            .first()
            .copied()
            .ok_or_else(|| self.children_not_found(id))
    }

    fn last(&self, id: NodeId) -> TreeResult<NodeId> {
        self.child_list(id)?
            .last()
            .copied()
            .ok_or_else(|| self.children_not_found(id))
    }

    #[instrument(level = "trace", skip(self))]
    fn set_first(&mut self, id: NodeId, node: NodeId) -> TreeResult<NodeId> {
        self.first(id)?;
        self.replace_at(id, 0, node)
    }

    #[instrument(level = "trace", skip(self))]
    fn set_last(&mut self, id: NodeId, node: NodeId) -> TreeResult<NodeId> {
        self.last(id)?;
        let index = self.child_list(id)?.len() - 1;
        self.replace_at(id, index, node)
    }

    fn child_at(&self, id: NodeId, index: usize) -> TreeResult<Option<NodeId>> {
        Ok(self.child_list(id)?.get(index).copied())
    }

    fn index_where<P>(&self, id: NodeId, mut predicate: P, start: usize) -> TreeResult<Option<usize>>
    where
        P: FnMut(&IndexedNode<T>) -> bool,
    {
        Ok(self
            .child_list(id)?
            .iter()
            .enumerate()
            .skip(start)
            .find(|&(_, &c)| self.nodes.get(c).is_some_and(&mut predicate))
            .map(|(index, _)| index))
    }

    fn first_where<P>(&self, id: NodeId, mut predicate: P) -> TreeResult<Option<NodeId>>
    where
        P: FnMut(&IndexedNode<T>) -> bool,
    {
        Ok(self
            .child_list(id)?
            .iter()
            .copied()
            .find(|&c| self.nodes.get(c).is_some_and(&mut predicate)))
    }

    fn last_where<P>(&self, id: NodeId, mut predicate: P) -> TreeResult<Option<NodeId>>
    where
        P: FnMut(&IndexedNode<T>) -> bool,
    {
        Ok(self
            .child_list(id)?
            .iter()
            .rev()
            .copied()
            .find(|&c| self.nodes.get(c).is_some_and(&mut predicate)))
    }

    #[instrument(level = "trace", skip(self))]
    fn insert(&mut self, id: NodeId, index: usize, node: NodeId) -> TreeResult<()> {
        self.nodes.ensure_attachable(id, node)?;
        let children = self.child_list_mut(id)?;
        assert!(
            index <= children.len(),
            "insertion index {} out of bounds (len {})",
            index,
            children.len()
        );
        children.insert(index, node);
        self.nodes.set_parent(node, Some(id))?;
        debug!(?id, index, ?node, "inserted child");
        Ok(())
    }

    #[instrument(level = "trace", skip(self))]
    fn insert_after(&mut self, id: NodeId, anchor: NodeId, node: NodeId) -> TreeResult<usize> {
        let index = self.position_of(id, anchor)? + 1;
        self.insert(id, index, node)?;
        Ok(index)
    }

    #[instrument(level = "trace", skip(self))]
    fn insert_before(&mut self, id: NodeId, anchor: NodeId, node: NodeId) -> TreeResult<usize> {
        let index = self.position_of(id, anchor)?;
        self.insert(id, index, node)?;
        Ok(index)
    }

    #[instrument(level = "trace", skip(self))]
    fn remove_at(&mut self, id: NodeId, index: usize) -> TreeResult<NodeId> {
        let removed = self.child_list_mut(id)?.remove(index);
        self.nodes.set_parent(removed, None)?;
        debug!(?id, index, ?removed, "removed child");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    struct Fixture {
        tree: IndexedTree<&'static str>,
        root: NodeId,
        a: NodeId,
        b: NodeId,
        c: NodeId,
    }

    /// root -> [A, B, C]
    #[fixture]
    fn sample() -> Fixture {
        let mut tree = IndexedTree::new();
        let root = tree.new_root().unwrap();
        let a = tree.new_node("A", Some("a")).unwrap();
        let b = tree.new_node("B", Some("b")).unwrap();
        let c = tree.new_node("C", Some("c")).unwrap();
        tree.add_all(root, &[a, b, c]).unwrap();
        Fixture { tree, root, a, b, c }
    }

    fn keys(tree: &IndexedTree<&'static str>, id: NodeId) -> Vec<String> {
        tree.children(id)
            .unwrap()
            .into_iter()
            .map(|c| tree.key(c).unwrap().to_string())
            .collect()
    }

    #[rstest]
    fn given_anchor_when_inserting_before_then_lands_in_front(mut sample: Fixture) {
        let x = sample.tree.new_node("X", None).unwrap();
        let index = sample.tree.insert_before(sample.root, sample.b, x).unwrap();

        assert_eq!(index, 1);
        assert_eq!(keys(&sample.tree, sample.root), vec!["A", "X", "B", "C"]);
        assert_eq!(sample.tree.parent(x).unwrap(), Some(sample.root));
    }

    #[rstest]
    fn given_anchor_when_inserting_after_then_index_resolves_to_node(mut sample: Fixture) {
        let x = sample.tree.new_node("X", None).unwrap();
        let index = sample.tree.insert_after(sample.root, sample.c, x).unwrap();

        assert_eq!(index, 3);
        assert_eq!(sample.tree.child_at(sample.root, index).unwrap(), Some(x));
    }

    #[rstest]
    fn given_missing_anchor_when_inserting_after_then_node_not_found(mut sample: Fixture) {
        let ghost = sample.tree.new_node("G", None).unwrap();
        let x = sample.tree.new_node("X", None).unwrap();

        let result = sample.tree.insert_after(sample.root, ghost, x);

        assert!(matches!(result, Err(TreeError::NodeNotFound { ref key, .. }) if key == "G"));
        assert_eq!(keys(&sample.tree, sample.root), vec!["A", "B", "C"]);
        assert!(sample.tree.is_root(x).unwrap());
    }

    #[rstest]
    fn given_duplicate_keys_when_looking_up_then_first_match_wins(mut sample: Fixture) {
        let second_a = sample.tree.new_node("A", Some("a2")).unwrap();
        sample.tree.add(sample.root, second_a).unwrap();

        assert_eq!(sample.tree.element_at(sample.root, "A").unwrap(), sample.a);
        assert_eq!(sample.tree.remove(sample.root, second_a).unwrap(), Some(sample.a));
        assert_eq!(keys(&sample.tree, sample.root), vec!["B", "C", "A"]);
    }

    #[rstest]
    fn given_absent_key_when_removing_then_node_not_found(mut sample: Fixture) {
        let stranger = sample.tree.new_node("Z", None).unwrap();
        let result = sample.tree.remove(sample.root, stranger);
        assert_eq!(
            result,
            Err(TreeError::NodeNotFound {
                key: "Z".to_string(),
                path: "Z".to_string()
            })
        );
    }

    #[rstest]
    fn given_absent_key_below_nested_parent_when_removing_then_error_carries_child_path(
        mut sample: Fixture,
    ) {
        let stranger = sample.tree.new_node("Z", None).unwrap();
        let result = sample.tree.remove(sample.c, stranger);
        assert_eq!(
            result,
            Err(TreeError::NodeNotFound {
                key: "Z".to_string(),
                path: "C.Z".to_string()
            })
        );
    }

    #[rstest]
    fn given_missing_value_when_removing_all_then_earlier_removals_stay(mut sample: Fixture) {
        let stranger = sample.tree.new_node("Z", None).unwrap();
        let result = sample.tree.remove_all(sample.root, &[sample.a, stranger, sample.c]);

        assert!(result.is_err());
        assert_eq!(keys(&sample.tree, sample.root), vec!["B", "C"]);
    }

    #[rstest]
    fn given_empty_node_when_reading_ends_then_children_not_found(mut sample: Fixture) {
        let leaf = sample.a;
        let x = sample.tree.new_node("X", None).unwrap();
        assert!(matches!(
            sample.tree.first(leaf),
            Err(TreeError::ChildrenNotFound { .. })
        ));
        assert!(matches!(
            sample.tree.last(leaf),
            Err(TreeError::ChildrenNotFound { .. })
        ));
        assert!(matches!(
            sample.tree.set_first(leaf, x),
            Err(TreeError::ChildrenNotFound { .. })
        ));
        assert!(sample.tree.is_root(x).unwrap());
    }

    #[rstest]
    fn given_children_when_setting_ends_then_previous_detached(mut sample: Fixture) {
        let x = sample.tree.new_node("X", None).unwrap();
        let y = sample.tree.new_node("Y", None).unwrap();

        assert_eq!(sample.tree.set_first(sample.root, x).unwrap(), sample.a);
        assert_eq!(sample.tree.set_last(sample.root, y).unwrap(), sample.c);

        assert_eq!(keys(&sample.tree, sample.root), vec!["X", "B", "Y"]);
        assert_eq!(sample.tree.first(sample.root).unwrap(), x);
        assert_eq!(sample.tree.last(sample.root).unwrap(), y);
        assert!(sample.tree.is_root(sample.a).unwrap());
        assert!(sample.tree.is_root(sample.c).unwrap());
    }

    #[rstest]
    fn given_predicates_when_scanning_then_finds_positions(sample: Fixture) {
        let tree = &sample.tree;
        let not_b = |n: &IndexedNode<&'static str>| n.key() != "B";

        assert_eq!(tree.first_where(sample.root, not_b).unwrap(), Some(sample.a));
        assert_eq!(tree.last_where(sample.root, not_b).unwrap(), Some(sample.c));
        assert_eq!(tree.index_where(sample.root, not_b, 1).unwrap(), Some(2));
        assert_eq!(tree.index_where(sample.root, not_b, 3).unwrap(), None);
        assert_eq!(
            tree.first_where_or(sample.root, |n| n.key() == "Q", || sample.b)
                .unwrap(),
            sample.b
        );
        assert_eq!(
            tree.last_where_or(sample.root, |n| n.data() == Some(&"a"), || sample.c)
                .unwrap(),
            sample.a
        );
    }

    #[rstest]
    fn given_batch_when_inserting_all_then_order_kept(mut sample: Fixture) {
        let x = sample.tree.new_node("X", None).unwrap();
        let y = sample.tree.new_node("Y", None).unwrap();
        sample.tree.insert_all(sample.root, 1, &[x, y]).unwrap();
        assert_eq!(keys(&sample.tree, sample.root), vec!["A", "X", "Y", "B", "C"]);
    }

    #[rstest]
    fn given_index_when_removing_at_then_returns_child(mut sample: Fixture) {
        assert_eq!(sample.tree.remove_at(sample.root, 1).unwrap(), sample.b);
        assert_eq!(keys(&sample.tree, sample.root), vec!["A", "C"]);
        assert!(sample.tree.is_root(sample.b).unwrap());
    }

    #[rstest]
    #[should_panic]
    fn given_out_of_range_index_when_removing_at_then_panics(mut sample: Fixture) {
        let _ = sample.tree.remove_at(sample.root, 7);
    }

    #[rstest]
    fn given_root_when_deleting_then_children_cleared(mut sample: Fixture) {
        let removed = sample.tree.delete(sample.root).unwrap();
        assert_eq!(removed, vec![sample.a, sample.b, sample.c]);
        assert!(sample.tree.is_leaf(sample.root).unwrap());
    }

    #[rstest]
    fn given_predicate_when_removing_where_then_keeps_order(mut sample: Fixture) {
        let removed = sample.tree.remove_where(sample.root, |n| n.key() == "B").unwrap();
        assert_eq!(removed, vec![sample.b]);
        assert_eq!(keys(&sample.tree, sample.root), vec!["A", "C"]);
    }
}
