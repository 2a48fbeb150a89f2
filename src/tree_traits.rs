/*
Text dump of a subtree for diagnostics and the CLI.
Implemented once for every `Tree`, so observable and plain trees share it.
 */
use termtree::Tree as TermTree;
use tracing::instrument;

use crate::domain::{Node, NodeId, Tree, TreeResult};

pub trait TreeNodeConvert: Tree {
    /// Renders the subtree rooted at `id`, labelling each node with its key.
    fn to_tree_string(&self, id: NodeId) -> TreeResult<TermTree<String>> {
        self.to_tree_string_with(id, |node| node.key().to_string())
    }

    /// Renders the subtree rooted at `id` with a custom label per node.
    fn to_tree_string_with<F>(&self, id: NodeId, label: F) -> TreeResult<TermTree<String>>
    where
        F: Fn(&Node<Self::Data, Self::Children>) -> String;
}

impl<Tr: Tree> TreeNodeConvert for Tr {
    #[instrument(level = "debug", skip(self, label))]
    fn to_tree_string_with<F>(&self, id: NodeId, label: F) -> TreeResult<TermTree<String>>
    where
        F: Fn(&Node<Self::Data, Self::Children>) -> String,
    {
        fn build_tree<Tr: Tree, F>(tree: &Tr, id: NodeId, label: &F) -> TreeResult<TermTree<String>>
        where
            F: Fn(&Node<Tr::Data, Tr::Children>) -> String,
        {
            let node = tree.node(id)?;
            let leaves = tree
                .children(id)?
                .into_iter()
                .map(|child| build_tree(tree, child, label))
                .collect::<TreeResult<Vec<_>>>()?;
            Ok(TermTree::new(label(node)).with_leaves(leaves))
        }

        build_tree(self, id, &label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{KeyedTree, PathBuilder};

    #[test]
    fn given_tree_when_converting_then_renders_nested_keys() {
        let mut tree: KeyedTree<String> = KeyedTree::new();
        let root = tree.new_root().unwrap();
        PathBuilder::new(&mut tree, root)
            .load_outline("A\nB.B1=x\n")
            .unwrap();

        let rendered = tree.to_tree_string(root).unwrap().to_string();

        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "/");
        assert!(lines[1].ends_with("A"));
        assert!(lines[2].ends_with("B"));
        assert!(lines[3].ends_with("B1"));
    }

    #[test]
    fn given_label_fn_when_converting_then_uses_it() {
        let mut tree: KeyedTree<String> = KeyedTree::new();
        let root = tree.new_root().unwrap();
        PathBuilder::new(&mut tree, root).load_outline("A=1").unwrap();

        let rendered = tree
            .to_tree_string_with(root, |n| format!("{}:{}", n.key(), n.data().map_or("-", String::as_str)))
            .unwrap()
            .to_string();

        assert!(rendered.contains("/:-"));
        assert!(rendered.contains("A:1"));
    }
}
