//! Path builder for growing a tree from dotted paths.

use tracing::{debug, instrument};

use crate::domain::error::{TreeError, TreeResult};
use crate::domain::node::NodeId;
use crate::domain::traits::TreeMutation;

/// Inserts separator-delimited paths below a root, creating missing
/// intermediate nodes on the way.
pub struct PathBuilder<'a, Tr> {
    tree: &'a mut Tr,
    root: NodeId,
}

impl<'a, Tr: TreeMutation> PathBuilder<'a, Tr> {
    pub fn new(tree: &'a mut Tr, root: NodeId) -> Self {
        Self { tree, root }
    }

    /// Creates the node at `path`, returning its handle.
    ///
    /// Intermediate nodes are created without data. The last segment must
    /// not exist yet: an existing node there fails with
    /// [`TreeError::DuplicateKey`], for both tree variants.
    #[instrument(level = "debug", skip(self, data))]
    pub fn insert_path(&mut self, path: &str, data: Option<Tr::Data>) -> TreeResult<NodeId> {
        let settings = self.tree.settings();
        let root_key = self.tree.key(self.root)?;
        let mut segments: Vec<String> = path
            .split(settings.path_separator)
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect();
        if segments
            .first()
            .is_some_and(|first| *first == settings.root_key || first == root_key)
        {
            segments.remove(0);
        }
        if segments.is_empty() {
            return Err(TreeError::InvalidKey {
                key: path.to_string(),
                reason: "path has no segments below the root".to_string(),
            });
        }

        let last = segments.len() - 1;
        let mut data = data;
        let mut current = self.root;
        for (i, segment) in segments.into_iter().enumerate() {
            match self.tree.child_by_key(current, &segment)? {
                Some(existing) if i < last => current = existing,
                Some(_) => {
                    return Err(TreeError::DuplicateKey {
                        key: segment,
                        parent: self.tree.key(current)?.to_string(),
                    })
                }
                None => {
                    let payload = if i == last { data.take() } else { None };
                    let node = self.tree.new_node(segment, payload)?;
                    self.tree.add(current, node)?;
                    current = node;
                }
            }
        }
        debug!(path, node = ?current, "inserted path");
        Ok(current)
    }
}

impl<'a, Tr> PathBuilder<'a, Tr>
where
    Tr: TreeMutation,
    Tr::Data: From<String>,
{
    /// Loads an outline: one path per line, optionally followed by `=value`.
    ///
    /// Blank lines and lines starting with `#` are ignored.
    #[instrument(level = "debug", skip(self, text))]
    pub fn load_outline(&mut self, text: &str) -> TreeResult<Vec<NodeId>> {
        let mut inserted = Vec::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (path, data): (&str, Option<Tr::Data>) = match line.split_once('=') {
                Some((path, value)) => (path.trim(), Some(value.trim().to_string().into())),
                None => (line, None),
            };
            inserted.push(self.insert_path(path, data)?);
        }
        Ok(inserted)
    }
}
