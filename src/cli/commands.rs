//! Command dispatch for the treeview binary

use std::collections::VecDeque;
use std::fs;
use std::path::Path;

use tracing::{debug, info, instrument};

use crate::cli::args::{Cli, Commands};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{Settings, Variant};
use crate::domain::{NodeId, PathBuilder, Tree, TreeMutation};
use crate::observable::{NodeRemoveEvent, Observable};
use crate::tree_traits::TreeNodeConvert;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    if cli.template {
        output::info(&Settings::template());
        return Ok(());
    }
    let Some(command) = &cli.command else {
        return Err(CliError::InvalidArgs(
            "no command given, see --help".to_string(),
        ));
    };

    let settings = Settings::load(cli.config.as_deref())?;
    let variant = if cli.indexed {
        Variant::Indexed
    } else {
        settings.variant
    };
    let tree_settings = settings.tree_settings()?;
    debug!(?variant, ?tree_settings, "building tree");

    match variant {
        Variant::Keyed => run(Observable::keyed(tree_settings), command),
        Variant::Indexed => run(Observable::indexed(tree_settings), command),
    }
}

fn run<Tr>(mut tree: Observable<Tr>, command: &Commands) -> CliResult<()>
where
    Tr: TreeMutation<Data = String>,
{
    match command {
        Commands::Show { file, values } => {
            let root = load_outline_file(&mut tree, file)?;
            output::info(&render(&tree, root, *values)?);
        }
        Commands::Find { file, path } => {
            let root = load_outline_file(&mut tree, file)?;
            let id = tree.element_at(root, path)?;
            output::field("path", &tree.path(id)?);
            output::field("key", tree.key(id)?);
            output::field("value", tree.data(id)?.map_or("-", String::as_str));
            output::field("level", &tree.level(id)?);
            output::field("children", &tree.child_count(id)?);
        }
        Commands::Prune { file, prefix } => {
            let root = load_outline_file(&mut tree, file)?;
            let events = prune(&mut tree, root, prefix)?;
            output::header(&format!("{} removal event(s)", events.len()));
            for event in &events {
                for &item in &event.items {
                    let size = tree.descendants(item).count();
                    output::removed(&format!("{} ({} node(s))", tree.key(item)?, size));
                }
            }
            output::info(&render(&tree, root, false)?);
        }
    }
    Ok(())
}

/// Reads an outline file into a fresh root of `tree`.
#[instrument(level = "debug", skip(tree))]
pub fn load_outline_file<Tr>(tree: &mut Tr, file: &Path) -> CliResult<NodeId>
where
    Tr: TreeMutation<Data = String>,
{
    let text = fs::read_to_string(file).map_err(|source| CliError::Io {
        path: file.to_path_buf(),
        source,
    })?;
    let root = tree.new_root()?;
    let inserted = PathBuilder::new(&mut *tree, root).load_outline(&text)?;
    info!(file = %file.display(), nodes = inserted.len(), "loaded outline");
    Ok(root)
}

/// Text dump of the subtree at `root`, optionally with `key=value` labels.
pub fn render<Tr>(tree: &Tr, root: NodeId, values: bool) -> CliResult<String>
where
    Tr: Tree<Data = String>,
{
    let dump = if values {
        tree.to_tree_string_with(root, |node| match node.data() {
            Some(value) => format!("{}={}", node.key(), value),
            None => node.key().to_string(),
        })?
    } else {
        tree.to_tree_string(root)?
    };
    Ok(dump.to_string())
}

/// Removes, level by level, every node whose key starts with `prefix`.
///
/// Returns the removal events the root published, one per level that lost
/// children.
#[instrument(level = "debug", skip(tree))]
pub fn prune<Tr>(
    tree: &mut Observable<Tr>,
    root: NodeId,
    prefix: &str,
) -> CliResult<Vec<NodeRemoveEvent>>
where
    Tr: TreeMutation,
{
    let removals = tree.removed_nodes(root)?;
    let mut queue = VecDeque::from([root]);
    while let Some(id) = queue.pop_front() {
        let removed = tree.remove_where(id, |node| node.key().starts_with(prefix))?;
        if !removed.is_empty() {
            debug!(parent = ?id, count = removed.len(), "pruned");
        }
        queue.extend(tree.children(id)?);
    }
    Ok(removals.try_iter().collect())
}
