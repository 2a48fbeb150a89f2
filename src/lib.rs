//! Mutable, observable trees for list/tree views.
//!
//! Two variants share one node model: [`KeyedTree`](domain::KeyedTree) keeps
//! children in a key-ordered map with unique sibling keys, and
//! [`IndexedTree`](domain::IndexedTree) keeps an ordered list that supports
//! positional insertion. [`Observable`](observable::Observable) wraps either
//! one, notifying listeners on every ancestor of a change and publishing
//! structured events at the root.

pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod observable;
pub mod tree_traits;
pub mod util;

pub use domain::{
    IndexedTree, KeyedTree, NodeId, PathBuilder, PositionalMutation, Tree, TreeError,
    TreeMutation, TreeResult, TreeSettings,
};
pub use observable::{Observable, ObservableIndexedTree, ObservableKeyedTree};
