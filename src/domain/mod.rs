//! Domain layer: tree storage, traversal and mutation
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod builder;
pub mod error;
pub mod indexed;
pub mod keyed;
pub mod node;
pub mod traits;

pub use builder::PathBuilder;
pub use error::{TreeError, TreeResult};
pub use indexed::{IndexedChildren, IndexedNode, IndexedTree};
pub use keyed::{KeyedChildren, KeyedNode, KeyedTree};
pub use node::{ChildStore, Node, NodeId, TreeSettings, PATH_SEPARATOR, ROOT_KEY};
pub use traits::{Ancestors, PositionalMutation, PreOrder, Tree, TreeMutation};
