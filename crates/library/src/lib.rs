//! Built-in Opdeck commands.
//!
//! A small [`CommandLibrary`] shipped with the framework, both as working
//! tooling and as reference implementations of the command contract. Domain
//! teams register their own libraries the same way; nothing here is special
//! to the engine.

use opdeck_types::{CommandDefinition, CommandLibrary};

pub mod create_nodes;
pub mod rename_node;

pub use create_nodes::CreateNodesCommand;
pub use rename_node::RenameNodeCommand;

/// Name under which the built-in library is discovered.
pub const LIBRARY_NAME: &str = "builtin";

/// The built-in library: `create.nodes` and `rename.node`.
#[derive(Debug, Default)]
pub struct BuiltinLibrary;

impl CommandLibrary for BuiltinLibrary {
    fn name(&self) -> &str {
        LIBRARY_NAME
    }

    fn definitions(&self) -> Vec<CommandDefinition> {
        vec![create_nodes::definition(), rename_node::definition()]
    }
}
