//! Scene access traits and the lifetime-safe node handle.
//!
//! Commands never hold live references into host state. Anything a command
//! caches across the resolve/execute/undo boundary is a [`NodeHandle`]: a
//! generational key that can be re-validated against the scene at every use.
//! A handle whose node has been deleted simply fails lookup; it cannot dangle.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::HostError;

/// Weak, generational reference to a host-managed node.
///
/// The `generation` counter is bumped whenever a slot is reused, so a handle
/// taken before a delete never resolves to an unrelated node created later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeHandle {
    /// Slot index inside the host's node table.
    pub index: u64,
    /// Generation of the slot at the time the handle was issued.
    pub generation: u32,
}

impl NodeHandle {
    /// Encodes the handle as a JSON value for storage inside [`crate::Args`]
    /// or a command result.
    pub fn to_value(&self) -> Value {
        serde_json::json!({ "index": self.index, "generation": self.generation })
    }

    /// Decodes a handle previously produced by [`NodeHandle::to_value`].
    pub fn from_value(value: &Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }
}

impl std::fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "node#{}.{}", self.index, self.generation)
    }
}

/// Read-only scene access, available during argument resolution.
pub trait SceneQuery {
    /// True when `handle` references a live node.
    fn node_exists(&self, handle: NodeHandle) -> bool;

    /// Current name of the node, if live.
    fn node_name(&self, handle: NodeHandle) -> Option<String>;

    /// Declared type of the node, if live.
    fn node_type(&self, handle: NodeHandle) -> Option<String>;

    /// First live node with the given name.
    fn find_node(&self, name: &str) -> Option<NodeHandle>;

    /// Number of live nodes in the scene.
    fn node_count(&self) -> usize;

    /// Attribute value on a live node.
    fn attr(&self, handle: NodeHandle, key: &str) -> Option<Value>;
}

/// Mutating scene access, available to `do_it`/`undo_it`/`redo_it` inside the
/// engine's undo-chunk boundary.
pub trait SceneOps: SceneQuery {
    /// Creates a node and returns its handle.
    fn create_node(&mut self, name: &str, node_type: &str) -> Result<NodeHandle, HostError>;

    /// Deletes a live node.
    fn delete_node(&mut self, handle: NodeHandle) -> Result<(), HostError>;

    /// Renames a live node.
    fn rename_node(&mut self, handle: NodeHandle, name: &str) -> Result<(), HostError>;

    /// Sets an attribute on a live node.
    fn set_attr(&mut self, handle: NodeHandle, key: &str, value: Value) -> Result<(), HostError>;
}
