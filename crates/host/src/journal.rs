//! Scene change journal entries.
//!
//! Every mutation made through [`crate::MemoryScene`] is journaled as a
//! [`SceneChange`] carrying enough state to run in both directions: revert
//! for rollback and native undo, replay for native redo.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use opdeck_types::NodeHandle;

/// Snapshot of a node's full state, captured when the node is created or
/// deleted so the journal can rebuild it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub name: String,
    pub node_type: String,
    #[serde(default)]
    pub attrs: IndexMap<String, Value>,
}

impl NodeRecord {
    pub fn new(name: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            node_type: node_type.into(),
            attrs: IndexMap::new(),
        }
    }
}

/// One journaled scene mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SceneChange {
    Created {
        handle: NodeHandle,
        record: NodeRecord,
    },
    Deleted {
        handle: NodeHandle,
        record: NodeRecord,
    },
    Renamed {
        handle: NodeHandle,
        from: String,
        to: String,
    },
    AttrSet {
        handle: NodeHandle,
        key: String,
        previous: Option<Value>,
        current: Value,
    },
}

impl SceneChange {
    /// The handle this change touches.
    pub fn handle(&self) -> NodeHandle {
        match self {
            SceneChange::Created { handle, .. }
            | SceneChange::Deleted { handle, .. }
            | SceneChange::Renamed { handle, .. }
            | SceneChange::AttrSet { handle, .. } => *handle,
        }
    }
}
