//! Error taxonomy shared across the Opdeck crates.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scene::NodeHandle;

/// Errors raised while populating or querying the command registry.
///
/// Duplicate identifiers are fatal to registration rather than silently
/// overwriting: the registry keeps the first definition and reports the
/// conflicting identifier.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("duplicate command identifier: '{id}'")]
    Duplicate { id: String },

    #[error("command not found: '{id}'")]
    NotFound { id: String },

    #[error("invalid command identifier: '{id}' (expected dotted form, e.g. 'create.nodes')")]
    InvalidId { id: String },

    #[error("unknown command library: '{name}'")]
    UnknownLibrary { name: String },

    #[error("command library already provided: '{name}'")]
    DuplicateLibrary { name: String },

    #[error("registry config I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("registry config parse error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Outcome of the engine's best-effort rollback after a `do_it` failure.
///
/// Partial application is the one scenario the framework is designed to
/// avoid, so rollback success is reported explicitly instead of being folded
/// into the originating error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RollbackStatus {
    /// Every journaled mutation was reverted.
    Complete,
    /// Rollback itself failed; host state may be partially applied.
    Failed(String),
}

impl std::fmt::Display for RollbackStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RollbackStatus::Complete => write!(f, "complete"),
            RollbackStatus::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

/// Errors surfaced by `Executor::execute`.
///
/// Cancellation is not represented here; it is an expected outcome and is
/// returned as `Outcome::Cancelled`, not an error.
#[derive(Debug, Error)]
pub enum ExecuteError {
    #[error("command not found: '{id}'")]
    NotFound { id: String },

    #[error("command '{id}' failed: {message} (rollback {rollback})")]
    Execution {
        id: String,
        message: String,
        rollback: RollbackStatus,
    },

    #[error(transparent)]
    Host(#[from] HostError),
}

/// Errors raised by a host implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    #[error("handle {handle} does not reference a live node")]
    DeadHandle { handle: NodeHandle },

    #[error("an undo chunk is already open ('{label}')")]
    ChunkAlreadyOpen { label: String },

    #[error("no undo chunk is open")]
    NoOpenChunk,

    #[error("node name must not be empty")]
    EmptyName,
}
