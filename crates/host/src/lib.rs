//! Host undo-stack abstraction for the Opdeck engine.
//!
//! A host is the external content application that owns scene state and a
//! native undo/redo queue. The engine talks to it through the [`Host`] trait:
//! it groups every mutation a command makes into one **undo chunk**, commits
//! the chunk as a single native entry, and installs exactly one [`UndoHook`]
//! through which the host dispatches undo/redo requests for entries the
//! engine produced.
//!
//! [`MemoryHost`] is the reference implementation: an in-memory scene with a
//! change journal and a native queue whose journal entries and hook-tagged
//! entries interleave the way a real host's native edits and plugin commands
//! do.

use std::sync::Arc;

use opdeck_types::{HostError, SceneOps, SceneQuery};

pub mod journal;
pub mod memory;

pub use journal::{NodeRecord, SceneChange};
pub use memory::{MemoryHost, MemoryScene, SceneSnapshot};

/// How a committed chunk lands on the native undo queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkDisposition {
    /// Record a hook-tagged entry; native undo of it is delegated to the
    /// installed [`UndoHook`].
    Hooked,
    /// Apply the changes permanently with no native entry. Used for commands
    /// declared non-undoable.
    Silent,
}

/// The engine-side plugin the host calls back into for entries the engine
/// committed, and for queue lifecycle signals. Exactly one hook is installed
/// per host.
///
/// Synchronization always flows host → hook: the host pops its native entry
/// first, then notifies the hook, which keeps the engine's internal stack in
/// step.
pub trait UndoHook: Send + Sync {
    /// Native undo reached a hook-tagged entry. Returns true when the hook
    /// reversed a command.
    fn undo(&self, scene: &mut dyn SceneOps) -> bool;

    /// Native redo reached a hook-tagged entry.
    fn redo(&self, scene: &mut dyn SceneOps) -> bool;

    /// The native redo queue was dropped because a new entry was committed.
    fn redo_cleared(&self);

    /// Both native queues were cleared (scene reset or explicit flush). Any
    /// retained command instances reference released host state and must be
    /// discarded.
    fn stack_cleared(&self);
}

/// Contract the engine requires from a host application.
pub trait Host: Send {
    /// Read-only scene view, safe during argument resolution.
    fn scene(&self) -> &dyn SceneQuery;

    /// Mutable scene access. Only meaningful between [`Host::open_chunk`] and
    /// the matching commit or rollback; the host attributes every change made
    /// through it to the open chunk.
    fn scene_mut(&mut self) -> &mut dyn SceneOps;

    /// Opens an undo chunk labelled with the command identifier. Chunks do
    /// not nest.
    fn open_chunk(&mut self, label: &str) -> Result<(), HostError>;

    /// Closes the open chunk, recording it per `disposition`. Committing a
    /// native entry drops the native redo queue.
    fn commit_chunk(&mut self, disposition: ChunkDisposition) -> Result<(), HostError>;

    /// Closes the open chunk and reverts every change it journaled, most
    /// recent first.
    fn rollback_chunk(&mut self) -> Result<(), HostError>;

    /// Installs the engine's undo hook, replacing any previous one.
    fn install_undo_hook(&mut self, hook: Arc<dyn UndoHook>);

    /// Detaches the installed hook. Part of engine teardown; hooked entries
    /// left on the queue become inert.
    fn clear_undo_hook(&mut self);

    /// Native undo request (the user's undo key). Returns false when the
    /// queue is empty.
    fn undo(&mut self) -> bool;

    /// Native redo request.
    fn redo(&mut self) -> bool;

    /// Native undo queue length, framework and host entries alike.
    fn undo_queue_len(&self) -> usize;

    /// Native redo queue length.
    fn redo_queue_len(&self) -> usize;

    /// Number of hook-tagged entries on the native undo queue.
    fn hooked_undo_len(&self) -> usize;

    /// Number of hook-tagged entries on the native redo queue.
    fn hooked_redo_len(&self) -> usize;

    /// Clears both native queues and signals [`UndoHook::stack_cleared`].
    fn clear_undo_queues(&mut self);

    /// Resets the scene and both queues, as a file-new would.
    fn new_scene(&mut self);
}
