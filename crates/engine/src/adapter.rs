//! The host undo-stack adapter.
//!
//! Exactly one [`HostUndoAdapter`] is installed into the host per executor.
//! It is the sole translation point between native undo/redo signals and the
//! engine's internal stacks: the host pops a hook-tagged native entry first,
//! then calls into the adapter, which moves the matching command instance
//! between the internal undo and redo stacks and runs its reversal.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use opdeck_host::UndoHook;
use opdeck_types::{Args, Command, CommandDescriptor, SceneOps};

/// A command instance retained for undo: the boxed instance, its resolved
/// arguments (for default redo), and its descriptor.
pub(crate) struct LiveCommand {
    pub descriptor: CommandDescriptor,
    pub command: Box<dyn Command>,
    pub args: Args,
    pub executed_at: DateTime<Utc>,
}

/// Internal undo/redo stacks, most-recent-last. Shared between the executor
/// (which pushes on execute) and the adapter (which moves entries on native
/// undo/redo).
#[derive(Default)]
pub(crate) struct StackState {
    pub undo: Vec<LiveCommand>,
    pub redo: Vec<LiveCommand>,
}

/// Bridge registered with the host's native undo subsystem.
pub struct HostUndoAdapter {
    stacks: Arc<Mutex<StackState>>,
}

impl HostUndoAdapter {
    pub(crate) fn new(stacks: Arc<Mutex<StackState>>) -> Self {
        Self { stacks }
    }
}

impl UndoHook for HostUndoAdapter {
    fn undo(&self, scene: &mut dyn SceneOps) -> bool {
        let mut stacks = self.stacks.lock().expect("undo stack lock poisoned");
        let Some(mut live) = stacks.undo.pop() else {
            // The host announced a framework entry the engine no longer
            // holds. The native entry is already popped; nothing to reverse.
            warn!("host undo reached a framework entry but the internal stack is empty");
            return false;
        };
        let reversed = match live.command.undo_it(scene) {
            Ok(reversed) => reversed,
            Err(error) => {
                warn!(command = %live.descriptor.id, error = %error, "undo_it failed");
                false
            }
        };
        debug!(command = %live.descriptor.id, executed_at = %live.executed_at, reversed, "command undone");
        // Keep the instance either way so the stacks stay in step with the
        // host queues.
        stacks.redo.push(live);
        reversed
    }

    fn redo(&self, scene: &mut dyn SceneOps) -> bool {
        let mut stacks = self.stacks.lock().expect("undo stack lock poisoned");
        let Some(mut live) = stacks.redo.pop() else {
            warn!("host redo reached a framework entry but the internal stack is empty");
            return false;
        };
        let replayed = match live.command.redo_it(scene, &live.args) {
            Ok(_) => true,
            Err(error) => {
                warn!(command = %live.descriptor.id, error = %error, "redo_it failed");
                false
            }
        };
        debug!(command = %live.descriptor.id, replayed, "command redone");
        stacks.undo.push(live);
        replayed
    }

    fn redo_cleared(&self) {
        let mut stacks = self.stacks.lock().expect("undo stack lock poisoned");
        if !stacks.redo.is_empty() {
            debug!(dropped = stacks.redo.len(), "host dropped its redo queue; matching");
            stacks.redo.clear();
        }
    }

    fn stack_cleared(&self) {
        let mut stacks = self.stacks.lock().expect("undo stack lock poisoned");
        let dropped = stacks.undo.len() + stacks.redo.len();
        if dropped > 0 {
            // Instances here reference released host state; keeping them
            // would be a correctness hazard, not just a leak.
            debug!(dropped, "host cleared its undo queues; dropping retained instances");
        }
        stacks.undo.clear();
        stacks.redo.clear();
    }
}
