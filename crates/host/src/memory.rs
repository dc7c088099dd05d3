//! In-memory reference host.
//!
//! [`MemoryScene`] stores nodes in generational slots and journals every
//! mutation; [`MemoryHost`] layers the undo machinery on top: chunk grouping,
//! a native undo/redo queue mixing plain journal entries (direct host edits)
//! with hook-tagged entries (engine commands), and hook dispatch.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use opdeck_types::{HostError, NodeHandle, SceneOps, SceneQuery};

use crate::journal::{NodeRecord, SceneChange};
use crate::{ChunkDisposition, Host, UndoHook};

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    node: Option<NodeRecord>,
}

/// Generational-slot scene with a change journal.
#[derive(Debug, Default)]
pub struct MemoryScene {
    slots: Vec<Slot>,
    journal: Vec<SceneChange>,
}

/// Comparable snapshot of all live nodes, used by tests to assert that host
/// state is unchanged or fully restored.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneSnapshot {
    nodes: Vec<(u64, u32, NodeRecord)>,
}

impl MemoryScene {
    fn slot(&self, handle: NodeHandle) -> Option<&Slot> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
    }

    fn record(&self, handle: NodeHandle) -> Option<&NodeRecord> {
        self.slot(handle).and_then(|slot| slot.node.as_ref())
    }

    fn record_mut(&mut self, handle: NodeHandle) -> Option<&mut NodeRecord> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    fn take_journal(&mut self) -> Vec<SceneChange> {
        std::mem::take(&mut self.journal)
    }

    fn discard_journal(&mut self) {
        self.journal.clear();
    }

    fn reset(&mut self) {
        self.slots.clear();
        self.journal.clear();
    }

    /// Snapshot of every live node, in slot order.
    pub fn snapshot(&self) -> SceneSnapshot {
        let nodes = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| {
                slot.node
                    .as_ref()
                    .map(|record| (index as u64, slot.generation, record.clone()))
            })
            .collect();
        SceneSnapshot { nodes }
    }

    /// Applies the inverse of a journaled change. Used for chunk rollback and
    /// native undo of journal entries; bypasses the journal itself.
    fn revert(&mut self, change: &SceneChange) {
        match change {
            SceneChange::Created { handle, .. } => {
                if let Some(slot) = self.slots.get_mut(handle.index as usize) {
                    slot.node = None;
                    slot.generation = slot.generation.wrapping_add(1);
                } else {
                    warn!(handle = %handle, "revert of create hit a missing slot");
                }
            }
            SceneChange::Deleted { handle, record } => {
                if let Some(slot) = self.slots.get_mut(handle.index as usize) {
                    slot.node = Some(record.clone());
                    slot.generation = handle.generation;
                } else {
                    warn!(handle = %handle, "revert of delete hit a missing slot");
                }
            }
            SceneChange::Renamed { handle, from, .. } => {
                if let Some(record) = self.record_mut(*handle) {
                    record.name = from.clone();
                }
            }
            SceneChange::AttrSet {
                handle, key, previous, ..
            } => {
                if let Some(record) = self.record_mut(*handle) {
                    match previous {
                        Some(value) => {
                            record.attrs.insert(key.clone(), value.clone());
                        }
                        None => {
                            record.attrs.shift_remove(key);
                        }
                    }
                }
            }
        }
    }

    /// Re-applies a journaled change in the forward direction. Used for
    /// native redo of journal entries; bypasses the journal itself.
    fn replay(&mut self, change: &SceneChange) {
        match change {
            SceneChange::Created { handle, record } => {
                while self.slots.len() <= handle.index as usize {
                    self.slots.push(Slot::default());
                }
                let slot = &mut self.slots[handle.index as usize];
                slot.node = Some(record.clone());
                slot.generation = handle.generation;
            }
            SceneChange::Deleted { handle, .. } => {
                if let Some(slot) = self.slots.get_mut(handle.index as usize) {
                    slot.node = None;
                    slot.generation = handle.generation.wrapping_add(1);
                }
            }
            SceneChange::Renamed { handle, to, .. } => {
                if let Some(record) = self.record_mut(*handle) {
                    record.name = to.clone();
                }
            }
            SceneChange::AttrSet { handle, key, current, .. } => {
                if let Some(record) = self.record_mut(*handle) {
                    record.attrs.insert(key.clone(), current.clone());
                }
            }
        }
    }
}

impl SceneQuery for MemoryScene {
    fn node_exists(&self, handle: NodeHandle) -> bool {
        self.record(handle).is_some()
    }

    fn node_name(&self, handle: NodeHandle) -> Option<String> {
        self.record(handle).map(|record| record.name.clone())
    }

    fn node_type(&self, handle: NodeHandle) -> Option<String> {
        self.record(handle).map(|record| record.node_type.clone())
    }

    fn find_node(&self, name: &str) -> Option<NodeHandle> {
        self.slots.iter().enumerate().find_map(|(index, slot)| {
            slot.node
                .as_ref()
                .filter(|record| record.name == name)
                .map(|_| NodeHandle {
                    index: index as u64,
                    generation: slot.generation,
                })
        })
    }

    fn node_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.node.is_some()).count()
    }

    fn attr(&self, handle: NodeHandle, key: &str) -> Option<Value> {
        self.record(handle).and_then(|record| record.attrs.get(key).cloned())
    }
}

impl SceneOps for MemoryScene {
    fn create_node(&mut self, name: &str, node_type: &str) -> Result<NodeHandle, HostError> {
        if name.is_empty() {
            return Err(HostError::EmptyName);
        }
        let record = NodeRecord::new(name, node_type);
        let index = self.slots.iter().position(|slot| slot.node.is_none()).unwrap_or_else(|| {
            self.slots.push(Slot::default());
            self.slots.len() - 1
        });
        let slot = &mut self.slots[index];
        slot.node = Some(record.clone());
        let handle = NodeHandle {
            index: index as u64,
            generation: slot.generation,
        };
        self.journal.push(SceneChange::Created { handle, record });
        Ok(handle)
    }

    fn delete_node(&mut self, handle: NodeHandle) -> Result<(), HostError> {
        let slot = self
            .slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .ok_or(HostError::DeadHandle { handle })?;
        let record = slot.node.take().ok_or(HostError::DeadHandle { handle })?;
        slot.generation = slot.generation.wrapping_add(1);
        self.journal.push(SceneChange::Deleted { handle, record });
        Ok(())
    }

    fn rename_node(&mut self, handle: NodeHandle, name: &str) -> Result<(), HostError> {
        if name.is_empty() {
            return Err(HostError::EmptyName);
        }
        let record = self.record_mut(handle).ok_or(HostError::DeadHandle { handle })?;
        let from = std::mem::replace(&mut record.name, name.to_string());
        self.journal.push(SceneChange::Renamed {
            handle,
            from,
            to: name.to_string(),
        });
        Ok(())
    }

    fn set_attr(&mut self, handle: NodeHandle, key: &str, value: Value) -> Result<(), HostError> {
        let record = self.record_mut(handle).ok_or(HostError::DeadHandle { handle })?;
        let previous = record.attrs.insert(key.to_string(), value.clone());
        self.journal.push(SceneChange::AttrSet {
            handle,
            key: key.to_string(),
            previous,
            current: value,
        });
        Ok(())
    }
}

#[derive(Debug)]
enum EntryKind {
    /// Plain host edit; the host reverts/replays the journal itself.
    Journal(Vec<SceneChange>),
    /// Engine-committed entry; undo/redo is delegated to the hook.
    Hooked,
}

#[derive(Debug)]
struct NativeEntry {
    label: String,
    kind: EntryKind,
}

/// In-memory host with a native undo/redo queue.
#[derive(Default)]
pub struct MemoryHost {
    scene: MemoryScene,
    undo_queue: Vec<NativeEntry>,
    redo_queue: Vec<NativeEntry>,
    open_chunk: Option<String>,
    hook: Option<Arc<dyn UndoHook>>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Direct host-side edit outside any command: runs `f` against the scene
    /// and records the resulting journal as one plain native entry, the way a
    /// user's manual edit would land on the native queue. A failed edit is
    /// reverted and leaves no entry.
    pub fn edit<T>(&mut self, label: &str, f: impl FnOnce(&mut dyn SceneOps) -> Result<T, HostError>) -> Result<T, HostError> {
        if let Some(open) = &self.open_chunk {
            return Err(HostError::ChunkAlreadyOpen { label: open.clone() });
        }
        let result = f(&mut self.scene);
        let changes = self.scene.take_journal();
        match result {
            Ok(value) => {
                if !changes.is_empty() {
                    self.flush_redo();
                    self.undo_queue.push(NativeEntry {
                        label: label.to_string(),
                        kind: EntryKind::Journal(changes),
                    });
                }
                Ok(value)
            }
            Err(err) => {
                for change in changes.iter().rev() {
                    self.scene.revert(change);
                }
                Err(err)
            }
        }
    }

    /// Snapshot of the live scene for state-restoration assertions.
    pub fn snapshot(&self) -> SceneSnapshot {
        self.scene.snapshot()
    }

    fn flush_redo(&mut self) {
        if self.redo_queue.is_empty() {
            return;
        }
        self.redo_queue.clear();
        if let Some(hook) = &self.hook {
            hook.redo_cleared();
        }
    }
}

impl Host for MemoryHost {
    fn scene(&self) -> &dyn SceneQuery {
        &self.scene
    }

    fn scene_mut(&mut self) -> &mut dyn SceneOps {
        &mut self.scene
    }

    fn open_chunk(&mut self, label: &str) -> Result<(), HostError> {
        if let Some(open) = &self.open_chunk {
            return Err(HostError::ChunkAlreadyOpen { label: open.clone() });
        }
        if !self.scene.journal.is_empty() {
            debug!(label, "discarding stray journal entries before opening chunk");
            self.scene.discard_journal();
        }
        self.open_chunk = Some(label.to_string());
        Ok(())
    }

    fn commit_chunk(&mut self, disposition: ChunkDisposition) -> Result<(), HostError> {
        let label = self.open_chunk.take().ok_or(HostError::NoOpenChunk)?;
        let changes = self.scene.take_journal();
        // Any committed change invalidates pending redo, silent commits
        // included: their mutations are permanent.
        self.flush_redo();
        match disposition {
            ChunkDisposition::Hooked => {
                self.undo_queue.push(NativeEntry {
                    label,
                    kind: EntryKind::Hooked,
                });
            }
            ChunkDisposition::Silent => {
                debug!(label, changes = changes.len(), "chunk committed without undo entry");
            }
        }
        Ok(())
    }

    fn rollback_chunk(&mut self) -> Result<(), HostError> {
        let label = self.open_chunk.take().ok_or(HostError::NoOpenChunk)?;
        let changes = self.scene.take_journal();
        debug!(label, changes = changes.len(), "rolling back open chunk");
        for change in changes.iter().rev() {
            self.scene.revert(change);
        }
        Ok(())
    }

    fn install_undo_hook(&mut self, hook: Arc<dyn UndoHook>) {
        self.hook = Some(hook);
    }

    fn clear_undo_hook(&mut self) {
        self.hook = None;
    }

    fn undo(&mut self) -> bool {
        let Some(entry) = self.undo_queue.pop() else {
            return false;
        };
        match entry.kind {
            EntryKind::Journal(changes) => {
                for change in changes.iter().rev() {
                    self.scene.revert(change);
                }
                self.redo_queue.push(NativeEntry {
                    label: entry.label,
                    kind: EntryKind::Journal(changes),
                });
            }
            EntryKind::Hooked => {
                match self.hook.clone() {
                    Some(hook) => {
                        hook.undo(&mut self.scene);
                    }
                    None => warn!(label = %entry.label, "hooked undo entry with no hook installed"),
                }
                // The hook's reversal is not itself a new edit.
                self.scene.discard_journal();
                self.redo_queue.push(entry);
            }
        }
        true
    }

    fn redo(&mut self) -> bool {
        let Some(entry) = self.redo_queue.pop() else {
            return false;
        };
        match entry.kind {
            EntryKind::Journal(changes) => {
                for change in &changes {
                    self.scene.replay(change);
                }
                self.undo_queue.push(NativeEntry {
                    label: entry.label,
                    kind: EntryKind::Journal(changes),
                });
            }
            EntryKind::Hooked => {
                match self.hook.clone() {
                    Some(hook) => {
                        hook.redo(&mut self.scene);
                    }
                    None => warn!(label = %entry.label, "hooked redo entry with no hook installed"),
                }
                self.scene.discard_journal();
                self.undo_queue.push(entry);
            }
        }
        true
    }

    fn undo_queue_len(&self) -> usize {
        self.undo_queue.len()
    }

    fn redo_queue_len(&self) -> usize {
        self.redo_queue.len()
    }

    fn hooked_undo_len(&self) -> usize {
        self.undo_queue.iter().filter(|e| matches!(e.kind, EntryKind::Hooked)).count()
    }

    fn hooked_redo_len(&self) -> usize {
        self.redo_queue.iter().filter(|e| matches!(e.kind, EntryKind::Hooked)).count()
    }

    fn clear_undo_queues(&mut self) {
        self.undo_queue.clear();
        self.redo_queue.clear();
        if let Some(hook) = &self.hook {
            hook.stack_cleared();
        }
    }

    fn new_scene(&mut self) {
        self.scene.reset();
        self.clear_undo_queues();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use serde_json::json;

    #[derive(Default)]
    struct CountingHook {
        undone: AtomicUsize,
        redone: AtomicUsize,
        cleared: AtomicUsize,
        redo_cleared: AtomicUsize,
    }

    impl UndoHook for CountingHook {
        fn undo(&self, _scene: &mut dyn SceneOps) -> bool {
            self.undone.fetch_add(1, Ordering::SeqCst);
            true
        }

        fn redo(&self, _scene: &mut dyn SceneOps) -> bool {
            self.redone.fetch_add(1, Ordering::SeqCst);
            true
        }

        fn redo_cleared(&self) {
            self.redo_cleared.fetch_add(1, Ordering::SeqCst);
        }

        fn stack_cleared(&self) {
            self.cleared.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn direct_edit_is_native_undoable() {
        let mut host = MemoryHost::new();
        let handle = host
            .edit("create sphere", |scene| scene.create_node("sphere1", "mesh"))
            .expect("create node");
        assert!(host.scene().node_exists(handle));
        assert_eq!(host.undo_queue_len(), 1);

        assert!(host.undo());
        assert!(!host.scene().node_exists(handle));
        assert_eq!(host.redo_queue_len(), 1);

        assert!(host.redo());
        assert_eq!(host.scene().node_count(), 1);
        assert_eq!(host.scene().find_node("sphere1").map(|h| h.index), Some(handle.index));
    }

    #[test]
    fn stale_handles_fail_after_delete() {
        let mut host = MemoryHost::new();
        let handle = host.edit("create", |scene| scene.create_node("a", "transform")).expect("create");
        host.edit("delete", |scene| scene.delete_node(handle)).expect("delete");
        assert!(!host.scene().node_exists(handle));

        // Slot reuse issues a new generation; the stale handle stays dead.
        let replacement = host.edit("create", |scene| scene.create_node("b", "transform")).expect("create");
        assert_eq!(replacement.index, handle.index);
        assert_ne!(replacement.generation, handle.generation);
        assert!(!host.scene().node_exists(handle));
        assert!(host.scene().node_exists(replacement));
    }

    #[test]
    fn rollback_reverts_partial_chunk() {
        let mut host = MemoryHost::new();
        let before = host.snapshot();
        host.open_chunk("demo.partial").expect("open chunk");
        let a = host.scene_mut().create_node("a", "transform").expect("create a");
        host.scene_mut().set_attr(a, "fps", json!(30)).expect("set attr");
        host.scene_mut().create_node("b", "transform").expect("create b");
        host.rollback_chunk().expect("rollback");

        assert_eq!(host.snapshot(), before);
        assert_eq!(host.undo_queue_len(), 0);
    }

    #[test]
    fn attribute_changes_revert_to_previous_values() {
        let mut host = MemoryHost::new();
        let handle = host.edit("create", |scene| scene.create_node("cam", "camera")).expect("create");
        host.edit("set rate", |scene| scene.set_attr(handle, "rate", json!(24))).expect("set");
        host.edit("set rate", |scene| scene.set_attr(handle, "rate", json!(30))).expect("set");

        assert!(host.undo());
        assert_eq!(host.scene().attr(handle, "rate"), Some(json!(24)));
        assert!(host.undo());
        assert_eq!(host.scene().attr(handle, "rate"), None);
    }

    #[test]
    fn hooked_entries_delegate_to_hook() {
        let mut host = MemoryHost::new();
        let hook = Arc::new(CountingHook::default());
        host.install_undo_hook(hook.clone());

        host.open_chunk("demo.cmd").expect("open");
        host.scene_mut().create_node("n", "transform").expect("create");
        host.commit_chunk(ChunkDisposition::Hooked).expect("commit");
        assert_eq!(host.hooked_undo_len(), 1);

        assert!(host.undo());
        assert_eq!(hook.undone.load(Ordering::SeqCst), 1);
        assert_eq!(host.hooked_redo_len(), 1);

        assert!(host.redo());
        assert_eq!(hook.redone.load(Ordering::SeqCst), 1);
        assert_eq!(host.hooked_undo_len(), 1);
    }

    #[test]
    fn silent_commit_leaves_no_entry() {
        let mut host = MemoryHost::new();
        host.open_chunk("demo.silent").expect("open");
        host.scene_mut().create_node("kept", "transform").expect("create");
        host.commit_chunk(ChunkDisposition::Silent).expect("commit");

        assert_eq!(host.undo_queue_len(), 0);
        assert_eq!(host.scene().node_count(), 1);
        // Nothing to undo; the change is permanent.
        assert!(!host.undo());
        assert_eq!(host.scene().node_count(), 1);
    }

    #[test]
    fn new_entry_clears_redo_and_notifies_hook() {
        let mut host = MemoryHost::new();
        let hook = Arc::new(CountingHook::default());
        host.install_undo_hook(hook.clone());

        host.edit("one", |scene| scene.create_node("one", "transform")).expect("create");
        assert!(host.undo());
        assert_eq!(host.redo_queue_len(), 1);

        host.edit("two", |scene| scene.create_node("two", "transform")).expect("create");
        assert_eq!(host.redo_queue_len(), 0);
        assert_eq!(hook.redo_cleared.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn new_scene_clears_everything_and_notifies_hook() {
        let mut host = MemoryHost::new();
        let hook = Arc::new(CountingHook::default());
        host.install_undo_hook(hook.clone());

        host.edit("create", |scene| scene.create_node("n", "transform")).expect("create");
        host.new_scene();

        assert_eq!(host.scene().node_count(), 0);
        assert_eq!(host.undo_queue_len(), 0);
        assert_eq!(hook.cleared.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failed_edit_reverts_and_records_nothing() {
        let mut host = MemoryHost::new();
        let dead = NodeHandle { index: 42, generation: 0 };
        let before = host.snapshot();
        let result = host.edit("bad edit", |scene| {
            scene.create_node("temp", "transform")?;
            scene.delete_node(dead)
        });
        assert!(matches!(result, Err(HostError::DeadHandle { .. })));
        assert_eq!(host.snapshot(), before);
        assert_eq!(host.undo_queue_len(), 0);
    }
}
