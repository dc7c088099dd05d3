//! The execution engine.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use tracing::{debug, warn};

use opdeck_host::{ChunkDisposition, Host};
use opdeck_registry::CommandRegistry;
use opdeck_types::{Args, ExecuteError, Outcome, RollbackStatus};

use crate::adapter::{HostUndoAdapter, LiveCommand, StackState};
use crate::history::{ExecutionHistory, ExecutionRecord, ExecutionStatus};

/// Drives commands through lookup, resolution, atomic execution, and undo
/// recording, keeping the internal undo stack synchronized with the host's
/// native queue.
///
/// One executor per process. Construction installs its [`HostUndoAdapter`]
/// into the host; [`Executor::teardown`] detaches it again and clears every
/// registration.
pub struct Executor {
    registry: CommandRegistry,
    host: Arc<Mutex<dyn Host>>,
    stacks: Arc<Mutex<StackState>>,
    history: Mutex<ExecutionHistory>,
    // Serializes the execute/undo/redo critical section; commands are
    // coarse-grained and user-triggered, so contention is not a concern.
    exec_guard: Mutex<()>,
}

impl Executor {
    /// Creates an executor bound to `host` and installs the undo adapter.
    pub fn new(host: Arc<Mutex<dyn Host>>) -> Self {
        let stacks = Arc::new(Mutex::new(StackState::default()));
        let adapter = Arc::new(HostUndoAdapter::new(stacks.clone()));
        host.lock().expect("host lock poisoned").install_undo_hook(adapter);
        Self {
            registry: CommandRegistry::new(),
            host,
            stacks,
            history: Mutex::new(ExecutionHistory::default()),
            exec_guard: Mutex::new(()),
        }
    }

    /// The command registry, for lookups and introspection.
    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Mutable registry access for startup registration.
    pub fn registry_mut(&mut self) -> &mut CommandRegistry {
        &mut self.registry
    }

    /// Executes a registered command.
    ///
    /// Returns [`Outcome::Cancelled`] when argument resolution cancels (an
    /// expected, recoverable outcome) and [`ExecuteError`] for unknown
    /// identifiers or failures during `do_it`. A `do_it` failure is rolled
    /// back before the error is surfaced, and the rollback status rides on
    /// the error: partial application is the one thing this path must never
    /// leave behind.
    pub fn execute(&self, id: &str, args: Args) -> Result<Outcome, ExecuteError> {
        let _guard = self.exec_guard.lock().expect("executor lock poisoned");

        // Lookup + instantiate.
        let definition = match self.registry.get(id) {
            Ok(definition) => definition,
            Err(_) => return Err(ExecuteError::NotFound { id: id.to_string() }),
        };
        let descriptor = definition.descriptor.clone();
        let mut command = definition.instantiate();
        debug!(command = %descriptor.id, undoable = descriptor.undoable, "executing");

        let mut host = self.host.lock().expect("host lock poisoned");

        // Resolve, outside the undo boundary; no host state has changed yet.
        let resolved = match command.resolve_arguments(host.scene(), args) {
            Ok(resolved) => resolved,
            Err(cancel) => {
                debug!(command = %descriptor.id, reason = %cancel.reason, "cancelled during resolution");
                self.record(&descriptor.id, ExecutionStatus::Cancelled);
                return Ok(Outcome::Cancelled { reason: cancel.reason });
            }
        };

        // Execute inside one undo chunk so the host sees a single atomic step.
        host.open_chunk(&descriptor.id)?;
        match command.do_it(host.scene_mut(), &resolved) {
            Ok(value) => {
                if descriptor.undoable {
                    host.commit_chunk(ChunkDisposition::Hooked)?;
                    let mut stacks = self.stacks.lock().expect("undo stack lock poisoned");
                    stacks.undo.push(LiveCommand {
                        descriptor: descriptor.clone(),
                        command,
                        args: resolved,
                        executed_at: Utc::now(),
                    });
                } else {
                    host.commit_chunk(ChunkDisposition::Silent)?;
                }
                self.record(&descriptor.id, ExecutionStatus::Completed);
                Ok(Outcome::Completed(value))
            }
            Err(error) => {
                let rollback = match host.rollback_chunk() {
                    Ok(()) => RollbackStatus::Complete,
                    Err(host_error) => RollbackStatus::Failed(host_error.to_string()),
                };
                warn!(command = %descriptor.id, error = %error, rollback = %rollback, "do_it failed");
                self.record(&descriptor.id, ExecutionStatus::Failed);
                Err(ExecuteError::Execution {
                    id: descriptor.id,
                    message: format!("{error:#}"),
                    rollback,
                })
            }
        }
    }

    /// Undoes the most recent host entry, provided the framework has
    /// something to undo. Returns false as a defensive no-op when the
    /// internal stack is empty; the host may call in that state and an empty
    /// stack is never surfaced as an error.
    pub fn undo_last(&self) -> bool {
        let _guard = self.exec_guard.lock().expect("executor lock poisoned");
        if self.stacks.lock().expect("undo stack lock poisoned").undo.is_empty() {
            debug!("undo requested with an empty undo stack; no-op");
            return false;
        }
        self.host.lock().expect("host lock poisoned").undo()
    }

    /// Redoes the most recently undone entry; symmetric with
    /// [`Executor::undo_last`].
    pub fn redo_last(&self) -> bool {
        let _guard = self.exec_guard.lock().expect("executor lock poisoned");
        if self.stacks.lock().expect("undo stack lock poisoned").redo.is_empty() {
            debug!("redo requested with an empty redo stack; no-op");
            return false;
        }
        self.host.lock().expect("host lock poisoned").redo()
    }

    /// Clears both native queues and, through the adapter, both internal
    /// stacks.
    pub fn flush(&self) {
        let _guard = self.exec_guard.lock().expect("executor lock poisoned");
        self.host.lock().expect("host lock poisoned").clear_undo_queues();
    }

    /// Internal undo stack depth.
    pub fn undo_stack_len(&self) -> usize {
        self.stacks.lock().expect("undo stack lock poisoned").undo.len()
    }

    /// Internal redo stack depth.
    pub fn redo_stack_len(&self) -> usize {
        self.stacks.lock().expect("undo stack lock poisoned").redo.len()
    }

    /// Identifiers currently on the internal undo stack, oldest first.
    pub fn undo_stack_ids(&self) -> Vec<String> {
        self.stacks
            .lock()
            .expect("undo stack lock poisoned")
            .undo
            .iter()
            .map(|live| live.descriptor.id.clone())
            .collect()
    }

    /// True when the internal stacks mirror the host's hook-tagged entries
    /// one to one. The two stacks are logically one stack with two views;
    /// this is the invariant the adapter maintains.
    pub fn stacks_in_sync(&self) -> bool {
        let host = self.host.lock().expect("host lock poisoned");
        let stacks = self.stacks.lock().expect("undo stack lock poisoned");
        stacks.undo.len() == host.hooked_undo_len() && stacks.redo.len() == host.hooked_redo_len()
    }

    /// Snapshot of the recent execution history, oldest first.
    pub fn history(&self) -> Vec<ExecutionRecord> {
        self.history.lock().expect("history lock poisoned").iter().cloned().collect()
    }

    /// Explicit teardown: flush both stacks, detach the adapter from the
    /// host, and drop every registration.
    pub fn teardown(&mut self) {
        self.flush();
        self.host.lock().expect("host lock poisoned").clear_undo_hook();
        self.registry.clear();
    }

    fn record(&self, id: &str, status: ExecutionStatus) {
        self.history.lock().expect("history lock poisoned").record(id, status);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opdeck_host::MemoryHost;
    use opdeck_types::{Cancel, Command, CommandDefinition, CommandDescriptor, NodeHandle, SceneOps, SceneQuery};
    use serde_json::Value;

    /// Creates one node; forgets it on undo. Mirrors the smallest useful
    /// undoable command.
    #[derive(Default)]
    struct CreateOneCommand {
        created: Option<NodeHandle>,
    }

    impl Command for CreateOneCommand {
        fn resolve_arguments(&mut self, _scene: &dyn SceneQuery, mut args: Args) -> Result<Args, Cancel> {
            if args.str("name").is_none_or(str::is_empty) {
                return Err(Cancel::because("Please provide a name!"));
            }
            args.or_default("type", "transform");
            Ok(args)
        }

        fn do_it(&mut self, scene: &mut dyn SceneOps, args: &Args) -> anyhow::Result<Value> {
            let name = args.str("name").unwrap_or_default();
            let node_type = args.str("type").unwrap_or_default();
            let handle = scene.create_node(name, node_type)?;
            self.created = Some(handle);
            Ok(handle.to_value())
        }

        fn undo_it(&mut self, scene: &mut dyn SceneOps) -> anyhow::Result<bool> {
            match self.created.take() {
                Some(handle) if scene.node_exists(handle) => {
                    scene.delete_node(handle)?;
                    Ok(true)
                }
                _ => Ok(false),
            }
        }
    }

    /// Mutates the scene and then fails, to exercise rollback.
    struct PartialFailCommand;

    impl Command for PartialFailCommand {
        fn resolve_arguments(&mut self, _scene: &dyn SceneQuery, args: Args) -> Result<Args, Cancel> {
            Ok(args)
        }

        fn do_it(&mut self, scene: &mut dyn SceneOps, _args: &Args) -> anyhow::Result<Value> {
            scene.create_node("partial_a", "transform")?;
            scene.create_node("partial_b", "transform")?;
            anyhow::bail!("simulated mid-command failure")
        }

        fn undo_it(&mut self, _scene: &mut dyn SceneOps) -> anyhow::Result<bool> {
            Ok(false)
        }
    }

    /// State-changing but declared non-undoable.
    struct TagSceneCommand;

    impl Command for TagSceneCommand {
        fn resolve_arguments(&mut self, _scene: &dyn SceneQuery, args: Args) -> Result<Args, Cancel> {
            Ok(args)
        }

        fn do_it(&mut self, scene: &mut dyn SceneOps, _args: &Args) -> anyhow::Result<Value> {
            scene.create_node("session_tag", "annotation")?;
            Ok(Value::String("hello world".into()))
        }

        fn undo_it(&mut self, _scene: &mut dyn SceneOps) -> anyhow::Result<bool> {
            Ok(false)
        }
    }

    fn executor_with(host: &Arc<Mutex<MemoryHost>>) -> Executor {
        let mut executor = Executor::new(host.clone() as Arc<Mutex<dyn Host>>);
        let registry = executor.registry_mut();
        registry
            .register(CommandDefinition::new(
                CommandDescriptor::new("test.createOne", "tests", true),
                || Box::new(CreateOneCommand::default()),
            ))
            .expect("register test.createOne");
        registry
            .register(CommandDefinition::new(
                CommandDescriptor::new("test.partialFail", "tests", true),
                || Box::new(PartialFailCommand),
            ))
            .expect("register test.partialFail");
        registry
            .register(CommandDefinition::new(
                CommandDescriptor::new("test.tagScene", "tests", false),
                || Box::new(TagSceneCommand),
            ))
            .expect("register test.tagScene");
        executor
    }

    #[test]
    fn execute_records_an_undoable_command() {
        let host = Arc::new(Mutex::new(MemoryHost::new()));
        let executor = executor_with(&host);

        let outcome = executor.execute("test.createOne", Args::new().with("name", "orb")).expect("execute");
        let handle = NodeHandle::from_value(outcome.value().expect("value")).expect("handle");

        assert!(host.lock().expect("host").scene().node_exists(handle));
        assert_eq!(executor.undo_stack_len(), 1);
        assert!(executor.stacks_in_sync());
    }

    #[test]
    fn unknown_identifier_fails_lookup() {
        let host = Arc::new(Mutex::new(MemoryHost::new()));
        let executor = executor_with(&host);

        let err = executor.execute("test.missing", Args::new()).expect_err("unknown id");
        assert!(matches!(err, ExecuteError::NotFound { ref id } if id == "test.missing"));
        assert_eq!(executor.undo_stack_len(), 0);
    }

    #[test]
    fn cancellation_leaves_host_untouched() {
        let host = Arc::new(Mutex::new(MemoryHost::new()));
        let executor = executor_with(&host);
        let before = host.lock().expect("host").snapshot();

        let outcome = executor.execute("test.createOne", Args::new()).expect("execute");
        assert_eq!(outcome.cancel_reason(), Some("Please provide a name!"));

        let host = host.lock().expect("host");
        assert_eq!(host.snapshot(), before);
        assert_eq!(host.undo_queue_len(), 0);
        assert_eq!(executor.undo_stack_len(), 0);
    }

    #[test]
    fn failed_do_it_rolls_back_partial_mutation() {
        let host = Arc::new(Mutex::new(MemoryHost::new()));
        let executor = executor_with(&host);
        let before = host.lock().expect("host").snapshot();

        let err = executor.execute("test.partialFail", Args::new()).expect_err("must fail");
        match err {
            ExecuteError::Execution { id, rollback, .. } => {
                assert_eq!(id, "test.partialFail");
                assert_eq!(rollback, RollbackStatus::Complete);
            }
            other => panic!("unexpected error: {other}"),
        }

        let host = host.lock().expect("host");
        assert_eq!(host.snapshot(), before);
        assert_eq!(host.undo_queue_len(), 0);
        assert_eq!(executor.undo_stack_len(), 0);
    }

    #[test]
    fn non_undoable_commands_skip_both_stacks() {
        let host = Arc::new(Mutex::new(MemoryHost::new()));
        let executor = executor_with(&host);

        let outcome = executor.execute("test.tagScene", Args::new()).expect("execute");
        assert_eq!(outcome.value(), Some(&Value::String("hello world".into())));

        assert_eq!(executor.undo_stack_len(), 0);
        assert_eq!(host.lock().expect("host").undo_queue_len(), 0);
        assert!(!executor.undo_last());
    }

    #[test]
    fn native_undo_and_redo_move_the_internal_stack() {
        let host = Arc::new(Mutex::new(MemoryHost::new()));
        let executor = executor_with(&host);

        executor.execute("test.createOne", Args::new().with("name", "orb")).expect("execute");
        assert_eq!(executor.undo_stack_len(), 1);

        // The user presses the native undo key; the host drives the adapter.
        assert!(host.lock().expect("host").undo());
        assert_eq!(executor.undo_stack_len(), 0);
        assert_eq!(executor.redo_stack_len(), 1);
        assert!(executor.stacks_in_sync());
        assert_eq!(host.lock().expect("host").scene().node_count(), 0);

        assert!(host.lock().expect("host").redo());
        assert_eq!(executor.undo_stack_len(), 1);
        assert_eq!(executor.redo_stack_len(), 0);
        assert!(executor.stacks_in_sync());
        assert_eq!(host.lock().expect("host").scene().node_count(), 1);
    }

    #[test]
    fn engine_undo_is_a_noop_on_an_empty_stack() {
        let host = Arc::new(Mutex::new(MemoryHost::new()));
        let executor = executor_with(&host);
        assert!(!executor.undo_last());
        assert!(!executor.redo_last());
    }

    #[test]
    fn flush_clears_both_views() {
        let host = Arc::new(Mutex::new(MemoryHost::new()));
        let executor = executor_with(&host);

        executor.execute("test.createOne", Args::new().with("name", "orb")).expect("execute");
        assert_eq!(executor.undo_stack_len(), 1);

        executor.flush();
        assert_eq!(executor.undo_stack_len(), 0);
        assert_eq!(host.lock().expect("host").undo_queue_len(), 0);
        assert!(!executor.undo_last());
    }

    #[test]
    fn host_scene_reset_drops_retained_instances() {
        let host = Arc::new(Mutex::new(MemoryHost::new()));
        let executor = executor_with(&host);

        executor.execute("test.createOne", Args::new().with("name", "orb")).expect("execute");
        host.lock().expect("host").new_scene();

        assert_eq!(executor.undo_stack_len(), 0);
        assert_eq!(executor.redo_stack_len(), 0);
        assert!(executor.stacks_in_sync());
    }

    #[test]
    fn new_command_after_undo_clears_redo_in_both_views() {
        let host = Arc::new(Mutex::new(MemoryHost::new()));
        let executor = executor_with(&host);

        executor.execute("test.createOne", Args::new().with("name", "first")).expect("execute");
        assert!(host.lock().expect("host").undo());
        assert_eq!(executor.redo_stack_len(), 1);

        executor.execute("test.createOne", Args::new().with("name", "second")).expect("execute");
        assert_eq!(executor.redo_stack_len(), 0);
        assert!(executor.stacks_in_sync());
    }

    #[test]
    fn history_tracks_terminal_states() {
        let host = Arc::new(Mutex::new(MemoryHost::new()));
        let executor = executor_with(&host);

        executor.execute("test.createOne", Args::new().with("name", "orb")).expect("execute");
        executor.execute("test.createOne", Args::new()).expect("cancel");
        let _ = executor.execute("test.partialFail", Args::new());

        let statuses: Vec<ExecutionStatus> = executor.history().iter().map(|record| record.status).collect();
        assert_eq!(
            statuses,
            vec![ExecutionStatus::Completed, ExecutionStatus::Cancelled, ExecutionStatus::Failed]
        );
    }

    #[test]
    fn teardown_detaches_the_adapter_and_clears_the_registry() {
        let host = Arc::new(Mutex::new(MemoryHost::new()));
        let mut executor = executor_with(&host);

        executor.execute("test.createOne", Args::new().with("name", "orb")).expect("execute");
        executor.teardown();

        assert!(executor.registry().is_empty());
        assert_eq!(executor.undo_stack_len(), 0);
        let err = executor.execute("test.createOne", Args::new()).expect_err("registry cleared");
        assert!(matches!(err, ExecuteError::NotFound { .. }));
    }
}
