//! The command contract: descriptor metadata, the capability trait, and the
//! registration surface.
//!
//! A concrete command implements [`Command`]. Its static metadata lives in a
//! [`CommandDescriptor`], and the two are tied together by a
//! [`CommandDefinition`], which the registry stores and the engine uses to
//! mint one fresh instance per execution.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::args::Args;
use crate::scene::{SceneOps, SceneQuery};

/// Presentation metadata for shelves, palettes, and menus.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiMetadata {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub tooltip: String,
}

/// Static metadata describing a registered command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandDescriptor {
    /// Unique dotted identifier, e.g. `create.nodes`.
    pub id: String,
    /// Free-text attribution for the command's author.
    #[serde(default)]
    pub creator: String,
    /// Whether executions are recorded on the undo stacks.
    pub undoable: bool,
    /// Presentation metadata.
    #[serde(default)]
    pub ui: UiMetadata,
}

impl CommandDescriptor {
    /// Convenience constructor; `ui` defaults to empty metadata.
    pub fn new(id: impl Into<String>, creator: impl Into<String>, undoable: bool) -> Self {
        Self {
            id: id.into(),
            creator: creator.into(),
            undoable,
            ui: UiMetadata::default(),
        }
    }
}

/// Cooperative cancellation raised from `resolve_arguments`.
///
/// This is the only escape hatch a command has, and it is only expressible
/// before any host mutation: `do_it` has no way to produce a `Cancel`. The
/// reason is a user-facing message, not a developer diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct Cancel {
    pub reason: String,
}

impl Cancel {
    /// Cancels with the given user-facing reason.
    ///
    /// ```rust
    /// use opdeck_types::Cancel;
    ///
    /// let cancel = Cancel::because("Please provide a name!");
    /// assert_eq!(cancel.reason, "Please provide a name!");
    /// ```
    pub fn because(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

/// Result of a successful `execute` call: either the command's value or an
/// explicit cancellation signal. Cancellation is an expected outcome, never an
/// error dressed up as success.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Outcome {
    /// The command ran; carries its result value.
    Completed(Value),
    /// Resolution cancelled before any host mutation.
    Cancelled { reason: String },
}

impl Outcome {
    /// The result value, when the command completed.
    pub fn value(&self) -> Option<&Value> {
        match self {
            Outcome::Completed(value) => Some(value),
            Outcome::Cancelled { .. } => None,
        }
    }

    /// True for the cancellation variant.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Outcome::Cancelled { .. })
    }

    /// The cancellation reason, when cancelled.
    pub fn cancel_reason(&self) -> Option<&str> {
        match self {
            Outcome::Cancelled { reason } => Some(reason),
            Outcome::Completed(_) => None,
        }
    }
}

/// The capability contract a concrete command fulfills.
///
/// Lifecycle per execution: `resolve_arguments` runs first, outside the
/// host's undo-chunk boundary, against a read-only scene view; `do_it` then
/// performs the whole state change in a single batch inside the chunk;
/// `undo_it`/`redo_it` run later, dispatched from the host's native undo keys
/// through the adapter.
///
/// Implementations that cache scene objects across these calls must cache
/// [`crate::NodeHandle`]s, never resolved records: an instance retained on
/// the undo stack outlives the call that produced it.
pub trait Command: Send {
    /// Validates and normalizes the raw arguments; may inject defaults.
    ///
    /// Returning [`Cancel`] aborts the execution before any host mutation and
    /// surfaces the reason to the caller. Must not mutate host state.
    fn resolve_arguments(&mut self, scene: &dyn SceneQuery, args: Args) -> Result<Args, Cancel>;

    /// Performs the state change exactly once and records whatever opaque
    /// state this instance needs to reverse it. Runs inside the engine's undo
    /// chunk; every mutation it makes is grouped into one native undo entry.
    fn do_it(&mut self, scene: &mut dyn SceneOps, args: &Args) -> anyhow::Result<Value>;

    /// Reverses the effect of `do_it` using only state recorded on this
    /// instance. Returns `Ok(false)` when there is nothing recorded to
    /// reverse; calling it before a successful `do_it` must be a safe no-op.
    fn undo_it(&mut self, scene: &mut dyn SceneOps) -> anyhow::Result<bool>;

    /// Reapplies the change after an undo. Defaults to replaying `do_it`
    /// with the resolved arguments, which recreates equivalent state but not
    /// necessarily identical node identity.
    fn redo_it(&mut self, scene: &mut dyn SceneOps, args: &Args) -> anyhow::Result<Value> {
        self.do_it(scene, args)
    }
}

/// Factory minting one fresh command instance per execution.
pub type CommandFactory = Arc<dyn Fn() -> Box<dyn Command> + Send + Sync>;

/// A registered command: descriptor plus instance factory.
#[derive(Clone)]
pub struct CommandDefinition {
    pub descriptor: CommandDescriptor,
    factory: CommandFactory,
}

impl CommandDefinition {
    /// Binds a descriptor to a factory.
    pub fn new<F>(descriptor: CommandDescriptor, factory: F) -> Self
    where
        F: Fn() -> Box<dyn Command> + Send + Sync + 'static,
    {
        Self {
            descriptor,
            factory: Arc::new(factory),
        }
    }

    /// Identifier shorthand.
    pub fn id(&self) -> &str {
        &self.descriptor.id
    }

    /// Mints a fresh instance for one execute/undo/redo cycle.
    pub fn instantiate(&self) -> Box<dyn Command> {
        (self.factory)()
    }
}

impl std::fmt::Debug for CommandDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandDefinition")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

/// A named collection of command definitions contributed by an integrator
/// crate. Libraries are what the registry's discovery step resolves: the
/// configured location list names libraries, and each selected library hands
/// over its definitions in one atomic batch.
pub trait CommandLibrary: Send + Sync {
    /// Stable library name, matched against discovery configuration.
    fn name(&self) -> &str;

    /// The definitions this library contributes.
    fn definitions(&self) -> Vec<CommandDefinition>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullCommand;

    impl Command for NullCommand {
        fn resolve_arguments(&mut self, _scene: &dyn SceneQuery, args: Args) -> Result<Args, Cancel> {
            Ok(args)
        }

        fn do_it(&mut self, _scene: &mut dyn SceneOps, _args: &Args) -> anyhow::Result<Value> {
            Ok(Value::Null)
        }

        fn undo_it(&mut self, _scene: &mut dyn SceneOps) -> anyhow::Result<bool> {
            Ok(false)
        }
    }

    #[test]
    fn definition_mints_fresh_instances() {
        let definition = CommandDefinition::new(CommandDescriptor::new("test.null", "tests", false), || {
            Box::new(NullCommand)
        });
        assert_eq!(definition.id(), "test.null");
        let _first = definition.instantiate();
        let _second = definition.instantiate();
    }

    #[test]
    fn outcome_accessors_distinguish_variants() {
        let done = Outcome::Completed(Value::from(3));
        assert!(!done.is_cancelled());
        assert_eq!(done.value(), Some(&Value::from(3)));

        let cancelled = Outcome::Cancelled {
            reason: "Please provide a name!".into(),
        };
        assert!(cancelled.is_cancelled());
        assert_eq!(cancelled.cancel_reason(), Some("Please provide a name!"));
        assert_eq!(cancelled.value(), None);
    }
}
