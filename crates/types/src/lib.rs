//! Shared contract types for the Opdeck command framework.
//!
//! This crate defines the vocabulary every other Opdeck crate speaks:
//!
//! - **`command`**: the [`Command`] capability trait, [`CommandDescriptor`]
//!   metadata, and the registration surface ([`CommandDefinition`],
//!   [`CommandLibrary`]).
//! - **`args`**: [`Args`], the ordered, JSON-valued argument set passed
//!   through resolution and execution.
//! - **`scene`**: [`NodeHandle`] plus the [`SceneQuery`]/[`SceneOps`] traits a
//!   host exposes to commands.
//! - **`errors`**: the error taxonomy shared by the registry, engine, and
//!   host crates.

pub mod args;
pub mod command;
pub mod errors;
pub mod scene;

pub use args::Args;
pub use command::{
    Cancel, Command, CommandDefinition, CommandDescriptor, CommandFactory, CommandLibrary, Outcome, UiMetadata,
};
pub use errors::{ExecuteError, HostError, RegistryError, RollbackStatus};
pub use scene::{NodeHandle, SceneOps, SceneQuery};
