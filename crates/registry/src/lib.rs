//! Command registry for the Opdeck framework.
//!
//! This crate owns the process-wide catalog of registered commands:
//!
//! - **`catalog`**: [`CommandRegistry`], the identifier → definition mapping
//!   with atomic bulk registration and O(1) lookup.
//! - **`library`**: [`LibraryCatalog`] plus env-variable discovery, resolving
//!   configured library names to the [`opdeck_types::CommandLibrary`]
//!   providers contributed by integrator crates.
//! - **`config`**: optional JSON config file supplying the library list when
//!   no env variable is set.
//! - **`ident`**: command identifier validation.

pub mod catalog;
pub mod config;
pub mod ident;
pub mod library;

pub use catalog::CommandRegistry;
pub use config::{RegistryConfig, default_config_path};
pub use ident::is_valid_command_id;
pub use library::{DEFAULT_LIBRARIES_ENV, LibraryCatalog};
