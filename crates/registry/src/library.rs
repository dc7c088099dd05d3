//! Library discovery.
//!
//! Integrator crates contribute their commands as named
//! [`CommandLibrary`] providers, collected into a [`LibraryCatalog`] during
//! explicit startup init. Discovery configuration (a `;`-separated list of
//! library names in an environment variable, or the JSON config file) then
//! selects which of those libraries actually register. Selection is resolved
//! fully before anything is registered, so a bad location list never leaves a
//! half-populated registry.

use indexmap::IndexMap;
use tracing::debug;

use opdeck_types::{CommandDefinition, CommandLibrary, RegistryError};

use crate::catalog::CommandRegistry;

/// Default environment variable naming the libraries to register.
pub const DEFAULT_LIBRARIES_ENV: &str = "OPDECK_COMMAND_LIBRARIES";

/// The set of command libraries available to discovery, keyed by name.
#[derive(Default)]
pub struct LibraryCatalog {
    libraries: IndexMap<String, Box<dyn CommandLibrary>>,
}

impl LibraryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Contributes a library. Names are unique; providing the same name twice
    /// is a startup configuration error.
    pub fn provide(&mut self, library: Box<dyn CommandLibrary>) -> Result<(), RegistryError> {
        let name = library.name().to_string();
        if self.libraries.contains_key(&name) {
            return Err(RegistryError::DuplicateLibrary { name });
        }
        self.libraries.insert(name, library);
        Ok(())
    }

    /// Looks up a library by name.
    pub fn get(&self, name: &str) -> Result<&dyn CommandLibrary, RegistryError> {
        self.libraries
            .get(name)
            .map(Box::as_ref)
            .ok_or_else(|| RegistryError::UnknownLibrary { name: name.to_string() })
    }

    /// Names of every contributed library, in contribution order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.libraries.keys().map(String::as_str)
    }

    /// Number of contributed libraries.
    pub fn len(&self) -> usize {
        self.libraries.len()
    }

    /// True when no library has been contributed.
    pub fn is_empty(&self) -> bool {
        self.libraries.is_empty()
    }
}

impl std::fmt::Debug for LibraryCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LibraryCatalog").field("libraries", &self.libraries.keys()).finish()
    }
}

impl CommandRegistry {
    /// Registers the named libraries from `catalog`, atomically across the
    /// whole selection: unknown names and identifier conflicts are detected
    /// before any definition lands.
    pub fn register_selection<'a>(
        &mut self,
        names: impl IntoIterator<Item = &'a str>,
        catalog: &LibraryCatalog,
    ) -> Result<usize, RegistryError> {
        let mut definitions: Vec<CommandDefinition> = Vec::new();
        for name in names {
            let library = catalog.get(name)?;
            definitions.extend(library.definitions());
        }
        let count = definitions.len();
        self.register_all(definitions)?;
        Ok(count)
    }

    /// Registers the libraries named by the `var` environment variable, a
    /// `;`-separated list. An unset or empty variable registers nothing.
    /// Returns the number of commands registered.
    pub fn register_by_env(&mut self, var: &str, catalog: &LibraryCatalog) -> Result<usize, RegistryError> {
        let Ok(value) = std::env::var(var) else {
            debug!(var, "library env variable unset; nothing to register");
            return Ok(0);
        };
        let names: Vec<&str> = value.split(';').map(str::trim).filter(|name| !name.is_empty()).collect();
        self.register_selection(names, catalog)
    }
}
