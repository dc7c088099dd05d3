//! The identifier → definition catalog.

use indexmap::IndexMap;
use tracing::debug;

use opdeck_types::{CommandDefinition, CommandDescriptor, CommandLibrary, RegistryError};

use crate::ident::is_valid_command_id;

/// Process-wide catalog of registered commands.
///
/// Lookups are O(1) and side-effect free. Registration is expected once per
/// process lifetime (or on explicit refresh); bulk registration is staged so
/// that a failing batch leaves the catalog exactly as it was; no partial
/// registration is ever observable.
#[derive(Default)]
pub struct CommandRegistry {
    commands: IndexMap<String, CommandDefinition>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a single definition.
    ///
    /// Fails with [`RegistryError::Duplicate`] when the identifier is already
    /// taken (the existing definition is retained) and with
    /// [`RegistryError::InvalidId`] for malformed identifiers.
    pub fn register(&mut self, definition: CommandDefinition) -> Result<(), RegistryError> {
        let id = definition.id().to_string();
        if !is_valid_command_id(&id) {
            return Err(RegistryError::InvalidId { id });
        }
        if self.commands.contains_key(&id) {
            return Err(RegistryError::Duplicate { id });
        }
        debug!(command = %id, "registered command");
        self.commands.insert(id, definition);
        Ok(())
    }

    /// Registers a batch atomically: every definition is validated against
    /// the catalog and against the rest of the batch before any is inserted.
    pub fn register_all(&mut self, definitions: Vec<CommandDefinition>) -> Result<(), RegistryError> {
        let mut staged: IndexMap<String, CommandDefinition> = IndexMap::with_capacity(definitions.len());
        for definition in definitions {
            let id = definition.id().to_string();
            if !is_valid_command_id(&id) {
                return Err(RegistryError::InvalidId { id });
            }
            if self.commands.contains_key(&id) || staged.contains_key(&id) {
                return Err(RegistryError::Duplicate { id });
            }
            staged.insert(id, definition);
        }
        self.commands.extend(staged);
        Ok(())
    }

    /// Registers every definition a library contributes, all or nothing.
    pub fn register_library(&mut self, library: &dyn CommandLibrary) -> Result<(), RegistryError> {
        let definitions = library.definitions();
        debug!(library = library.name(), commands = definitions.len(), "registering library");
        self.register_all(definitions)
    }

    /// Looks up a definition by identifier.
    pub fn get(&self, id: &str) -> Result<&CommandDefinition, RegistryError> {
        self.commands.get(id).ok_or_else(|| RegistryError::NotFound { id: id.to_string() })
    }

    /// True when the identifier is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.commands.contains_key(id)
    }

    /// Registered identifiers, in registration order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(String::as_str)
    }

    /// Registered descriptors, in registration order.
    pub fn descriptors(&self) -> impl Iterator<Item = &CommandDescriptor> {
        self.commands.values().map(|definition| &definition.descriptor)
    }

    /// Number of registered commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Removes a definition, returning whether it existed.
    pub fn unregister(&mut self, id: &str) -> bool {
        self.commands.shift_remove(id).is_some()
    }

    /// Drops every registration. Part of explicit teardown.
    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

impl std::fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRegistry").field("commands", &self.commands.keys()).finish()
    }
}
