//! Ordered, JSON-valued command arguments.
//!
//! [`Args`] is the payload handed to `resolve_arguments` and `do_it`. Values
//! are `serde_json::Value` so commands can carry richer data than a host's
//! native string-only plugin interface permits, while remaining serializable
//! for history and diagnostics.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::scene::NodeHandle;

/// A named argument set with stable insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Args {
    values: IndexMap<String, Value>,
}

impl Args {
    /// Creates an empty argument set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, useful in tests and call sites:
    ///
    /// ```rust
    /// use opdeck_types::Args;
    ///
    /// let args = Args::new().with("name", "transform").with("amount", 10);
    /// assert_eq!(args.str("name"), Some("transform"));
    /// assert_eq!(args.i64("amount"), Some(10));
    /// ```
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Inserts or replaces a value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    /// Inserts `value` only when `key` is absent or explicitly null. Used by
    /// `resolve_arguments` hooks to inject defaults.
    pub fn or_default(&mut self, key: &str, value: impl Into<Value>) {
        match self.values.get(key) {
            Some(existing) if !existing.is_null() => {}
            _ => {
                self.values.insert(key.to_string(), value.into());
            }
        }
    }

    /// Raw value lookup.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// String accessor. Returns `None` for absent, null, or non-string values.
    pub fn str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }

    /// Integer accessor.
    pub fn i64(&self, key: &str) -> Option<i64> {
        self.values.get(key).and_then(Value::as_i64)
    }

    /// Float accessor; also accepts integer values.
    pub fn f64(&self, key: &str) -> Option<f64> {
        self.values.get(key).and_then(Value::as_f64)
    }

    /// Boolean accessor.
    pub fn bool(&self, key: &str) -> Option<bool> {
        self.values.get(key).and_then(Value::as_bool)
    }

    /// Decodes a [`NodeHandle`] previously stored with [`NodeHandle::to_value`].
    pub fn handle(&self, key: &str) -> Option<NodeHandle> {
        self.values.get(key).and_then(NodeHandle::from_value)
    }

    /// Number of arguments.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when no arguments are present.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates arguments in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }
}

impl From<IndexMap<String, Value>> for Args {
    fn from(values: IndexMap<String, Value>) -> Self {
        Self { values }
    }
}

impl FromIterator<(String, Value)> for Args {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}
