//! Command identifier validation.

use once_cell::sync::Lazy;
use regex::Regex;

/// Identifiers are dotted, at least two segments, starting with a lowercase
/// letter: `create.nodes`, `zoo.meta.camera.create`.
static ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z][a-zA-Z0-9_]*(\.[a-zA-Z0-9_]+)+$").expect("identifier pattern compiles"));

/// True when `id` is an acceptable command identifier.
pub fn is_valid_command_id(id: &str) -> bool {
    ID_PATTERN.is_match(id)
}
