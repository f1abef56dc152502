//! Entity identifiers

use serde::Serialize;
use std::fmt;
use uuid::Uuid;

/// Opaque identifier for an entity in the state tree
///
/// At runtime this is just a string, but the field is private: the only
/// ways to obtain one are [`entity_id`] and [`generate_id`], so a raw
/// `String` can never be passed where an id is expected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Get the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Wrap a known raw id (deterministic)
pub fn entity_id(raw: impl Into<String>) -> EntityId {
    EntityId(raw.into())
}

/// Create a fresh random id (UUID v4)
pub fn generate_id() -> EntityId {
    EntityId(Uuid::new_v4().to_string())
}
