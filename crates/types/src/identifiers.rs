//! Entity identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a topology entity.
///
/// Services, databases, and network links share a single id namespace:
/// an id is unique across the whole topology, and link endpoints refer to
/// entities by id rather than by reference.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Create an id from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_source_string() {
        let id = EntityId::new("checkout-svc");
        assert_eq!(id.to_string(), "checkout-svc");
        assert_eq!(id.as_str(), "checkout-svc");
    }

    #[test]
    fn test_equality_is_by_value() {
        assert_eq!(EntityId::from("a"), EntityId::new(String::from("a")));
        assert_ne!(EntityId::from("a"), EntityId::from("b"));
    }
}
