//! Storage key helpers.

use crate::entity::Document;

/// Builder for storage keys.
pub struct DocumentKey;

impl DocumentKey {
    /// Build full key from document type and id.
    pub fn build<T: Document>(id: &T::Id) -> String {
        format!("{}:{}", T::collection(), id)
    }

    /// Build key with an explicit namespace.
    pub fn build_with_prefix(prefix: &str, id: &dyn std::fmt::Display) -> String {
        format!("{}:{}", prefix, id)
    }

    /// Build composite key from multiple parts.
    pub fn build_composite(parts: &[&str]) -> String {
        parts.join(":")
    }

    /// Split a key into its parts.
    pub fn parse(key: &str) -> Vec<&str> {
        key.split(':').collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Serialize, Deserialize)]
    struct Menu {
        id: String,
    }

    impl Document for Menu {
        type Id = String;

        fn document_id(&self) -> Self::Id {
            self.id.clone()
        }

        fn collection() -> &'static str {
            "menus"
        }
    }

    #[test]
    fn test_document_key() {
        let key = DocumentKey::build::<Menu>(&"menu_123".to_string());
        assert_eq!(key, "menus:menu_123");
    }

    #[test]
    fn test_key_with_prefix() {
        let key = DocumentKey::build_with_prefix("session", &"abc");
        assert_eq!(key, "session:abc");
    }

    #[test]
    fn test_composite_key_roundtrip() {
        let key = DocumentKey::build_composite(&["bookings", "active", "snapshot"]);
        assert_eq!(key, "bookings:active:snapshot");
        assert_eq!(
            DocumentKey::parse(&key),
            vec!["bookings", "active", "snapshot"]
        );
    }
}
