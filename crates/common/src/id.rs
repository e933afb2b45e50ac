//! ID generation and comparison utilities.

use std::sync::Mutex;

use ulid::{Generator, Ulid};

/// Process-wide generator so ids from every service sort in creation order.
static GENERATOR: Mutex<Generator> = Mutex::new(Generator::new());

/// ID generator for entities.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    _private: (),
}

impl IdGenerator {
    /// Create a new ID generator.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// Generate a new ULID-based ID.
    ///
    /// ULIDs are:
    /// - Lexicographically sortable
    /// - Monotonically increasing within the same millisecond
    /// - Shorter than UUIDs when represented as strings
    #[must_use]
    pub fn generate(&self) -> String {
        GENERATOR
            .lock()
            .ok()
            .and_then(|mut generator| generator.generate().ok())
            .unwrap_or_else(Ulid::new)
            .to_string()
            .to_lowercase()
    }
}

/// Canonical form of an entity or user id.
///
/// Ids reach the server from path segments, query strings and JSON bodies;
/// all of them are trimmed and lowercased before they are stored or compared.
#[must_use]
pub fn normalize_id(id: &str) -> String {
    id.trim().to_ascii_lowercase()
}

/// Compare two ids by value.
///
/// Equivalent to comparing their [`normalize_id`] forms, without allocating.
#[must_use]
pub fn id_equals(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_ulid() {
        let id_gen = IdGenerator::new();
        let id1 = id_gen.generate();
        let id2 = id_gen.generate();

        assert_eq!(id1.len(), 26);
        assert_eq!(id2.len(), 26);
        assert_ne!(id1, id2);
        assert_eq!(id1, id1.to_lowercase());
    }

    #[test]
    fn test_generated_ids_sort_in_creation_order() {
        let id_gen = IdGenerator::new();
        let ids: Vec<String> = (0..100).map(|_| id_gen.generate()).collect();

        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn test_id_equals_ignores_case_and_padding() {
        assert!(id_equals("64b7f0c2a1", "64B7F0C2A1"));
        assert!(id_equals(" 64b7f0c2a1 ", "64b7f0c2a1"));
        assert!(!id_equals("64b7f0c2a1", "64b7f0c2a2"));
        assert!(!id_equals("", "a"));
    }

    #[test]
    fn test_normalize_id_agrees_with_id_equals() {
        let raw = "  01HZX3ABCD  ";
        assert_eq!(normalize_id(raw), "01hzx3abcd");
        assert!(id_equals(raw, &normalize_id(raw)));
    }
}
