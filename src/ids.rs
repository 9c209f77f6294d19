//! Identifier generation for events and requests

use uuid::Uuid;

/// Generate a random, hyphenated UUID v4 identifier
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// Helper functions for generating deterministic IDs
pub struct IdGenerator;

impl IdGenerator {
    /// Generate a deterministic UUID v5 from a seed string
    /// This ensures the same seed always produces the same ID
    pub fn from_seed(seed: &str) -> String {
        Uuid::new_v5(&Uuid::NAMESPACE_OID, seed.as_bytes()).to_string()
    }

    /// Generate a deterministic ID from multiple components,
    /// e.g. a trace ID and a score name
    pub fn from_components(components: &[&str]) -> String {
        Self::from_seed(&components.join(":"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_id_is_uuid_v4() {
        let id = generate_id();
        let parsed = Uuid::parse_str(&id).unwrap();
        assert_eq!(parsed.get_version_num(), 4);
        assert_eq!(id.len(), 36);
    }

    #[test]
    fn test_generate_id_concurrently_unique() {
        let handles: Vec<_> = (0..8)
            .map(|_| std::thread::spawn(|| (0..250).map(|_| generate_id()).collect::<Vec<_>>()))
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(seen.insert(id), "duplicate id generated");
            }
        }
        assert_eq!(seen.len(), 2000);
    }

    #[test]
    fn test_seeded_ids_are_stable() {
        assert_eq!(IdGenerator::from_seed("run-42"), IdGenerator::from_seed("run-42"));
        assert_ne!(IdGenerator::from_seed("run-42"), IdGenerator::from_seed("run-43"));
        assert_eq!(
            IdGenerator::from_components(&["trace-1", "accuracy"]),
            IdGenerator::from_seed("trace-1:accuracy")
        );
    }
}
