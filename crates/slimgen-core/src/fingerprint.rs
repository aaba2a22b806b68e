//! Content fingerprints of the tree set handed to a compilation
//!
//! Two builds that bind byte-identical trees in the same order produce the
//! same fingerprint, which makes "pruning disabled changes nothing" checkable
//! from the outside.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// SHA-256 over the ordered `(name, text)` pairs of a compilation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFingerprint {
    pub hash: String,
    pub tree_count: usize,
}

/// Builder for creating source fingerprints
pub struct FingerprintBuilder {
    hasher: Sha256,
    tree_count: usize,
}

impl FingerprintBuilder {
    pub fn new() -> Self {
        Self {
            hasher: Sha256::new(),
            tree_count: 0,
        }
    }

    /// Add one tree; names and texts are length-prefixed so boundaries count
    pub fn add_tree(&mut self, name: &str, text: &str) -> &mut Self {
        for part in [name, text] {
            self.hasher.update((part.len() as u64).to_le_bytes());
            self.hasher.update(part.as_bytes());
        }
        self.tree_count += 1;
        self
    }

    pub fn build(&self) -> SourceFingerprint {
        SourceFingerprint {
            hash: format!("{:x}", self.hasher.clone().finalize()),
            tree_count: self.tree_count,
        }
    }
}

impl Default for FingerprintBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceFingerprint {
    /// Get a short hash for display purposes
    pub fn short_hash(&self) -> String {
        self.hash.chars().take(12).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_inputs_same_fingerprint() {
        let a = FingerprintBuilder::new()
            .add_tree("A.cs", "class A {}")
            .add_tree("<entry>", "class E {}")
            .build();
        let b = FingerprintBuilder::new()
            .add_tree("A.cs", "class A {}")
            .add_tree("<entry>", "class E {}")
            .build();
        assert_eq!(a, b);
        assert_eq!(a.tree_count, 2);
        assert_eq!(a.short_hash().len(), 12);
    }

    #[test]
    fn test_boundaries_matter() {
        let a = FingerprintBuilder::new().add_tree("ab", "c").build();
        let b = FingerprintBuilder::new().add_tree("a", "bc").build();
        assert_ne!(a.hash, b.hash);
    }
}
