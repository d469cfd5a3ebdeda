//! Cache fingerprints for clause analysis results.
//!
//! A fingerprint is the SHA-256 of the trimmed clause text and the scoring
//! ruleset version, NUL-separated so the two inputs cannot collide across
//! the boundary. Identical clause text under the same ruleset always maps
//! to the same cache slot; a ruleset bump changes every fingerprint and so
//! implicitly invalidates prior entries.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Stable cache key derived from clause content and ruleset version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Compute the fingerprint for a clause under a ruleset version.
    pub fn compute(clause_text: &str, ruleset_version: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(clause_text.trim().as_bytes());
        hasher.update([0u8]);
        hasher.update(ruleset_version.as_bytes());
        let digest = hasher.finalize();

        let mut hex = String::with_capacity(digest.len() * 2);
        for byte in digest {
            use std::fmt::Write;
            write!(hex, "{byte:02x}").expect("writing to String cannot fail");
        }
        Self(hex)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic() {
        let a = Fingerprint::compute("the same clause", "v1");
        let b = Fingerprint::compute("the same clause", "v1");
        assert_eq!(a, b);
    }

    #[test]
    fn distinct_text_distinct_fingerprint() {
        let a = Fingerprint::compute("clause one", "v1");
        let b = Fingerprint::compute("clause two", "v1");
        assert_ne!(a, b);
    }

    #[test]
    fn ruleset_version_changes_fingerprint() {
        let a = Fingerprint::compute("the same clause", "v1");
        let b = Fingerprint::compute("the same clause", "v2");
        assert_ne!(a, b);
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        let a = Fingerprint::compute("  clause text \n", "v1");
        let b = Fingerprint::compute("clause text", "v1");
        assert_eq!(a, b);
    }

    #[test]
    fn nul_separator_prevents_boundary_collisions() {
        let a = Fingerprint::compute("abc", "1");
        let b = Fingerprint::compute("abc1", "");
        assert_ne!(a, b);
    }

    #[test]
    fn is_lowercase_hex_sha256() {
        let fp = Fingerprint::compute("x", "v1");
        assert_eq!(fp.as_str().len(), 64);
        assert!(fp.as_str().chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }
}
