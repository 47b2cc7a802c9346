//! SHA-256 fingerprints of lookup content.
//!
//! A fingerprint digests the canonical lines of a seed set (see
//! [`SeedSet::canonical_lines`]). The same digest computed over the rows
//! currently stored in the lookup tables tells whether a database matches
//! the seed it was configured with.

use bookstore_schema_core::SeedSet;
use sha2::{Digest, Sha256};

/// Computes the SHA-256 hex digest of already-canonical lines.
///
/// Lines are sorted before hashing so callers need not agree on order.
pub fn fingerprint_lines(lines: &[String]) -> String {
    let mut sorted: Vec<&str> = lines.iter().map(String::as_str).collect();
    sorted.sort_unstable();

    let mut hasher = Sha256::new();
    for line in sorted {
        hasher.update(line.as_bytes());
        hasher.update(b"\n");
    }
    format!("{:x}", hasher.finalize())
}

/// Computes the fingerprint of a seed set.
///
/// # Examples
///
/// ```
/// use bookstore_schema_core::SeedSet;
/// use bookstore_schema_db::seed_fingerprint;
///
/// let a = seed_fingerprint(&SeedSet::bookstore_defaults());
/// let b = seed_fingerprint(&SeedSet::bookstore_defaults());
/// assert_eq!(a, b);
/// assert_eq!(a.len(), 64);
/// ```
pub fn seed_fingerprint(seed: &SeedSet) -> String {
    fingerprint_lines(&seed.canonical_lines())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookstore_schema_core::SeedValue;

    #[test]
    fn test_fingerprint_changes_with_content() {
        let defaults = SeedSet::bookstore_defaults();
        let mut changed = defaults.clone();
        changed.tables[3].rows[0][1] = SeedValue::Decimal(6.0);

        assert_ne!(seed_fingerprint(&defaults), seed_fingerprint(&changed));
    }

    #[test]
    fn test_fingerprint_ignores_line_order() {
        let lines = vec!["b".to_string(), "a".to_string()];
        let reversed = vec!["a".to_string(), "b".to_string()];
        assert_eq!(fingerprint_lines(&lines), fingerprint_lines(&reversed));
    }
}
