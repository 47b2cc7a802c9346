//! Seed loading with builder pattern and fallback chains.
//!
//! Provides [`load_seed_file`] for reading a single YAML or JSON seed file
//! and [`SeedLoader`] for trying several sources in order.
//!
//! # Loading patterns
//!
//! ```no_run
//! use bookstore_schema_db::{SeedLoader, load_seed_file};
//!
//! // Load one file
//! let seed = load_seed_file("seeds/lookups.yaml").unwrap();
//!
//! // Prefer a file, fall back to the built-in rows
//! let loaded = SeedLoader::new()
//!     .from_file("seeds/lookups.yaml")
//!     .with_defaults()
//!     .load()
//!     .unwrap();
//! println!("{} rows from {:?}", loaded.seed.row_count(), loaded.source);
//! ```
//!
//! Every loaded set is validated against the bookstore catalog before it is
//! returned.

use std::path::{Path, PathBuf};

use bookstore_schema_core::{SeedSet, bookstore_catalog, validate_seed};
use tracing::{debug, warn};

use crate::error::{DatabaseError, Result};

/// Describes where a [`SeedSet`] was loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedSource {
    /// A YAML or JSON seed file.
    File(PathBuf),
    /// The built-in bookstore rows.
    Defaults,
}

/// A validated seed set together with its origin.
#[derive(Debug, Clone)]
pub struct LoadedSeed {
    pub seed: SeedSet,
    pub source: SeedSource,
}

/// Reads a seed file, choosing the parser from the file extension.
///
/// `.yaml` and `.yml` are parsed as YAML, `.json` as JSON.
///
/// # Errors
///
/// Returns [`DatabaseError::UnsupportedFormat`] for other extensions,
/// [`DatabaseError::IoError`] if the file cannot be read, a parse error, or
/// [`DatabaseError::InvalidSeed`] if the rows do not fit the catalog.
pub fn load_seed_file(path: impl AsRef<Path>) -> Result<SeedSet> {
    let path = path.as_ref();
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();

    let seed: SeedSet = match ext {
        "yaml" | "yml" => {
            let reader = std::io::BufReader::new(std::fs::File::open(path)?);
            serde_yaml::from_reader(reader)?
        }
        "json" => {
            let reader = std::io::BufReader::new(std::fs::File::open(path)?);
            serde_json::from_reader(reader)?
        }
        other => return Err(DatabaseError::UnsupportedFormat(other.to_string())),
    };

    check_seed(&seed)?;
    debug!(path = %path.display(), rows = seed.row_count(), "loaded seed file");
    Ok(seed)
}

/// Validates a seed set against the bookstore catalog.
pub fn check_seed(seed: &SeedSet) -> Result<()> {
    match validate_seed(&bookstore_catalog(), seed).into_iter().next() {
        Some(err) => Err(DatabaseError::InvalidSeed(err)),
        None => Ok(()),
    }
}

/// Builder for loading a [`SeedSet`] from a fallback chain.
///
/// Sources are tried in the order they are added. The first successful load
/// wins; if all fail, [`DatabaseError::NoSourcesAvailable`] is returned.
///
/// # Example
///
/// ```
/// use bookstore_schema_db::{SeedLoader, SeedSource};
///
/// let loaded = SeedLoader::new()
///     .from_file("/nonexistent/lookups.yaml")
///     .with_defaults()
///     .load()
///     .unwrap();
/// assert_eq!(loaded.source, SeedSource::Defaults);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SeedLoader {
    sources: Vec<SeedSource>,
}

impl SeedLoader {
    /// Creates a loader with no sources.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a seed file as a source.
    pub fn from_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.sources.push(SeedSource::File(path.into()));
        self
    }

    /// Adds the built-in bookstore rows as a source.
    pub fn with_defaults(mut self) -> Self {
        self.sources.push(SeedSource::Defaults);
        self
    }

    /// Attempts each source in order and returns the first that loads.
    pub fn load(self) -> Result<LoadedSeed> {
        for source in self.sources {
            let result = match &source {
                SeedSource::File(path) => load_seed_file(path),
                SeedSource::Defaults => Ok(SeedSet::bookstore_defaults()),
            };

            match result {
                Ok(seed) => return Ok(LoadedSeed { seed, source }),
                Err(err) => warn!(?source, error = %err, "seed source failed, trying next"),
            }
        }

        Err(DatabaseError::NoSourcesAvailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHIPPING_YAML: &str = r#"
tables:
  - table: shipping_method
    key: method_name
    columns: [method_name, cost]
    rows:
      - [Standard, 4.50]
      - [Freight, 40.00]
"#;

    #[test]
    fn test_load_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lookups.yaml");
        std::fs::write(&path, SHIPPING_YAML).unwrap();

        let seed = load_seed_file(&path).unwrap();
        let shipping = seed.table("shipping_method").unwrap();
        assert_eq!(shipping.rows.len(), 2);
        assert_eq!(shipping.rows[1][0].to_string(), "Freight");
    }

    #[test]
    fn test_load_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lookups.json");
        let defaults = SeedSet::bookstore_defaults();
        std::fs::write(&path, serde_json::to_string_pretty(&defaults).unwrap()).unwrap();

        let seed = load_seed_file(&path).unwrap();
        assert_eq!(seed, defaults);
    }

    #[test]
    fn test_rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lookups.toml");
        std::fs::write(&path, "").unwrap();

        assert!(matches!(
            load_seed_file(&path),
            Err(DatabaseError::UnsupportedFormat(ext)) if ext == "toml"
        ));
    }

    #[test]
    fn test_rejects_seed_for_entity_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.yaml");
        std::fs::write(
            &path,
            "tables:\n  - table: customer\n    key: email\n    columns: [email]\n    rows: []\n",
        )
        .unwrap();

        assert!(matches!(load_seed_file(&path), Err(DatabaseError::InvalidSeed(_))));
    }

    #[test]
    fn test_loader_prefers_first_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lookups.yml");
        std::fs::write(&path, SHIPPING_YAML).unwrap();

        let loaded = SeedLoader::new().from_file(&path).with_defaults().load().unwrap();
        assert_eq!(loaded.source, SeedSource::File(path));
        assert_eq!(loaded.seed.row_count(), 2);
    }

    #[test]
    fn test_loader_with_no_sources_fails() {
        assert!(matches!(
            SeedLoader::new().load(),
            Err(DatabaseError::NoSourcesAvailable)
        ));
    }

    #[test]
    fn test_loader_all_sources_fail() {
        let result = SeedLoader::new().from_file("/nonexistent/seed.yaml").load();
        assert!(matches!(result, Err(DatabaseError::NoSourcesAvailable)));
    }
}
