//! Setup configuration for applying the schema.
//!
//! Defines the YAML-serializable configuration that tells the setup run
//! which database file to target, which table prefix to use, and where the
//! lookup seed rows come from.
//!
//! # Example YAML
//!
//! ```yaml
//! version: "1.0"
//! database: bookstore.db
//! prefix: ""
//! seed: seeds/lookups.yaml
//! fallback_to_defaults: true
//! ```
//!
//! Relative `database` and `seed` paths are resolved against the directory
//! containing the config file.

use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DatabaseError, Result};
use crate::loader::SeedLoader;

/// Configuration format version understood by this crate.
pub const CONFIG_VERSION: &str = "1.0";

fn default_true() -> bool {
    true
}

/// Top-level setup configuration.
///
/// # Examples
///
/// ```
/// use bookstore_schema_db::SetupConfig;
///
/// let config: SetupConfig = serde_yaml::from_str("version: \"1.0\"\ndatabase: shop.db\n").unwrap();
/// assert_eq!(config.prefix, "");
/// assert!(config.seed.is_none());
/// assert!(config.fallback_to_defaults);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetupConfig {
    /// Configuration format version (e.g., `"1.0"`).
    pub version: String,
    /// SQLite database file.
    pub database: PathBuf,
    /// Table prefix; empty keeps the canonical table names.
    #[serde(default)]
    pub prefix: String,
    /// Seed file (YAML or JSON); the built-in rows are used when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<PathBuf>,
    /// Fall back to the built-in rows when the seed file cannot be loaded.
    #[serde(default = "default_true")]
    pub fallback_to_defaults: bool,
}

impl SetupConfig {
    /// Creates a configuration for `database` with default settings.
    pub fn new(database: impl Into<PathBuf>) -> Self {
        Self {
            version: CONFIG_VERSION.to_string(),
            database: database.into(),
            prefix: String::new(),
            seed: None,
            fallback_to_defaults: true,
        }
    }

    /// Loads configuration from a YAML file and resolves relative paths
    /// against the file's directory.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::DatabaseError::IoError) if the file cannot
    /// be read, [`YamlError`](crate::DatabaseError::YamlError) if parsing
    /// fails, or [`InvalidConfig`](crate::DatabaseError::InvalidConfig) if
    /// the content is inconsistent.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let mut config: SetupConfig = serde_yaml::from_reader(reader)?;
        config.validate()?;

        if let Some(base) = path.parent() {
            config.resolve_relative_to(base);
        }
        Ok(config)
    }

    /// Saves the configuration as YAML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// Checks version and required fields.
    pub fn validate(&self) -> Result<()> {
        if self.version != CONFIG_VERSION {
            return Err(DatabaseError::InvalidConfig(format!(
                "unsupported config version '{}', expected '{CONFIG_VERSION}'",
                self.version
            )));
        }
        if self.database.as_os_str().is_empty() {
            return Err(DatabaseError::InvalidConfig("database path cannot be empty".into()));
        }
        Ok(())
    }

    /// Builds the seed loader chain described by this configuration.
    ///
    /// With a seed file the chain is `file` then, if enabled, the built-in
    /// defaults. Without one it is just the defaults.
    pub fn seed_loader(&self) -> SeedLoader {
        let mut loader = SeedLoader::new();
        match &self.seed {
            Some(path) => {
                loader = loader.from_file(path);
                if self.fallback_to_defaults {
                    loader = loader.with_defaults();
                }
            }
            None => loader = loader.with_defaults(),
        }
        loader
    }

    fn resolve_relative_to(&mut self, base: &Path) {
        if self.database.is_relative() {
            self.database = base.join(&self.database);
        }
        if let Some(seed) = self.seed.as_mut() {
            if seed.is_relative() {
                *seed = base.join(&*seed);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_yaml() -> &'static str {
        r#"
version: "1.0"
database: shop.db
prefix: test_
seed: seeds/lookups.yaml
fallback_to_defaults: false
"#
    }

    #[test]
    fn test_deserialize_complete() {
        let config: SetupConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.database, PathBuf::from("shop.db"));
        assert_eq!(config.prefix, "test_");
        assert_eq!(config.seed, Some(PathBuf::from("seeds/lookups.yaml")));
        assert!(!config.fallback_to_defaults);
    }

    #[test]
    fn test_rejects_unknown_version() {
        let mut config = SetupConfig::new("shop.db");
        config.version = "2.0".into();
        assert!(matches!(config.validate(), Err(DatabaseError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_empty_database() {
        let config = SetupConfig::new("");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("setup.yml");
        std::fs::write(&path, sample_yaml()).unwrap();

        let config = SetupConfig::load(&path).unwrap();
        assert_eq!(config.database, dir.path().join("shop.db"));
        assert_eq!(config.seed, Some(dir.path().join("seeds/lookups.yaml")));
    }

    #[test]
    fn test_load_save_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("setup.yml");

        let mut original = SetupConfig::new("/var/lib/bookstore.db");
        original.prefix = "shop_".into();
        original.save(&path).unwrap();

        let loaded = SetupConfig::load(&path).unwrap();
        assert_eq!(loaded.database, original.database);
        assert_eq!(loaded.prefix, original.prefix);
        assert!(loaded.seed.is_none());
    }

    #[test]
    fn test_seed_loader_without_file_uses_defaults() {
        let config = SetupConfig::new("shop.db");
        let loaded = config.seed_loader().load().unwrap();
        assert_eq!(loaded.seed.row_count(), 20);
    }
}
