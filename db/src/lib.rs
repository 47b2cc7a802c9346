//! Setup configuration and seed loading for the bookstore schema.
//!
//! This crate provides the file-facing side of schema setup: the YAML
//! [`SetupConfig`], seed-file loading with a fallback chain
//! ([`SeedLoader`]), and SHA-256 fingerprints of lookup content.
//!
//! # Quick start
//!
//! ```no_run
//! use bookstore_schema_db::{SetupConfig, seed_fingerprint};
//!
//! let config = SetupConfig::load("bookstore.yml").unwrap();
//! let loaded = config.seed_loader().load().unwrap();
//! println!(
//!     "seeding {} into {} ({})",
//!     loaded.seed.row_count(),
//!     config.database.display(),
//!     seed_fingerprint(&loaded.seed),
//! );
//! ```

mod config;
mod error;
mod fingerprint;
mod loader;

pub use config::{CONFIG_VERSION, SetupConfig};
pub use error::{DatabaseError, Result};
pub use fingerprint::{fingerprint_lines, seed_fingerprint};
pub use loader::{LoadedSeed, SeedLoader, SeedSource, check_seed, load_seed_file};
