//! Configuration module for Roster-Harvest
//!
//! This module handles loading, parsing, and validating the optional TOML
//! configuration file. Every section has defaults, and the CLI layers its own
//! flags on top of whatever the file provides.
//!
//! # Example
//!
//! ```no_run
//! use roster_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("roster.toml")).unwrap();
//! println!("Persist workers: {}", config.ingest.workers);
//! ```

mod parser;
mod types;
mod validation;

pub use types::{
    Config, CredentialsConfig, ExportConfig, IngestConfig, SourceConfig, SourceKind,
    StorageConfig,
};

pub use parser::{
    compute_config_hash, load_config, load_config_with_hash, parse_config, DEFAULT_CONFIG_HASH,
};
pub use validation::validate;
