use crate::config::types::{Config, ExportConfig, IngestConfig, SourceConfig, SourceKind};
use crate::ConfigError;

/// Upper bound on persist workers; SQLite serializes writers anyway
const MAX_WORKERS: usize = 64;

const MAX_MEMBERS_PER_TARGET: u32 = 100_000;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_ingest_config(&config.ingest)?;
    validate_database_path(&config.storage.database_path)?;
    validate_export_config(&config.export)?;
    validate_source_config(&config.source)?;
    Ok(())
}

/// Validates worker pool settings
pub(crate) fn validate_ingest_config(config: &IngestConfig) -> Result<(), ConfigError> {
    if config.workers < 1 || config.workers > MAX_WORKERS {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and {}, got {}",
            MAX_WORKERS, config.workers
        )));
    }

    if config.queue_capacity < 1 {
        return Err(ConfigError::Validation(
            "queue_capacity must be >= 1".to_string(),
        ));
    }

    if config.max_members > MAX_MEMBERS_PER_TARGET {
        return Err(ConfigError::Validation(format!(
            "max_members must be <= {}, got {}",
            MAX_MEMBERS_PER_TARGET, config.max_members
        )));
    }

    Ok(())
}

fn validate_database_path(path: &str) -> Result<(), ConfigError> {
    if path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Validates export settings
pub(crate) fn validate_export_config(config: &ExportConfig) -> Result<(), ConfigError> {
    validate_base_name(&config.base_name)?;

    if config.formats.is_empty() {
        return Err(ConfigError::Validation(
            "at least one export format is required".to_string(),
        ));
    }

    Ok(())
}

fn validate_source_config(config: &SourceConfig) -> Result<(), ConfigError> {
    if config.kind == SourceKind::Fixture && config.fixture_path.is_none() {
        return Err(ConfigError::Validation(
            "source kind 'fixture' requires fixture_path".to_string(),
        ));
    }
    Ok(())
}

/// Base names become file name prefixes, so they may not contain separators
fn validate_base_name(name: &str) -> Result<(), ConfigError> {
    if name.is_empty() {
        return Err(ConfigError::Validation(
            "base_name cannot be empty".to_string(),
        ));
    }

    if name.contains('/') || name.contains('\\') || name == "." || name == ".." {
        return Err(ConfigError::Validation(format!(
            "base_name must be a plain file name, got '{}'",
            name
        )));
    }

    Ok(())
}
