//! Source clients
//!
//! This module defines the capability the pipeline consumes from the remote
//! member source, plus two local implementations:
//! - `SyntheticClient`: deterministic pattern-based generator
//! - `FixtureClient`: replays recorded batches from JSON

mod fixture;
mod synthetic;
mod traits;

pub use fixture::FixtureClient;
pub use synthetic::SyntheticClient;
pub use traits::{Credentials, RawRecord, SourceClient, SourceError, SourceResult};

use crate::config::{Config, SourceKind};
use std::time::Duration;

/// Builds the source client selected by the configuration
pub fn build_client(config: &Config) -> SourceResult<Box<dyn SourceClient>> {
    match config.source.kind {
        SourceKind::Synthetic => Ok(Box::new(SyntheticClient::new(Duration::from_millis(
            config.source.request_delay_ms,
        )))),
        SourceKind::Fixture => {
            let path = config.source.fixture_path.as_deref().ok_or_else(|| {
                SourceError::Fixture("fixture source selected without a fixture path".to_string())
            })?;
            Ok(Box::new(FixtureClient::from_path(path)?))
        }
    }
}

/// Extracts credentials from the configuration, if any were given
pub fn credentials_from_config(config: &Config) -> Option<Credentials> {
    config.credentials.as_ref().map(|c| Credentials {
        api_id: c.api_id,
        api_hash: c.api_hash.clone(),
        session_file: c.session_file.clone(),
    })
}
