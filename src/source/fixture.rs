//! Replay-from-fixture source client
//!
//! Serves member batches from a JSON document of the form
//! `{ "<target>": [ <raw record>, ... ], ... }`. Targets missing from the
//! fixture fail the way an unresolvable channel fails on the remote side.

use crate::model::canonical_target;
use crate::source::traits::{Credentials, RawRecord, SourceClient, SourceError, SourceResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Source client backed by pre-recorded batches
pub struct FixtureClient {
    batches: HashMap<String, Vec<RawRecord>>,
    connected: bool,
    scrape_calls: AtomicUsize,
}

impl FixtureClient {
    /// Builds a client from in-memory batches keyed by target
    pub fn from_batches<I, T>(batches: I) -> Self
    where
        I: IntoIterator<Item = (T, Vec<RawRecord>)>,
        T: AsRef<str>,
    {
        let batches = batches
            .into_iter()
            .map(|(target, records)| {
                let target = target.as_ref();
                let key = canonical_target(target).unwrap_or_else(|_| target.to_string());
                (key, records)
            })
            .collect();

        Self {
            batches,
            connected: false,
            scrape_calls: AtomicUsize::new(0),
        }
    }

    /// Loads batches from a JSON fixture file
    pub fn from_path(path: &Path) -> SourceResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SourceError::Fixture(format!("failed to read {}: {}", path.display(), e))
        })?;

        let batches: HashMap<String, Vec<RawRecord>> = serde_json::from_str(&content)
            .map_err(|e| {
                SourceError::Fixture(format!("failed to parse {}: {}", path.display(), e))
            })?;

        tracing::info!(
            "Loaded fixture {} with {} targets",
            path.display(),
            batches.len()
        );

        Ok(Self::from_batches(batches))
    }

    /// Number of `scrape` calls served so far
    pub fn scrape_calls(&self) -> usize {
        self.scrape_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceClient for FixtureClient {
    async fn connect(&mut self, credentials: Option<&Credentials>) -> SourceResult<()> {
        if let Some(credentials) = credentials {
            credentials.validate()?;
        }
        self.connected = true;
        Ok(())
    }

    async fn scrape(&self, target: &str, max: u32) -> SourceResult<Vec<RawRecord>> {
        self.scrape_calls.fetch_add(1, Ordering::SeqCst);

        if !self.connected {
            return Err(SourceError::NotConnected);
        }

        let records = self.batches.get(target).ok_or_else(|| SourceError::Fetch {
            target: target.to_string(),
            message: "target not found".to_string(),
        })?;

        Ok(records.iter().take(max as usize).cloned().collect())
    }

    fn name(&self) -> &str {
        "fixture"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_serves_batches_by_canonical_target() {
        let mut client = FixtureClient::from_batches(vec![(
            "https://t.me/Group",
            vec![RawRecord::new(1), RawRecord::new(2), RawRecord::new(3)],
        )]);
        client.connect(None).await.unwrap();

        let records = client.scrape("@group", 2).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(client.scrape_calls(), 1);
    }

    #[tokio::test]
    async fn test_unknown_target_fails() {
        let mut client = FixtureClient::from_batches(Vec::<(&str, Vec<RawRecord>)>::new());
        client.connect(None).await.unwrap();

        assert!(matches!(
            client.scrape("@missing", 50).await,
            Err(SourceError::Fetch { .. })
        ));
    }

    #[test]
    fn test_from_path() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"{"@a": [{"id": 1, "username": "bob"}, {"username": "no_id"}]}"#)
            .unwrap();
        file.flush().unwrap();

        let client = FixtureClient::from_path(file.path()).unwrap();
        assert_eq!(client.batches["@a"].len(), 2);
    }

    #[test]
    fn test_from_path_rejects_malformed_json() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"[not a map]").unwrap();
        file.flush().unwrap();

        assert!(matches!(
            FixtureClient::from_path(file.path()),
            Err(SourceError::Fixture(_))
        ));
    }
}
