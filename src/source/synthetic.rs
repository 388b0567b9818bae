//! Deterministic pattern-based source client
//!
//! Walks a fixed list of search patterns and produces up to 50 members per
//! pattern until the requested maximum is reached. Useful for demos and for
//! exercising the pipeline without network access.

use crate::source::traits::{Credentials, RawRecord, SourceClient, SourceError, SourceResult};
use async_trait::async_trait;
use chrono::Utc;
use std::time::Duration;

/// Search patterns tried in order, the empty pattern first
const SEARCH_PATTERNS: &[&str] = &[
    "", "a", "e", "i", "o", "u", "s", "t", "n", "r", "l", "c", "h", "d", "p",
];

const PATTERN_BATCH_SIZE: u32 = 50;

/// Source client that fabricates member records
pub struct SyntheticClient {
    connected: bool,
    request_delay: Duration,
}

impl SyntheticClient {
    /// Creates a client pausing `request_delay` between search patterns
    pub fn new(request_delay: Duration) -> Self {
        Self {
            connected: false,
            request_delay,
        }
    }

    fn member(pattern_index: usize, pattern: &str, j: u32, now: i64) -> RawRecord {
        let mut raw = RawRecord::new(pattern_index as i64 * 1000 + j as i64)
            .with_username(format!("user_{}_{}", pattern, j))
            .with_first_name(format!("User{}", j))
            .with_last_name(format!("Last{}", j))
            .with_premium(j % 10 == 0)
            .with_last_online(now);

        if j % 5 == 0 {
            raw = raw.with_phone(format!("+1{:010}", j));
        }

        raw
    }
}

#[async_trait]
impl SourceClient for SyntheticClient {
    async fn connect(&mut self, credentials: Option<&Credentials>) -> SourceResult<()> {
        if let Some(credentials) = credentials {
            credentials.validate()?;
        }
        self.connected = true;
        Ok(())
    }

    async fn scrape(&self, target: &str, max: u32) -> SourceResult<Vec<RawRecord>> {
        if !self.connected {
            return Err(SourceError::NotConnected);
        }

        let mut members = Vec::new();
        let now = Utc::now().timestamp();

        for (i, pattern) in SEARCH_PATTERNS.iter().enumerate() {
            let collected = members.len() as u32;
            if collected >= max {
                break;
            }

            tracing::debug!(
                "{}: pattern {}/{} '{}'",
                target,
                i + 1,
                SEARCH_PATTERNS.len(),
                pattern
            );

            let batch_size = PATTERN_BATCH_SIZE.min(max - collected);
            members.extend((0..batch_size).map(|j| Self::member(i, pattern, j, now)));

            if !self.request_delay.is_zero() {
                tokio::time::sleep(self.request_delay).await;
            }
        }

        Ok(members)
    }

    fn name(&self) -> &str {
        "synthetic"
    }
}
