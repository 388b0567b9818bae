//! Source client trait and the types that cross it
//!
//! The remote protocol stack lives outside this crate. Everything the pipeline
//! needs from it is expressed by `SourceClient`; real clients, fixtures and
//! test doubles all implement the same two calls.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by a source client
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("authentication rejected: {0}")]
    Auth(String),

    #[error("client is not connected")]
    NotConnected,

    #[error("fetch failed for {target}: {message}")]
    Fetch { target: String, message: String },

    #[error("fixture error: {0}")]
    Fixture(String),
}

/// Result type for source client operations
pub type SourceResult<T> = Result<T, SourceError>;

/// Account credentials for the remote service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub api_id: i32,
    pub api_hash: String,
    pub session_file: PathBuf,
}

impl Credentials {
    /// Checks the credential shape before any handshake is attempted
    ///
    /// The api id must be positive and the api hash 32 hex characters.
    pub fn validate(&self) -> SourceResult<()> {
        if self.api_id <= 0 {
            return Err(SourceError::Auth(format!(
                "api_id must be positive, got {}",
                self.api_id
            )));
        }

        if self.api_hash.len() != 32 || !self.api_hash.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(SourceError::Auth(
                "api_hash must be 32 hexadecimal characters".to_string(),
            ));
        }

        Ok(())
    }
}

/// A member record exactly as the source delivered it
///
/// Every field is optional and loosely typed; `normalize_record` decides what
/// is usable. Field names follow the remote wire format.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub username: Option<Value>,
    #[serde(default)]
    pub first_name: Option<Value>,
    #[serde(default)]
    pub last_name: Option<Value>,
    #[serde(default)]
    pub phone: Option<Value>,
    #[serde(default)]
    pub is_premium: Option<Value>,
    #[serde(default)]
    pub last_online: Option<Value>,
}

impl RawRecord {
    /// Creates a raw record carrying only an entity id
    pub fn new(id: i64) -> Self {
        Self {
            id: Some(Value::from(id)),
            ..Self::default()
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(Value::String(username.into()));
        self
    }

    pub fn with_first_name(mut self, first_name: impl Into<String>) -> Self {
        self.first_name = Some(Value::String(first_name.into()));
        self
    }

    pub fn with_last_name(mut self, last_name: impl Into<String>) -> Self {
        self.last_name = Some(Value::String(last_name.into()));
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(Value::String(phone.into()));
        self
    }

    pub fn with_premium(mut self, is_premium: bool) -> Self {
        self.is_premium = Some(Value::Bool(is_premium));
        self
    }

    pub fn with_last_online(mut self, epoch_seconds: i64) -> Self {
        self.last_online = Some(Value::from(epoch_seconds));
        self
    }
}

/// Capability interface for the remote member source
#[async_trait]
pub trait SourceClient: Send + Sync {
    /// Establishes the session; called once per run before any scrape
    async fn connect(&mut self, credentials: Option<&Credentials>) -> SourceResult<()>;

    /// Fetches up to `max` members of `target`
    ///
    /// Returning fewer records than requested is not an error.
    async fn scrape(&self, target: &str, max: u32) -> SourceResult<Vec<RawRecord>>;

    /// Client name for logging
    fn name(&self) -> &str {
        "unknown"
    }
}
