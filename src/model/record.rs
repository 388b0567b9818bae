use chrono::{DateTime, Utc};

/// First and last name as reported by the source; either part may be missing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayName {
    pub first: Option<String>,
    pub last: Option<String>,
}

/// One observation of a member within a source group
///
/// The pair (`entity_id`, `source_group`) is the deduplication key. All other
/// fields are mutable and are overwritten by later observations of the same key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberRecord {
    /// Remote identifier, unique only within `source_group`
    pub entity_id: i64,

    pub display_name: DisplayName,

    /// Public handle without the leading `@`
    pub handle: Option<String>,

    /// Phone-like contact field, stored as received
    pub contact: Option<String>,

    pub is_premium: bool,

    /// Last activity in epoch seconds; `None` when the source does not know
    pub last_seen: Option<i64>,

    /// Canonical target (`@name`) the record was observed under
    pub source_group: String,
}

impl MemberRecord {
    /// Creates a record with only the key fields set
    pub fn new(entity_id: i64, source_group: impl Into<String>) -> Self {
        Self {
            entity_id,
            display_name: DisplayName::default(),
            handle: None,
            contact: None,
            is_premium: false,
            last_seen: None,
            source_group: source_group.into(),
        }
    }

    /// Returns the deduplication key of this record
    pub fn key(&self) -> (i64, &str) {
        (self.entity_id, &self.source_group)
    }
}

/// A member row as held by the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRow {
    /// Storage-assigned surrogate key; never reused
    pub internal_id: i64,

    pub record: MemberRecord,

    /// When the key was first stored; later upserts leave it untouched
    pub scraped_at: DateTime<Utc>,

    /// When the row was last written
    pub updated_at: DateTime<Utc>,
}
