use crate::model::{DisplayName, MemberRecord, ValidationError};
use crate::source::RawRecord;
use serde_json::Value;

/// Turns an untrusted raw record into a `MemberRecord`
///
/// Only the entity id is mandatory. Every other field degrades to its absent
/// form when it is missing, null, blank, or of an unexpected type:
///
/// - text fields are trimmed; blank strings become `None`; numbers are
///   rendered as text (phones often arrive numeric)
/// - the handle loses a leading `@`
/// - `is_premium` accepts booleans, numbers and the usual string spellings and
///   falls back to `false`
/// - `last_online` values of zero or below are the remote "unknown" sentinel
///   and become `None`
pub fn normalize_record(raw: RawRecord, source_group: &str) -> Result<MemberRecord, ValidationError> {
    let entity_id = parse_entity_id(raw.id)?;

    let handle = text_field(raw.username)
        .map(|h| h.trim_start_matches('@').to_string())
        .filter(|h| !h.is_empty());

    Ok(MemberRecord {
        entity_id,
        display_name: DisplayName {
            first: text_field(raw.first_name),
            last: text_field(raw.last_name),
        },
        handle,
        contact: text_field(raw.phone),
        is_premium: flag_field(raw.is_premium),
        last_seen: timestamp_field(raw.last_online),
        source_group: source_group.to_string(),
    })
}

fn parse_entity_id(value: Option<Value>) -> Result<i64, ValidationError> {
    let id = match value {
        None | Some(Value::Null) => return Err(ValidationError::MissingEntityId),
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        Some(other) => {
            return Err(ValidationError::InvalidEntityId(other.to_string()));
        }
    };

    id.ok_or_else(|| ValidationError::InvalidEntityId("not an integer".to_string()))
}

fn text_field(value: Option<Value>) -> Option<String> {
    match value? {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else if trimmed.len() == s.len() {
                Some(s)
            } else {
                Some(trimmed.to_string())
            }
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn flag_field(value: Option<Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Some(Value::String(s)) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "true" | "1" | "yes" | "y"
        ),
        _ => false,
    }
}

fn timestamp_field(value: Option<Value>) -> Option<i64> {
    let seconds = match value? {
        Value::Number(n) => n.as_i64()?,
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };

    (seconds > 0).then_some(seconds)
}
