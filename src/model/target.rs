use crate::model::ValidationError;

/// Host prefixes accepted in front of a channel name
const LINK_HOSTS: &[&str] = &["t.me/", "telegram.me/", "telegram.dog/"];

const MAX_TARGET_LEN: usize = 64;

/// Canonicalizes a scrape target into its `@name` form
///
/// # Canonicalization Steps
///
/// 1. Trim surrounding whitespace
/// 2. Strip `https://`, `http://` and a `www.` prefix
/// 3. Strip a link host (`t.me/`, `telegram.me/`, `telegram.dog/`) and keep
///    only the first path segment
/// 4. Strip a leading `@` and any query string
/// 5. Lowercase; names are case-insensitive on the remote side
/// 6. Reject empty names and names with characters outside `[a-z0-9_]`
///
/// The canonical form is what gets stored as `source_group`, so every
/// spelling of the same channel deduplicates into one group.
///
/// # Examples
///
/// ```
/// use roster_harvest::model::canonical_target;
///
/// assert_eq!(canonical_target("https://t.me/RustLang").unwrap(), "@rustlang");
/// assert_eq!(canonical_target("@rustlang").unwrap(), "@rustlang");
/// ```
pub fn canonical_target(target: &str) -> Result<String, ValidationError> {
    let mut rest = target.trim();

    for scheme in ["https://", "http://"] {
        if let Some(stripped) = strip_prefix_ignore_case(rest, scheme) {
            rest = stripped;
            break;
        }
    }

    if let Some(stripped) = strip_prefix_ignore_case(rest, "www.") {
        rest = stripped;
    }

    for host in LINK_HOSTS {
        if let Some(stripped) = strip_prefix_ignore_case(rest, host) {
            rest = stripped.split('/').next().unwrap_or("");
            break;
        }
    }

    let rest = rest.split('?').next().unwrap_or("");
    let name = rest.strip_prefix('@').unwrap_or(rest).to_lowercase();

    if name.is_empty() {
        return Err(ValidationError::InvalidTarget(format!(
            "'{}' does not name a channel",
            target
        )));
    }

    if name.len() > MAX_TARGET_LEN {
        return Err(ValidationError::InvalidTarget(format!(
            "'{}' is longer than {} characters",
            target, MAX_TARGET_LEN
        )));
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(ValidationError::InvalidTarget(format!(
            "'{}' contains characters outside [a-z0-9_]",
            target
        )));
    }

    Ok(format!("@{}", name))
}

fn strip_prefix_ignore_case<'a>(value: &'a str, prefix: &str) -> Option<&'a str> {
    let head = value.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        Some(&value[prefix.len()..])
    } else {
        None
    }
}
