//! Key validation for slots and collection paths.
//!
//! Slot keys and collection paths end up as file names on directory-backed
//! stores, so both are restricted to a conservative character set and can
//! never escape the store root.

use crate::error::{ErrorKind, Result};

fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty()
        && !segment.starts_with('.')
        && segment.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

/// Validates a local slot key (e.g. `complaints_documents`).
///
/// # Examples
///
/// ```
/// use desk_storage::validate_key;
/// assert!(validate_key("complaints_documents").is_ok());
/// assert!(validate_key("supervisors-cache.v2").is_ok());
/// assert!(validate_key("").is_err());
/// assert!(validate_key("../etc/passwd").is_err());
/// assert!(validate_key(".hidden").is_err());
/// ```
pub fn validate_key(key: &str) -> Result<&str> {
    if !is_valid_segment(key) {
        exn::bail!(ErrorKind::InvalidKey(key.to_string()));
    }
    Ok(key)
}

/// Validates a remote collection path (e.g. `documents` or `complaints/-Nabc`).
///
/// Leading and trailing slashes are ignored; every segment must be a valid
/// key.
///
/// # Examples
///
/// ```
/// use desk_storage::validate_collection;
/// assert_eq!(validate_collection("/documents/").unwrap(), "documents");
/// assert_eq!(validate_collection("complaints/-Nabc").unwrap(), "complaints/-Nabc");
/// assert!(validate_collection("complaints//x").is_err());
/// assert!(validate_collection("a/../b").is_err());
/// ```
pub fn validate_collection(path: &str) -> Result<String> {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() || !trimmed.split('/').all(is_valid_segment) {
        exn::bail!(ErrorKind::InvalidKey(path.to_string()));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("complaints_documents", true)]
    #[case("supervisors_cache", true)]
    #[case("a.b-c_d", true)]
    #[case("", false)]
    #[case(".", false)]
    #[case("..", false)]
    #[case("a/b", false)]
    #[case("a b", false)]
    #[case("a\0b", false)]
    fn test_validate_key(#[case] key: &str, #[case] valid: bool) {
        assert_eq!(validate_key(key).is_ok(), valid);
    }

    #[rstest]
    #[case("documents", Some("documents"))]
    #[case("/documents", Some("documents"))]
    #[case("complaints/-NxYz", Some("complaints/-NxYz"))]
    #[case("/", None)]
    #[case("complaints/../documents", None)]
    #[case("complaints/.hidden", None)]
    fn test_validate_collection(#[case] path: &str, #[case] expected: Option<&str>) {
        assert_eq!(validate_collection(path).ok().as_deref(), expected);
    }
}
