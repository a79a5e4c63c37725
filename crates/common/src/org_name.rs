//! Organization name validation
//!
//! Organization names are DNS labels:
//! - 1-63 characters
//! - [a-z0-9-] after lowercasing
//! - No leading or trailing hyphens
//! - Not a reserved word of the lookup API

use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Names that would collide with fixed lookup API path segments
static RESERVED: Lazy<HashSet<&'static str>> = Lazy::new(|| ["node"].into_iter().collect());

pub const MAX_ORG_NAME_LEN: usize = 63;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrgNameError {
    Empty,
    TooLong { max: usize, got: usize },
    InvalidCharacter { position: usize, char: char },
    LeadingHyphen,
    TrailingHyphen,
    Reserved { name: String },
}

impl std::fmt::Display for OrgNameError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "organization name is empty"),
            Self::TooLong { max, got } => {
                write!(f, "organization name must be at most {} characters (got {})", max, got)
            }
            Self::InvalidCharacter { position, char } => write!(
                f,
                "invalid character '{}' at position {}; only letters, digits and hyphens are allowed",
                char, position
            ),
            Self::LeadingHyphen => write!(f, "organization name cannot start with a hyphen"),
            Self::TrailingHyphen => write!(f, "organization name cannot end with a hyphen"),
            Self::Reserved { name } => write!(f, "organization name '{}' is reserved", name),
        }
    }
}

impl std::error::Error for OrgNameError {}

/// Validate an organization name
///
/// Returns the lowercase name on success.
pub fn validate_org_name(name: &str) -> Result<String, OrgNameError> {
    let name = name.to_lowercase();
    let len = name.chars().count();

    if len == 0 {
        return Err(OrgNameError::Empty);
    }
    if len > MAX_ORG_NAME_LEN {
        return Err(OrgNameError::TooLong { max: MAX_ORG_NAME_LEN, got: len });
    }

    for (i, c) in name.chars().enumerate() {
        if !matches!(c, 'a'..='z' | '0'..='9' | '-') {
            return Err(OrgNameError::InvalidCharacter { position: i, char: c });
        }
    }

    if name.starts_with('-') {
        return Err(OrgNameError::LeadingHyphen);
    }
    if name.ends_with('-') {
        return Err(OrgNameError::TrailingHyphen);
    }

    if RESERVED.contains(name.as_str()) {
        return Err(OrgNameError::Reserved { name });
    }

    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        assert_eq!(validate_org_name("acme").unwrap(), "acme");
        assert_eq!(validate_org_name("ACME").unwrap(), "acme");
        assert_eq!(validate_org_name("a").unwrap(), "a");
        assert_eq!(validate_org_name("ukama-test-01").unwrap(), "ukama-test-01");
        assert_eq!(validate_org_name(&"a".repeat(63)).unwrap().len(), 63);
    }

    #[test]
    fn test_invalid_names() {
        assert_eq!(validate_org_name(""), Err(OrgNameError::Empty));
        assert!(matches!(
            validate_org_name(&"a".repeat(64)),
            Err(OrgNameError::TooLong { max: 63, got: 64 })
        ));
        assert!(matches!(
            validate_org_name("acme_corp"),
            Err(OrgNameError::InvalidCharacter { position: 4, char: '_' })
        ));
        assert!(matches!(
            validate_org_name("acme.io"),
            Err(OrgNameError::InvalidCharacter { position: 4, char: '.' })
        ));
        assert_eq!(validate_org_name("-acme"), Err(OrgNameError::LeadingHyphen));
        assert_eq!(validate_org_name("acme-"), Err(OrgNameError::TrailingHyphen));
    }

    #[test]
    fn test_reserved_names() {
        assert!(matches!(validate_org_name("node"), Err(OrgNameError::Reserved { .. })));
        assert!(matches!(validate_org_name("NODE"), Err(OrgNameError::Reserved { .. })));
    }
}
