//! Strongly-typed identifiers used across the ledger.
//!
//! All of them are validated on construction, so a value of one of these types
//! is always safe to persist (and, for [`TenantId`], to splice into a table name).

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Maximum length of owner ids and nonces (matches the storage column width).
pub const MAX_KEY_LEN: usize = 100;

/// Maximum length of a tenant slug.
///
/// Storage names derive identifiers such as `ledger_entries_<slug>_operation_idx`
/// from it, and those must fit Postgres's 63-byte identifier limit.
pub const MAX_TENANT_LEN: usize = 32;

/// Identifier of a tenant application (multi-tenant boundary).
///
/// Normalized to a lowercase slug (`HealthAI` becomes `healthai`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TenantId(String);

/// Identifier of the account whose balance is tracked. Opaque to the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OwnerId(String);

/// Caller-supplied idempotency token, unique per tenant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Nonce(String);

impl TenantId {
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let slug = raw.to_ascii_lowercase();
        let mut chars = slug.chars();
        let valid_head = chars.next().is_some_and(|c| c.is_ascii_lowercase());
        let valid_tail = chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
        if !valid_head || !valid_tail || slug.len() > MAX_TENANT_LEN {
            return Err(DomainError::invalid_id(format!(
                "TenantId: '{raw}' must match [a-z][a-z0-9_]* and be at most {MAX_TENANT_LEN} chars"
            )));
        }
        Ok(Self(slug))
    }
}

fn parse_key(raw: &str, name: &str) -> Result<String, DomainError> {
    if raw.is_empty() {
        return Err(DomainError::invalid_id(format!("{name}: must not be empty")));
    }
    if raw.trim() != raw {
        return Err(DomainError::invalid_id(format!(
            "{name}: must not have leading or trailing whitespace"
        )));
    }
    if raw.chars().count() > MAX_KEY_LEN {
        return Err(DomainError::invalid_id(format!(
            "{name}: longer than {MAX_KEY_LEN} characters"
        )));
    }
    Ok(raw.to_string())
}

macro_rules! impl_string_id {
    ($t:ident, $parse:expr) => {
        impl $t {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let parse: fn(&str) -> Result<$t, DomainError> = $parse;
                parse(s)
            }
        }

        impl TryFrom<String> for $t {
            type Error = DomainError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl From<$t> for String {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl AsRef<str> for $t {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

impl_string_id!(TenantId, TenantId::parse);
impl_string_id!(OwnerId, |s| parse_key(s, "OwnerId").map(OwnerId));
impl_string_id!(Nonce, |s| parse_key(s, "Nonce").map(Nonce));

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tenant_ids_are_normalized_to_lowercase() {
        let t: TenantId = "HealthAI".parse().unwrap();
        assert_eq!(t.as_str(), "healthai");
        assert_eq!(t, TenantId::parse("healthai").unwrap());
    }

    #[test]
    fn tenant_ids_reject_sql_unsafe_characters() {
        for raw in ["", "1app", "health-ai", "x; DROP TABLE y", "app name"] {
            assert!(raw.parse::<TenantId>().is_err(), "{raw} should be rejected");
        }
    }

    #[test]
    fn tenant_length_is_bounded() {
        assert!(TenantId::parse(&"t".repeat(MAX_TENANT_LEN)).is_ok());
        assert!(TenantId::parse(&"t".repeat(MAX_TENANT_LEN + 1)).is_err());
    }

    #[test]
    fn owner_and_nonce_bounds_are_enforced() {
        assert!("u1".parse::<OwnerId>().is_ok());
        assert!("".parse::<OwnerId>().is_err());
        assert!(" u1".parse::<OwnerId>().is_err());
        assert!("n".repeat(MAX_KEY_LEN).parse::<Nonce>().is_ok());
        assert!("n".repeat(MAX_KEY_LEN + 1).parse::<Nonce>().is_err());
    }

    #[test]
    fn ids_deserialize_through_validation() {
        let owner: OwnerId = serde_json::from_str("\"user-42\"").unwrap();
        assert_eq!(owner.to_string(), "user-42");
        assert!(serde_json::from_str::<Nonce>("\"\"").is_err());
    }
}
