//! Operation kinds and the process-wide operation-value table.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use credits_core::DomainError;

/// Operations every tenant catalog must define.
pub const BASELINE_OPERATIONS: [&str; 4] =
    ["DAILY_REWARD", "SIGNUP_CREDIT", "CREDIT_SPEND", "CREDIT_ADD"];

/// Named transaction type, e.g. `DAILY_REWARD`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OperationKind(String);

impl OperationKind {
    /// Parse an upper snake case operation name.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let mut chars = raw.chars();
        let valid_head = chars.next().is_some_and(|c| c.is_ascii_uppercase());
        let valid_tail = chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_');
        if !valid_head || !valid_tail {
            return Err(DomainError::validation(format!(
                "operation '{raw}' must be an UPPER_SNAKE_CASE name"
            )));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl core::str::FromStr for OperationKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for OperationKind {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<OperationKind> for String {
    fn from(value: OperationKind) -> Self {
        value.0
    }
}

/// Shared operation name -> point value table.
///
/// Keyed by name only, so a kind carries the same value in every tenant that
/// declares it. Built once at startup and shared read-only (`Arc`) between
/// catalogs. Names are stored upper case, so tables coming from
/// case-folding config sources still line up with operation kinds.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, i64>", into = "BTreeMap<String, i64>")]
pub struct OperationValues(BTreeMap<String, i64>);

impl OperationValues {
    pub fn new(values: BTreeMap<String, i64>) -> Self {
        Self(
            values
                .into_iter()
                .map(|(name, value)| (name.to_ascii_uppercase(), value))
                .collect(),
        )
    }

    /// The table shipped with the service.
    pub fn standard() -> Self {
        Self::from_iter([
            ("DAILY_REWARD", 1),
            ("SIGNUP_CREDIT", 3),
            ("CREDIT_SPEND", -1),
            ("CREDIT_ADD", 10),
            ("CONTENT_CREATION", -5),
            ("CONTENT_ACCESS", 0),
        ])
    }

    /// Configured value for `kind`, if any.
    pub fn get(&self, kind: &OperationKind) -> Option<i64> {
        self.0.get(kind.as_str()).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl<'a> FromIterator<(&'a str, i64)> for OperationValues {
    fn from_iter<I: IntoIterator<Item = (&'a str, i64)>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }
}

impl From<BTreeMap<String, i64>> for OperationValues {
    fn from(value: BTreeMap<String, i64>) -> Self {
        Self::new(value)
    }
}

impl From<OperationValues> for BTreeMap<String, i64> {
    fn from(value: OperationValues) -> Self {
        value.0
    }
}
