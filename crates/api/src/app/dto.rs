use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use credits_core::{DomainError, Nonce, OwnerId};
use credits_ledger::{BalanceSnapshot, LedgerEntry, OperationKind};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct AddEntryRequest {
    pub owner_id: String,
    pub operation: String,
    pub nonce: String,
}

impl AddEntryRequest {
    /// Validate the raw fields into typed identifiers.
    pub fn parse(self) -> Result<(OwnerId, OperationKind, Nonce), DomainError> {
        Ok((
            self.owner_id.parse()?,
            OperationKind::parse(&self.operation)?,
            self.nonce.parse()?,
        ))
    }
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub owner_id: String,
    pub balance: i64,
    pub last_updated: DateTime<Utc>,
}

impl From<BalanceSnapshot> for BalanceResponse {
    fn from(s: BalanceSnapshot) -> Self {
        Self {
            owner_id: s.owner_id.into(),
            balance: s.balance,
            last_updated: s.as_of,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EntryResponse {
    pub id: i64,
    pub operation: String,
    pub amount: i64,
    pub nonce: String,
    pub owner_id: String,
    pub created_on: DateTime<Utc>,
}

impl From<LedgerEntry> for EntryResponse {
    fn from(e: LedgerEntry) -> Self {
        Self {
            id: e.id,
            operation: e.operation.to_string(),
            amount: e.amount,
            nonce: e.nonce.into(),
            owner_id: e.owner_id.into(),
            created_on: e.created_on,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EntriesResponse {
    pub owner_id: String,
    pub items: Vec<EntryResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(owner_id: &str, operation: &str, nonce: &str) -> AddEntryRequest {
        AddEntryRequest {
            owner_id: owner_id.into(),
            operation: operation.into(),
            nonce: nonce.into(),
        }
    }

    #[test]
    fn add_entry_request_validates_fields() {
        assert!(request("u1", "SIGNUP_CREDIT", "n1").parse().is_ok());
        assert!(request("", "SIGNUP_CREDIT", "n1").parse().is_err());
        assert!(request("u1", "signup credit", "n1").parse().is_err());
        assert!(request("u1", "SIGNUP_CREDIT", &"n".repeat(101)).parse().is_err());
    }

    #[test]
    fn balance_response_uses_last_updated() {
        let snapshot = BalanceSnapshot {
            owner_id: "u1".parse().unwrap(),
            balance: 3,
            as_of: Utc::now(),
        };
        let json = serde_json::to_value(BalanceResponse::from(snapshot)).unwrap();
        assert_eq!(json["owner_id"], "u1");
        assert_eq!(json["balance"], 3);
        assert!(json.get("last_updated").is_some());
    }
}
