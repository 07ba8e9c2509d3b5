//! Ledger entries and derived balances.
//!
//! Entries are append-only; a balance is never stored, only summed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use credits_core::{Nonce, OwnerId};

use crate::operation::OperationKind;

/// An entry ready to be appended (not yet assigned an id or timestamp).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLedgerEntry {
    pub owner_id: OwnerId,
    pub operation: OperationKind,
    pub amount: i64,
    pub nonce: Nonce,
}

impl NewLedgerEntry {
    pub fn new(owner_id: OwnerId, operation: OperationKind, amount: i64, nonce: Nonce) -> Self {
        Self {
            owner_id,
            operation,
            amount,
            nonce,
        }
    }

    /// Turn into a committed entry with store-assigned metadata.
    pub fn commit(self, id: i64, created_on: DateTime<Utc>) -> LedgerEntry {
        LedgerEntry {
            id,
            operation: self.operation,
            amount: self.amount,
            nonce: self.nonce,
            owner_id: self.owner_id,
            created_on,
        }
    }
}

/// Committed ledger entry (immutable).
///
/// `amount` is the operation's value at creation time; later changes to the
/// operation-value table never rewrite history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: i64,
    pub operation: OperationKind,
    pub amount: i64,
    pub nonce: Nonce,
    pub owner_id: OwnerId,
    pub created_on: DateTime<Utc>,
}

/// Owner balance at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    pub owner_id: OwnerId,
    pub balance: i64,
    /// Time of the read, not of the latest entry.
    pub as_of: DateTime<Utc>,
}

/// Balance after applying `amount` to `current`.
///
/// Returns `None` when a debit would take the balance below zero. Credits are
/// always accepted, even on an already negative balance.
pub fn covered_balance(current: i64, amount: i64) -> Option<i64> {
    let next = current.checked_add(amount)?;
    if amount < 0 && next < 0 {
        return None;
    }
    Some(next)
}
