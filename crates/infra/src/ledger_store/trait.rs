use std::sync::Arc;

use thiserror::Error;

use credits_core::{Nonce, OwnerId, TenantId};
use credits_ledger::{LedgerEntry, NewLedgerEntry};

/// Ledger store operation error.
///
/// These are **infrastructure errors** as opposed to domain errors; the engine
/// translates them at its boundary.
///
/// ## Error Categories
///
/// - **Conflict**: the nonce is already taken (storage-level unique constraint)
/// - **InsufficientBalance**: a covered append found the balance too low
/// - **Unavailable**: transient backend failure (pool exhausted, connection lost)
/// - **TenantIsolation**: a store was wired to the wrong tenant
/// - **Backend**: anything else the backend reported
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("nonce '{nonce}' already exists")]
    Conflict { nonce: String },

    #[error("balance {balance} cannot cover amount {amount}")]
    InsufficientBalance { balance: i64, amount: i64 },

    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("tenant isolation violation: {0}")]
    TenantIsolation(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Append-only store for one tenant's ledger entries.
///
/// ## Append Semantics
///
/// `append()`:
/// - assigns `id` (monotonic) and `created_on`
/// - rejects a reused nonce with `StoreError::Conflict`; the check must be the
///   storage layer's own uniqueness guarantee, not a read-then-write
/// - performs exactly one durable write, or none
///
/// `append_covered()` does the same, and additionally re-reads the owner's
/// balance and rejects the entry with `StoreError::InsufficientBalance` when
/// it would take the balance below zero. Read and write happen in one
/// critical section serialized per owner, so two concurrent debits can never
/// both spend the same credits.
///
/// ## Load Semantics
///
/// `entries_by_owner()` returns entries in ascending `id` order; unknown owners
/// yield an empty vector and a zero sum.
#[async_trait::async_trait]
pub trait LedgerStore: Send + Sync {
    /// Tenant whose table this store is bound to.
    fn tenant(&self) -> &TenantId;

    async fn nonce_exists(&self, nonce: &Nonce) -> Result<bool, StoreError>;

    async fn append(&self, entry: NewLedgerEntry) -> Result<LedgerEntry, StoreError>;

    async fn append_covered(&self, entry: NewLedgerEntry) -> Result<LedgerEntry, StoreError>;

    async fn sum_by_owner(&self, owner_id: &OwnerId) -> Result<i64, StoreError>;

    async fn entries_by_owner(&self, owner_id: &OwnerId) -> Result<Vec<LedgerEntry>, StoreError>;
}

#[async_trait::async_trait]
impl<S> LedgerStore for Arc<S>
where
    S: LedgerStore + ?Sized,
{
    fn tenant(&self) -> &TenantId {
        (**self).tenant()
    }

    async fn nonce_exists(&self, nonce: &Nonce) -> Result<bool, StoreError> {
        (**self).nonce_exists(nonce).await
    }

    async fn append(&self, entry: NewLedgerEntry) -> Result<LedgerEntry, StoreError> {
        (**self).append(entry).await
    }

    async fn append_covered(&self, entry: NewLedgerEntry) -> Result<LedgerEntry, StoreError> {
        (**self).append_covered(entry).await
    }

    async fn sum_by_owner(&self, owner_id: &OwnerId) -> Result<i64, StoreError> {
        (**self).sum_by_owner(owner_id).await
    }

    async fn entries_by_owner(&self, owner_id: &OwnerId) -> Result<Vec<LedgerEntry>, StoreError> {
        (**self).entries_by_owner(owner_id).await
    }
}
