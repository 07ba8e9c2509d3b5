use std::collections::HashSet;
use std::sync::RwLock;

use chrono::Utc;

use credits_core::{Nonce, OwnerId, TenantId};
use credits_ledger::{covered_balance, LedgerEntry, NewLedgerEntry};

use super::r#trait::{LedgerStore, StoreError};

#[derive(Debug, Default)]
struct Table {
    entries: Vec<LedgerEntry>,
    nonces: HashSet<Nonce>,
}

impl Table {
    fn balance(&self, owner_id: &OwnerId) -> Result<i64, StoreError> {
        self.entries
            .iter()
            .filter(|e| &e.owner_id == owner_id)
            .try_fold(0i64, |acc, e| acc.checked_add(e.amount))
            .ok_or_else(|| StoreError::Backend(format!("balance of '{owner_id}' overflows i64")))
    }

    fn insert(&mut self, entry: NewLedgerEntry) -> Result<LedgerEntry, StoreError> {
        if self.nonces.contains(&entry.nonce) {
            return Err(StoreError::Conflict {
                nonce: entry.nonce.to_string(),
            });
        }
        let id = self.entries.len() as i64 + 1;
        let committed = entry.commit(id, Utc::now());
        self.nonces.insert(committed.nonce.clone());
        self.entries.push(committed.clone());
        Ok(committed)
    }
}

/// In-memory append-only ledger table for one tenant.
///
/// Intended for tests/dev. Not optimized for performance. The lock is only
/// ever taken inside a single synchronous section, never across an await.
#[derive(Debug)]
pub struct InMemoryLedgerStore {
    tenant: TenantId,
    table: RwLock<Table>,
}

impl InMemoryLedgerStore {
    pub fn new(tenant: TenantId) -> Self {
        Self {
            tenant,
            table: RwLock::new(Table::default()),
        }
    }

    /// Number of committed entries across all owners.
    pub fn len(&self) -> usize {
        self.table.read().map(|t| t.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned() -> StoreError {
    StoreError::Backend("lock poisoned".to_string())
}

#[async_trait::async_trait]
impl LedgerStore for InMemoryLedgerStore {
    fn tenant(&self) -> &TenantId {
        &self.tenant
    }

    async fn nonce_exists(&self, nonce: &Nonce) -> Result<bool, StoreError> {
        let table = self.table.read().map_err(|_| poisoned())?;
        Ok(table.nonces.contains(nonce))
    }

    async fn append(&self, entry: NewLedgerEntry) -> Result<LedgerEntry, StoreError> {
        let mut table = self.table.write().map_err(|_| poisoned())?;
        table.insert(entry)
    }

    async fn append_covered(&self, entry: NewLedgerEntry) -> Result<LedgerEntry, StoreError> {
        let mut table = self.table.write().map_err(|_| poisoned())?;
        let balance = table.balance(&entry.owner_id)?;
        if covered_balance(balance, entry.amount).is_none() {
            return Err(StoreError::InsufficientBalance {
                balance,
                amount: entry.amount,
            });
        }
        table.insert(entry)
    }

    async fn sum_by_owner(&self, owner_id: &OwnerId) -> Result<i64, StoreError> {
        let table = self.table.read().map_err(|_| poisoned())?;
        table.balance(owner_id)
    }

    async fn entries_by_owner(&self, owner_id: &OwnerId) -> Result<Vec<LedgerEntry>, StoreError> {
        let table = self.table.read().map_err(|_| poisoned())?;
        Ok(table
            .entries
            .iter()
            .filter(|e| &e.owner_id == owner_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use credits_ledger::OperationKind;

    fn store() -> InMemoryLedgerStore {
        InMemoryLedgerStore::new(TenantId::parse("healthai").unwrap())
    }

    fn entry(owner: &str, amount: i64, nonce: &str) -> NewLedgerEntry {
        let op = if amount < 0 { "CREDIT_SPEND" } else { "CREDIT_ADD" };
        NewLedgerEntry::new(
            owner.parse().unwrap(),
            OperationKind::parse(op).unwrap(),
            amount,
            nonce.parse().unwrap(),
        )
    }

    #[tokio::test]
    async fn append_assigns_monotonic_ids() {
        let store = store();
        let a = store.append(entry("u1", 10, "n1")).await.unwrap();
        let b = store.append(entry("u2", 3, "n2")).await.unwrap();
        assert_eq!((a.id, b.id), (1, 2));
        assert!(b.created_on >= a.created_on);
    }

    #[tokio::test]
    async fn reused_nonce_is_a_conflict_and_writes_nothing() {
        let store = store();
        store.append(entry("u1", 10, "n1")).await.unwrap();
        let err = store.append(entry("u2", 5, "n1")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));
        assert_eq!(store.len(), 1);
        assert_eq!(store.sum_by_owner(&"u2".parse().unwrap()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn sums_and_lists_per_owner() {
        let store = store();
        store.append(entry("u1", 10, "n1")).await.unwrap();
        store.append(entry("u2", 3, "n2")).await.unwrap();
        store.append(entry("u1", -4, "n3")).await.unwrap();

        let u1: OwnerId = "u1".parse().unwrap();
        assert_eq!(store.sum_by_owner(&u1).await.unwrap(), 6);
        let ids: Vec<i64> = store.entries_by_owner(&u1).await.unwrap().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert!(store.entries_by_owner(&"nobody".parse().unwrap()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn covered_append_rejects_overdraw() {
        let store = store();
        store.append(entry("u1", 1, "n1")).await.unwrap();
        store.append_covered(entry("u1", -1, "n2")).await.unwrap();
        let err = store.append_covered(entry("u1", -1, "n3")).await.unwrap_err();
        assert!(matches!(err, StoreError::InsufficientBalance { balance: 0, amount: -1 }));
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn overflowing_balance_is_an_error_not_a_panic() {
        let store = store();
        let u1: OwnerId = "u1".parse().unwrap();
        store.append(entry("u1", i64::MAX, "n1")).await.unwrap();
        store.append(entry("u1", 1, "n2")).await.unwrap();

        assert!(matches!(store.sum_by_owner(&u1).await, Err(StoreError::Backend(_))));
        let err = store.append_covered(entry("u1", -1, "n3")).await.unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));

        // lock not poisoned; other owners unaffected
        store.append_covered(entry("u2", 0, "n4")).await.unwrap();
        assert_eq!(store.sum_by_owner(&"u2".parse().unwrap()).await.unwrap(), 0);
        assert_eq!(store.len(), 3);
    }
}
