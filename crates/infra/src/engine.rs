//! Ledger engine (application-level orchestration).
//!
//! The engine owns one tenant's catalog and store and implements the append
//! protocol:
//!
//! ```text
//! add_entry(owner, operation, nonce)
//!   ↓
//! 1. Resolve amount from the tenant catalog (unconfigured kinds are worth 0)
//!   ↓
//! 2. Reject a nonce that is already recorded (fast path)
//!   ↓
//! 3. For debits, reject if the current balance cannot cover the amount (fast path)
//!   ↓
//! 4. Append; debits use the store's covered append, which re-checks the
//!    balance under a per-owner lock, and the store's unique constraint
//!    catches any nonce that slipped past step 2
//! ```
//!
//! The engine holds no entry state between calls and takes no in-process locks,
//! so one instance can be shared by any number of request handlers.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use thiserror::Error;
use tracing::{info, instrument, warn};

use credits_core::{Nonce, OwnerId, TenantId};
use credits_ledger::{
    covered_balance, BalanceSnapshot, CatalogError, LedgerEntry, NewLedgerEntry, OperationCatalog,
    OperationKind, OperationValues, TenantConfig,
};

use crate::ledger_store::{LedgerStore, StoreError};

/// Ledger operation failure, as seen by callers of the engine.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Tenant catalog definition is invalid (registration time only).
    #[error(transparent)]
    Schema(#[from] CatalogError),

    /// The operation is not part of this tenant's catalog.
    #[error("operation '{operation}' is not defined for tenant '{tenant}'")]
    UnknownOperation { tenant: TenantId, operation: String },

    /// The nonce was already used; the entry is already applied.
    #[error("Duplicate transaction detected (nonce '{nonce}')")]
    Duplicate { nonce: String },

    /// The entry would take the owner's balance below zero.
    #[error("Insufficient balance for this operation (balance {balance}, amount {amount})")]
    InsufficientBalance { balance: i64, amount: i64 },

    /// A storage call exceeded the configured deadline; outcome unknown for appends.
    #[error("storage call '{0}' timed out")]
    StorageTimeout(&'static str),

    /// Transient storage failure; retrying with the same nonce is safe.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for LedgerError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Conflict { nonce } => LedgerError::Duplicate { nonce },
            StoreError::InsufficientBalance { balance, amount } => {
                LedgerError::InsufficientBalance { balance, amount }
            }
            StoreError::Unavailable(msg) => LedgerError::StorageUnavailable(msg),
            other => LedgerError::Store(other),
        }
    }
}

impl LedgerError {
    /// Whether repeating the identical call may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, LedgerError::StorageTimeout(_) | LedgerError::StorageUnavailable(_))
    }
}

/// Ledger engine for one tenant.
#[derive(Debug)]
pub struct LedgerEngine<S> {
    catalog: OperationCatalog,
    display_name: String,
    store: S,
    timeout: Option<Duration>,
}

impl<S> LedgerEngine<S>
where
    S: LedgerStore,
{
    /// Build an engine from a tenant definition.
    ///
    /// Validates the tenant catalog (fails with [`LedgerError::Schema`]) and
    /// checks that `store` is bound to the same tenant.
    pub fn from_config(
        config: &TenantConfig,
        values: Arc<OperationValues>,
        store: S,
    ) -> Result<Self, LedgerError> {
        let catalog = config.catalog(values)?;
        if store.tenant() != &config.tenant {
            return Err(LedgerError::Store(StoreError::TenantIsolation(format!(
                "store bound to tenant '{}', config is for '{}'",
                store.tenant(),
                config.tenant
            ))));
        }

        info!(
            tenant = %config.tenant,
            operations = catalog.kinds().count(),
            "ledger engine registered"
        );

        Ok(Self {
            catalog,
            display_name: config.display_name.clone(),
            store,
            timeout: None,
        })
    }

    /// Bound every storage call by `limit`.
    pub fn with_timeout(mut self, limit: Duration) -> Self {
        self.timeout = Some(limit);
        self
    }

    pub fn tenant(&self) -> &TenantId {
        self.catalog.tenant()
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn catalog(&self) -> &OperationCatalog {
        &self.catalog
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Current balance of `owner_id` (0 for owners without entries).
    #[instrument(skip(self), fields(tenant = %self.catalog.tenant()), err)]
    pub async fn get_balance(&self, owner_id: &OwnerId) -> Result<BalanceSnapshot, LedgerError> {
        let balance = self
            .bounded("sum_by_owner", self.store.sum_by_owner(owner_id))
            .await?;
        Ok(BalanceSnapshot {
            owner_id: owner_id.clone(),
            balance,
            as_of: Utc::now(),
        })
    }

    /// All entries of `owner_id`, ascending by id.
    #[instrument(skip(self), fields(tenant = %self.catalog.tenant()), err)]
    pub async fn entries(&self, owner_id: &OwnerId) -> Result<Vec<LedgerEntry>, LedgerError> {
        self.bounded("entries_by_owner", self.store.entries_by_owner(owner_id))
            .await
    }

    /// Record one entry for `owner_id`.
    ///
    /// Idempotent per nonce: a second call with the same nonce fails with
    /// [`LedgerError::Duplicate`] and records nothing.
    #[instrument(
        skip_all,
        fields(tenant = %self.catalog.tenant(), owner_id = %owner_id, operation = %operation, nonce = %nonce),
        err
    )]
    pub async fn add_entry(
        &self,
        owner_id: OwnerId,
        operation: OperationKind,
        nonce: Nonce,
    ) -> Result<LedgerEntry, LedgerError> {
        if !self.catalog.contains(&operation) {
            return Err(LedgerError::UnknownOperation {
                tenant: self.tenant().clone(),
                operation: operation.to_string(),
            });
        }

        let amount = match self.catalog.configured_value(&operation) {
            Some(amount) => amount,
            None => {
                warn!(operation = %operation, "operation has no configured value; recording 0");
                0
            }
        };

        if self
            .bounded("nonce_exists", self.store.nonce_exists(&nonce))
            .await?
        {
            return Err(LedgerError::Duplicate {
                nonce: nonce.to_string(),
            });
        }

        let entry = NewLedgerEntry::new(owner_id, operation, amount, nonce);
        let committed = if amount < 0 {
            let balance = self
                .bounded("sum_by_owner", self.store.sum_by_owner(&entry.owner_id))
                .await?;
            if covered_balance(balance, amount).is_none() {
                return Err(LedgerError::InsufficientBalance { balance, amount });
            }
            self.bounded("append_covered", self.store.append_covered(entry))
                .await?
        } else {
            self.bounded("append", self.store.append(entry)).await?
        };

        info!(entry_id = committed.id, amount = committed.amount, "ledger entry committed");
        Ok(committed)
    }

    async fn bounded<T, F>(&self, op: &'static str, fut: F) -> Result<T, LedgerError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, fut).await {
                Ok(result) => result.map_err(LedgerError::from),
                Err(_) => {
                    warn!(operation = op, timeout_ms = limit.as_millis() as u64, "storage call timed out");
                    Err(LedgerError::StorageTimeout(op))
                }
            },
            None => fut.await.map_err(LedgerError::from),
        }
    }
}

/// Object-safe facade over [`LedgerEngine`], so engines over different stores
/// can live side by side in one registry.
#[async_trait::async_trait]
pub trait LedgerService: Send + Sync {
    fn tenant(&self) -> &TenantId;

    fn display_name(&self) -> &str;

    fn catalog(&self) -> &OperationCatalog;

    async fn get_balance(&self, owner_id: &OwnerId) -> Result<BalanceSnapshot, LedgerError>;

    async fn add_entry(
        &self,
        owner_id: OwnerId,
        operation: OperationKind,
        nonce: Nonce,
    ) -> Result<LedgerEntry, LedgerError>;

    async fn entries(&self, owner_id: &OwnerId) -> Result<Vec<LedgerEntry>, LedgerError>;
}

#[async_trait::async_trait]
impl<S> LedgerService for LedgerEngine<S>
where
    S: LedgerStore,
{
    fn tenant(&self) -> &TenantId {
        LedgerEngine::tenant(self)
    }

    fn display_name(&self) -> &str {
        LedgerEngine::display_name(self)
    }

    fn catalog(&self) -> &OperationCatalog {
        LedgerEngine::catalog(self)
    }

    async fn get_balance(&self, owner_id: &OwnerId) -> Result<BalanceSnapshot, LedgerError> {
        LedgerEngine::get_balance(self, owner_id).await
    }

    async fn add_entry(
        &self,
        owner_id: OwnerId,
        operation: OperationKind,
        nonce: Nonce,
    ) -> Result<LedgerEntry, LedgerError> {
        LedgerEngine::add_entry(self, owner_id, operation, nonce).await
    }

    async fn entries(&self, owner_id: &OwnerId) -> Result<Vec<LedgerEntry>, LedgerError> {
        LedgerEngine::entries(self, owner_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger_store::InMemoryLedgerStore;

    fn tenant() -> TenantId {
        TenantId::parse("healthai").unwrap()
    }

    fn engine() -> LedgerEngine<InMemoryLedgerStore> {
        LedgerEngine::from_config(
            &TenantConfig::health_ai(),
            Arc::new(OperationValues::standard()),
            InMemoryLedgerStore::new(tenant()),
        )
        .unwrap()
    }

    fn owner(s: &str) -> OwnerId {
        s.parse().unwrap()
    }

    fn op(s: &str) -> OperationKind {
        OperationKind::parse(s).unwrap()
    }

    fn nonce(s: &str) -> Nonce {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn unknown_owner_has_zero_balance() {
        let snapshot = engine().get_balance(&owner("ghost")).await.unwrap();
        assert_eq!(snapshot.balance, 0);
        assert_eq!(snapshot.owner_id, owner("ghost"));
    }

    #[tokio::test]
    async fn signup_credit_then_spend_then_duplicate() {
        let engine = engine();

        let signup = engine
            .add_entry(owner("u1"), op("SIGNUP_CREDIT"), nonce("n1"))
            .await
            .unwrap();
        assert_eq!(signup.amount, 3);
        assert_eq!(engine.get_balance(&owner("u1")).await.unwrap().balance, 3);

        let spend = engine
            .add_entry(owner("u1"), op("CREDIT_SPEND"), nonce("n2"))
            .await
            .unwrap();
        assert_eq!(spend.amount, -1);
        assert_eq!(engine.get_balance(&owner("u1")).await.unwrap().balance, 2);

        let err = engine
            .add_entry(owner("u1"), op("CREDIT_SPEND"), nonce("n2"))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Duplicate { .. }));
        assert_eq!(engine.get_balance(&owner("u1")).await.unwrap().balance, 2);
        assert_eq!(engine.entries(&owner("u1")).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn spend_on_empty_account_is_rejected() {
        let engine = engine();
        let err = engine
            .add_entry(owner("u2"), op("CREDIT_SPEND"), nonce("n3"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InsufficientBalance { balance: 0, amount: -1 }
        ));
        assert_eq!(engine.get_balance(&owner("u2")).await.unwrap().balance, 0);
        assert!(!engine.store().nonce_exists(&nonce("n3")).await.unwrap());
    }

    #[tokio::test]
    async fn nonce_is_unique_across_owners() {
        let engine = engine();
        engine
            .add_entry(owner("u1"), op("DAILY_REWARD"), nonce("shared"))
            .await
            .unwrap();
        let err = engine
            .add_entry(owner("u2"), op("DAILY_REWARD"), nonce("shared"))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Duplicate { .. }));
    }

    #[tokio::test]
    async fn operation_outside_tenant_catalog_is_rejected() {
        let engine = engine();
        let err = engine
            .add_entry(owner("u1"), op("FLIGHT_UPGRADE"), nonce("n1"))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::UnknownOperation { .. }));
        assert!(engine.store().is_empty());
    }

    #[tokio::test]
    async fn declared_but_unvalued_operation_records_zero() {
        let config = TenantConfig::with_baseline(tenant(), "HealthAI", &["STREAK_BONUS"]);
        let engine = LedgerEngine::from_config(
            &config,
            Arc::new(OperationValues::standard()),
            InMemoryLedgerStore::new(tenant()),
        )
        .unwrap();

        let entry = engine
            .add_entry(owner("u1"), op("STREAK_BONUS"), nonce("n1"))
            .await
            .unwrap();
        assert_eq!(entry.amount, 0);
        assert_eq!(engine.get_balance(&owner("u1")).await.unwrap().balance, 0);
    }

    #[test]
    fn catalog_missing_baseline_fails_registration() {
        let config = TenantConfig {
            tenant: tenant(),
            display_name: "HealthAI".to_string(),
            operations: vec![op("DAILY_REWARD"), op("CREDIT_ADD")],
        };
        let err = LedgerEngine::from_config(
            &config,
            Arc::new(OperationValues::standard()),
            InMemoryLedgerStore::new(tenant()),
        )
        .unwrap_err();
        assert!(matches!(err, LedgerError::Schema(CatalogError::MissingBaseline { .. })));
    }

    #[test]
    fn store_for_another_tenant_is_rejected() {
        let err = LedgerEngine::from_config(
            &TenantConfig::health_ai(),
            Arc::new(OperationValues::standard()),
            InMemoryLedgerStore::new(TenantId::parse("travelai").unwrap()),
        )
        .unwrap_err();
        assert!(matches!(err, LedgerError::Store(StoreError::TenantIsolation(_))));
    }

    #[test]
    fn store_errors_translate_at_the_engine_boundary() {
        let dup = LedgerError::from(StoreError::Conflict { nonce: "n1".into() });
        assert!(matches!(dup, LedgerError::Duplicate { .. }));
        let down = LedgerError::from(StoreError::Unavailable("pool closed".into()));
        assert!(down.is_transient());
        let other = LedgerError::from(StoreError::Backend("boom".into()));
        assert!(!other.is_transient());
    }
}
