//! Postgres-backed ledger store.
//!
//! One table per tenant (`ledger_entries_<tenant>`), all with the same shape.
//! Nonce uniqueness and the balance floor are enforced inside Postgres, so any
//! number of service instances can share the database.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation on insert) | `23505` | `Conflict` (carrying the nonce) |
//! | Database (serialization failure / deadlock) | `40001` / `40P01` | `Unavailable` |
//! | Database (other) | Any other | `Backend` |
//! | PoolTimedOut / PoolClosed / Io / Tls | N/A | `Unavailable` |
//! | Other | N/A | `Backend` |

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Row, Transaction};
use tracing::{debug, instrument};

use credits_core::{Nonce, OwnerId, TenantId};
use credits_ledger::{covered_balance, LedgerEntry, NewLedgerEntry, OperationKind};

use super::r#trait::{LedgerStore, StoreError};

/// Postgres-backed append-only ledger table for one tenant.
///
/// ## Tenant Isolation
///
/// The table name is derived from the validated [`TenantId`] slug and is the
/// only tenant-dependent part of every statement. Nothing here ever touches
/// another tenant's table.
///
/// ## Balance Floor
///
/// `append_covered()` opens a transaction, takes a transaction-scoped advisory
/// lock keyed by `(table, owner_id)`, sums the owner's entries and inserts only
/// if the debit is covered. Debits for the same owner are therefore serialized
/// across connections and processes; other owners are unaffected.
#[derive(Debug, Clone)]
pub struct PostgresLedgerStore {
    pool: PgPool,
    tenant: TenantId,
    table: String,
}

impl PostgresLedgerStore {
    pub fn new(pool: PgPool, tenant: TenantId) -> Self {
        let table = table_name(&tenant);
        Self { pool, tenant, table }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Create the tenant table and its indexes.
    ///
    /// With `drop` set, an existing table is dropped first (all entries lost).
    #[instrument(skip(self), fields(tenant = %self.tenant, table = %self.table), err)]
    pub async fn ensure_schema(&self, drop: bool) -> Result<(), StoreError> {
        let t = &self.table;
        let [nonce_key, owner_idx, operation_idx] = schema_identifiers(t);
        debug_assert!(
            [t, &nonce_key, &owner_idx, &operation_idx]
                .iter()
                .all(|name| name.len() <= PG_MAX_IDENTIFIER_LEN)
        );
        let mut statements = Vec::new();
        if drop {
            statements.push(format!("DROP TABLE IF EXISTS {t}"));
        }
        statements.push(format!(
            r#"
            CREATE TABLE IF NOT EXISTS {t} (
                id BIGSERIAL PRIMARY KEY,
                operation VARCHAR(50) NOT NULL,
                amount BIGINT NOT NULL,
                nonce VARCHAR(100) NOT NULL,
                owner_id VARCHAR(100) NOT NULL,
                created_on TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                CONSTRAINT {nonce_key} UNIQUE (nonce)
            )
            "#
        ));
        statements.push(format!("CREATE INDEX IF NOT EXISTS {owner_idx} ON {t} (owner_id)"));
        statements.push(format!("CREATE INDEX IF NOT EXISTS {operation_idx} ON {t} (operation)"));

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;
        for sql in &statements {
            sqlx::query(sql)
                .execute(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        }
        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        debug!(statements = statements.len(), "ledger schema ready");
        Ok(())
    }

    #[instrument(skip(self), fields(tenant = %self.tenant), err)]
    pub async fn nonce_exists(&self, nonce: &Nonce) -> Result<bool, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE nonce = $1) AS present",
            self.table
        ))
        .bind(nonce.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("nonce_exists", e))?;

        row.try_get("present")
            .map_err(|e| StoreError::Backend(format!("failed to read nonce check: {e}")))
    }

    #[instrument(
        skip(self, entry),
        fields(
            tenant = %self.tenant,
            owner_id = %entry.owner_id,
            nonce = %entry.nonce,
            amount = entry.amount
        ),
        err
    )]
    pub async fn append(&self, entry: NewLedgerEntry) -> Result<LedgerEntry, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;
        let committed = self.insert_entry(&mut tx, &entry).await?;
        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(committed)
    }

    #[instrument(
        skip(self, entry),
        fields(
            tenant = %self.tenant,
            owner_id = %entry.owner_id,
            nonce = %entry.nonce,
            amount = entry.amount
        ),
        err
    )]
    pub async fn append_covered(&self, entry: NewLedgerEntry) -> Result<LedgerEntry, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        // Serialize covered appends per owner until commit/rollback.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1), hashtext($2))")
            .bind(&self.table)
            .bind(entry.owner_id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("owner_lock", e))?;

        let balance = self.sum_in(&mut tx, &entry.owner_id).await?;
        if covered_balance(balance, entry.amount).is_none() {
            tx.rollback()
                .await
                .map_err(|e| map_sqlx_error("rollback", e))?;
            return Err(StoreError::InsufficientBalance {
                balance,
                amount: entry.amount,
            });
        }

        let committed = self.insert_entry(&mut tx, &entry).await?;
        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(committed)
    }

    #[instrument(skip(self), fields(tenant = %self.tenant), err)]
    pub async fn sum_by_owner(&self, owner_id: &OwnerId) -> Result<i64, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT COALESCE(SUM(amount), 0)::BIGINT AS balance FROM {} WHERE owner_id = $1",
            self.table
        ))
        .bind(owner_id.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("sum_by_owner", e))?;

        row.try_get("balance")
            .map_err(|e| StoreError::Backend(format!("failed to read balance: {e}")))
    }

    #[instrument(skip(self), fields(tenant = %self.tenant), err)]
    pub async fn entries_by_owner(&self, owner_id: &OwnerId) -> Result<Vec<LedgerEntry>, StoreError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT id, operation, amount, nonce, owner_id, created_on
            FROM {}
            WHERE owner_id = $1
            ORDER BY id ASC
            "#,
            self.table
        ))
        .bind(owner_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("entries_by_owner", e))?;

        rows.iter()
            .map(|row| {
                LedgerEntryRow::from_row(row)
                    .map_err(|e| StoreError::Backend(format!("failed to deserialize entry row: {e}")))
                    .and_then(LedgerEntry::try_from)
            })
            .collect()
    }

    async fn sum_in(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        owner_id: &OwnerId,
    ) -> Result<i64, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT COALESCE(SUM(amount), 0)::BIGINT AS balance FROM {} WHERE owner_id = $1",
            self.table
        ))
        .bind(owner_id.as_str())
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("sum_by_owner", e))?;

        row.try_get("balance")
            .map_err(|e| StoreError::Backend(format!("failed to read balance: {e}")))
    }

    async fn insert_entry(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        entry: &NewLedgerEntry,
    ) -> Result<LedgerEntry, StoreError> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO {} (operation, amount, nonce, owner_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, operation, amount, nonce, owner_id, created_on
            "#,
            self.table
        ))
        .bind(entry.operation.as_str())
        .bind(entry.amount)
        .bind(entry.nonce.as_str())
        .bind(entry.owner_id.as_str())
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::Conflict {
                    nonce: entry.nonce.to_string(),
                }
            } else {
                map_sqlx_error("insert_entry", e)
            }
        })?;

        let row = LedgerEntryRow::from_row(&row)
            .map_err(|e| StoreError::Backend(format!("failed to deserialize entry row: {e}")))?;
        LedgerEntry::try_from(row)
    }
}

/// Table holding `tenant`'s entries.
pub fn table_name(tenant: &TenantId) -> String {
    format!("ledger_entries_{}", tenant.as_str())
}

/// Postgres silently truncates identifiers longer than this (bytes).
const PG_MAX_IDENTIFIER_LEN: usize = 63;

/// Names of the nonce constraint, the owner index and the operation index.
fn schema_identifiers(table: &str) -> [String; 3] {
    [
        format!("{table}_nonce_key"),
        format!("{table}_owner_id_idx"),
        format!("{table}_operation_idx"),
    ]
}

#[async_trait::async_trait]
impl LedgerStore for PostgresLedgerStore {
    fn tenant(&self) -> &TenantId {
        &self.tenant
    }

    async fn nonce_exists(&self, nonce: &Nonce) -> Result<bool, StoreError> {
        PostgresLedgerStore::nonce_exists(self, nonce).await
    }

    async fn append(&self, entry: NewLedgerEntry) -> Result<LedgerEntry, StoreError> {
        PostgresLedgerStore::append(self, entry).await
    }

    async fn append_covered(&self, entry: NewLedgerEntry) -> Result<LedgerEntry, StoreError> {
        PostgresLedgerStore::append_covered(self, entry).await
    }

    async fn sum_by_owner(&self, owner_id: &OwnerId) -> Result<i64, StoreError> {
        PostgresLedgerStore::sum_by_owner(self, owner_id).await
    }

    async fn entries_by_owner(&self, owner_id: &OwnerId) -> Result<Vec<LedgerEntry>, StoreError> {
        PostgresLedgerStore::entries_by_owner(self, owner_id).await
    }
}

/// Map SQLx errors to StoreError.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            classify_database_error(db_err.code().as_deref(), msg)
        }
        sqlx::Error::PoolTimedOut => {
            StoreError::Unavailable(format!("connection pool timed out in {operation}"))
        }
        sqlx::Error::PoolClosed => {
            StoreError::Unavailable(format!("connection pool closed in {operation}"))
        }
        sqlx::Error::Io(e) => StoreError::Unavailable(format!("io error in {operation}: {e}")),
        sqlx::Error::Tls(e) => StoreError::Unavailable(format!("tls error in {operation}: {e}")),
        _ => StoreError::Backend(format!("sqlx error in {operation}: {err}")),
    }
}

/// Unique violations only mean a reused nonce inside `insert_entry`, which
/// knows the nonce and handles them itself; anywhere else they are backend errors.
fn classify_database_error(code: Option<&str>, msg: String) -> StoreError {
    match code {
        // Serialization failure / deadlock: safe to retry.
        Some("40001") | Some("40P01") => StoreError::Unavailable(msg),
        _ => StoreError::Backend(msg),
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        if let Some(code) = db_err.code() {
            return code.as_ref() == "23505";
        }
    }
    false
}

// SQLx row types

#[derive(Debug)]
struct LedgerEntryRow {
    id: i64,
    operation: String,
    amount: i64,
    nonce: String,
    owner_id: String,
    created_on: DateTime<Utc>,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for LedgerEntryRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(LedgerEntryRow {
            id: row.try_get("id")?,
            operation: row.try_get("operation")?,
            amount: row.try_get("amount")?,
            nonce: row.try_get("nonce")?,
            owner_id: row.try_get("owner_id")?,
            created_on: row.try_get("created_on")?,
        })
    }
}

impl TryFrom<LedgerEntryRow> for LedgerEntry {
    type Error = StoreError;

    fn try_from(row: LedgerEntryRow) -> Result<Self, Self::Error> {
        let corrupt = |e: credits_core::DomainError| {
            StoreError::Backend(format!("stored entry {} is invalid: {e}", row.id))
        };
        Ok(LedgerEntry {
            id: row.id,
            operation: OperationKind::parse(&row.operation).map_err(corrupt)?,
            amount: row.amount,
            nonce: row.nonce.parse().map_err(corrupt)?,
            owner_id: row.owner_id.parse().map_err(corrupt)?,
            created_on: row.created_on,
        })
    }
}
