//! Startup wiring: settings -> stores -> engines -> registry.

use std::sync::Arc;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;
use tracing::info;

use credits_core::DomainError;
use credits_ledger::{OperationValues, TenantConfig};

use crate::config::Settings;
use crate::engine::{LedgerEngine, LedgerError, LedgerService};
use crate::ledger_store::{InMemoryLedgerStore, LedgerStore, PostgresLedgerStore, StoreError};
use crate::registry::TenantRegistry;

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("no tenants configured")]
    NoTenants,

    #[error("provisioning requires a database_url")]
    NoDatabase,

    #[error("failed to connect to database: {0}")]
    Connect(#[from] sqlx::Error),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Registry(#[from] DomainError),
}

/// Build one engine per configured tenant.
///
/// With a `database_url` every tenant gets a Postgres-backed store sharing one
/// pool; otherwise each tenant gets its own in-memory store.
pub async fn build_registry(settings: &Settings) -> Result<TenantRegistry, BootstrapError> {
    if settings.tenants.is_empty() {
        return Err(BootstrapError::NoTenants);
    }
    let values = Arc::new(settings.operation_values.clone());
    let mut registry = TenantRegistry::new();

    match settings.database_url.as_deref() {
        Some(url) => {
            let pool = connect(url, settings.max_connections).await?;
            for config in &settings.tenants {
                let store = PostgresLedgerStore::new(pool.clone(), config.tenant.clone());
                if settings.auto_provision {
                    store.ensure_schema(false).await?;
                }
                registry.register(engine(settings, config, values.clone(), store)?)?;
            }
            info!(tenants = registry.len(), backend = "postgres", "tenant registry ready");
        }
        None => {
            for config in &settings.tenants {
                let store = InMemoryLedgerStore::new(config.tenant.clone());
                registry.register(engine(settings, config, values.clone(), store)?)?;
            }
            info!(tenants = registry.len(), backend = "memory", "tenant registry ready");
        }
    }

    Ok(registry)
}

/// Create (or with `drop`, recreate) every configured tenant's table.
/// Returns the table names touched.
pub async fn provision(settings: &Settings, drop: bool) -> Result<Vec<String>, BootstrapError> {
    let url = settings.database_url.as_deref().ok_or(BootstrapError::NoDatabase)?;
    let pool = connect(url, settings.max_connections).await?;

    let mut tables = Vec::with_capacity(settings.tenants.len());
    for config in &settings.tenants {
        let store = PostgresLedgerStore::new(pool.clone(), config.tenant.clone());
        store.ensure_schema(drop).await?;
        info!(tenant = %config.tenant, table = store.table(), drop, "tenant table provisioned");
        tables.push(store.table().to_string());
    }
    Ok(tables)
}

async fn connect(url: &str, max_connections: u32) -> Result<PgPool, BootstrapError> {
    Ok(PgPoolOptions::new()
        .max_connections(max_connections.max(1))
        .connect(url)
        .await?)
}

fn engine<S>(
    settings: &Settings,
    config: &TenantConfig,
    values: Arc<OperationValues>,
    store: S,
) -> Result<Arc<dyn LedgerService>, LedgerError>
where
    S: LedgerStore + 'static,
{
    let mut engine = LedgerEngine::from_config(config, values, store)?;
    if let Some(limit) = settings.storage_timeout() {
        engine = engine.with_timeout(limit);
    }
    Ok(Arc::new(engine))
}
