//! Credit ledger domain: operation kinds, per-tenant catalogs, entries.
//!
//! Pure domain logic only: no IO, no HTTP, no persistence concerns.

pub mod catalog;
pub mod entry;
pub mod operation;
pub mod tenant;

pub use catalog::{CatalogError, OperationCatalog};
pub use entry::{covered_balance, BalanceSnapshot, LedgerEntry, NewLedgerEntry};
pub use operation::{OperationKind, OperationValues, BASELINE_OPERATIONS};
pub use tenant::TenantConfig;
