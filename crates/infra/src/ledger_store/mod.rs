//! Append-only, tenant-scoped ledger storage.
//!
//! Each store instance is bound to exactly one tenant's entry table; nothing in
//! this module ever reads across tenants.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryLedgerStore;
pub use postgres::PostgresLedgerStore;
pub use r#trait::{LedgerStore, StoreError};
