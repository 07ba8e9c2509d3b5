//! Infrastructure layer: ledger stores, the ledger engine, tenant wiring, config.

pub mod bootstrap;
pub mod config;
pub mod engine;
pub mod ledger_store;
pub mod registry;


pub use engine::{LedgerEngine, LedgerError, LedgerService};
pub use registry::TenantRegistry;
