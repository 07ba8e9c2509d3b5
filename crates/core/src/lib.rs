//! `credits-core`: shared building blocks for the credit ledger.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod error;
pub mod id;

pub use error::DomainError;
pub use id::{Nonce, OwnerId, TenantId};
