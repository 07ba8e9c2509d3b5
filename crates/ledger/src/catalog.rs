//! Per-tenant operation catalogs.
//!
//! A catalog is the closed set of operation kinds one tenant accepts, bound to
//! the shared [`OperationValues`] table. Catalogs are validated once, when a
//! tenant is registered, and never mutated afterwards.

use std::collections::BTreeSet;
use std::sync::Arc;

use thiserror::Error;

use credits_core::{DomainError, TenantId};

use crate::operation::{OperationKind, OperationValues, BASELINE_OPERATIONS};

/// Catalog definition failure (the ledger's schema error).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("tenant '{tenant}' must define all shared operations: missing {}", .missing.join(", "))]
    MissingBaseline { tenant: TenantId, missing: Vec<String> },

    #[error("tenant '{tenant}' declares operation '{kind}' more than once")]
    DuplicateKind { tenant: TenantId, kind: OperationKind },
}

impl From<CatalogError> for DomainError {
    fn from(value: CatalogError) -> Self {
        DomainError::schema(value.to_string())
    }
}

/// Closed set of operation kinds for one tenant.
#[derive(Debug, Clone)]
pub struct OperationCatalog {
    tenant: TenantId,
    kinds: BTreeSet<OperationKind>,
    values: Arc<OperationValues>,
}

impl OperationCatalog {
    /// Define and validate a tenant catalog.
    ///
    /// Fails if the kinds omit any baseline operation or repeat a kind.
    pub fn define(
        tenant: TenantId,
        kinds: impl IntoIterator<Item = OperationKind>,
        values: Arc<OperationValues>,
    ) -> Result<Self, CatalogError> {
        let mut set = BTreeSet::new();
        for kind in kinds {
            if set.contains(&kind) {
                return Err(CatalogError::DuplicateKind { tenant, kind });
            }
            set.insert(kind);
        }

        let mut missing: Vec<String> = BASELINE_OPERATIONS
            .iter()
            .filter(|name| !set.iter().any(|k| k.as_str() == **name))
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            missing.sort();
            return Err(CatalogError::MissingBaseline { tenant, missing });
        }

        Ok(Self {
            tenant,
            kinds: set,
            values,
        })
    }

    pub fn tenant(&self) -> &TenantId {
        &self.tenant
    }

    /// Point value of `kind`.
    ///
    /// Kinds absent from the shared table are worth 0.
    pub fn value_of(&self, kind: &OperationKind) -> i64 {
        self.values.get(kind).unwrap_or(0)
    }

    /// Like [`value_of`](Self::value_of), but tells unconfigured kinds apart.
    pub fn configured_value(&self, kind: &OperationKind) -> Option<i64> {
        self.values.get(kind)
    }

    pub fn contains(&self, kind: &OperationKind) -> bool {
        self.kinds.contains(kind)
    }

    /// Look up a member of this catalog by name.
    pub fn resolve(&self, name: &str) -> Option<&OperationKind> {
        self.kinds.iter().find(|k| k.as_str() == name)
    }

    /// Declared kinds, in name order.
    pub fn kinds(&self) -> impl Iterator<Item = &OperationKind> {
        self.kinds.iter()
    }
}
