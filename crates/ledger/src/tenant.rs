//! Tenant definitions.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use credits_core::TenantId;

use crate::catalog::{CatalogError, OperationCatalog};
use crate::operation::{OperationKind, OperationValues, BASELINE_OPERATIONS};

/// Declarative description of one tenant application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantConfig {
    pub tenant: TenantId,
    pub display_name: String,
    pub operations: Vec<OperationKind>,
}

impl TenantConfig {
    /// Baseline operations plus `extra`; names that are not valid operation
    /// names are skipped.
    pub fn with_baseline(tenant: TenantId, display_name: impl Into<String>, extra: &[&str]) -> Self {
        let operations = BASELINE_OPERATIONS
            .iter()
            .chain(extra)
            .filter_map(|name| OperationKind::parse(name).ok())
            .collect();
        Self {
            tenant,
            display_name: display_name.into(),
            operations,
        }
    }

    pub fn health_ai() -> Self {
        Self::with_baseline(
            TenantId::parse("healthai").expect("static tenant id"),
            "HealthAI",
            &["CONTENT_CREATION", "CONTENT_ACCESS"],
        )
    }

    pub fn travel_ai() -> Self {
        Self::with_baseline(
            TenantId::parse("travelai").expect("static tenant id"),
            "TravelAI",
            &["CONTENT_CREATION", "CONTENT_ACCESS"],
        )
    }

    /// Validate this definition into a catalog.
    pub fn catalog(&self, values: Arc<OperationValues>) -> Result<OperationCatalog, CatalogError> {
        OperationCatalog::define(self.tenant.clone(), self.operations.iter().cloned(), values)
    }
}
