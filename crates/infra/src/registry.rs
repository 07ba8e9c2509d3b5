//! Tenant registry: tenant id -> ledger service.
//!
//! Filled once at startup; read-only afterwards, so lookups need no locking.

use std::collections::BTreeMap;
use std::sync::Arc;

use credits_core::{DomainError, TenantId};

use crate::engine::LedgerService;

#[derive(Clone, Default)]
pub struct TenantRegistry {
    services: BTreeMap<TenantId, Arc<dyn LedgerService>>,
}

impl TenantRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tenant's ledger. Each tenant may be registered once.
    pub fn register(&mut self, service: Arc<dyn LedgerService>) -> Result<(), DomainError> {
        let tenant = service.tenant().clone();
        if self.services.contains_key(&tenant) {
            return Err(DomainError::conflict(format!("tenant '{tenant}' is already registered")));
        }
        self.services.insert(tenant, service);
        Ok(())
    }

    pub fn get(&self, tenant: &TenantId) -> Option<Arc<dyn LedgerService>> {
        self.services.get(tenant).cloned()
    }

    /// The only registered ledger, if exactly one exists.
    pub fn single(&self) -> Option<Arc<dyn LedgerService>> {
        if self.services.len() == 1 {
            self.services.values().next().cloned()
        } else {
            None
        }
    }

    pub fn tenants(&self) -> impl Iterator<Item = &TenantId> {
        self.services.keys()
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl core::fmt::Debug for TenantRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TenantRegistry")
            .field("tenants", &self.services.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::LedgerEngine;
    use crate::ledger_store::InMemoryLedgerStore;
    use credits_ledger::{OperationValues, TenantConfig};

    fn service(config: TenantConfig) -> Arc<dyn LedgerService> {
        let store = InMemoryLedgerStore::new(config.tenant.clone());
        Arc::new(
            LedgerEngine::from_config(&config, Arc::new(OperationValues::standard()), store).unwrap(),
        )
    }

    #[test]
    fn registers_and_resolves_tenants() {
        let mut registry = TenantRegistry::new();
        registry.register(service(TenantConfig::health_ai())).unwrap();
        assert!(registry.single().is_some());

        registry.register(service(TenantConfig::travel_ai())).unwrap();
        assert!(registry.single().is_none());
        assert_eq!(registry.len(), 2);

        let travel = TenantId::parse("TravelAI").unwrap();
        assert_eq!(registry.get(&travel).unwrap().display_name(), "TravelAI");
        assert!(registry.get(&TenantId::parse("eduai").unwrap()).is_none());
    }

    #[test]
    fn duplicate_registration_is_a_conflict() {
        let mut registry = TenantRegistry::new();
        registry.register(service(TenantConfig::health_ai())).unwrap();
        let err = registry.register(service(TenantConfig::health_ai())).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }
}
