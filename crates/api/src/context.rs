use std::sync::Arc;

use credits_core::TenantId;
use credits_infra::LedgerService;

/// Tenant context for a request.
///
/// Resolved once by the tenant middleware; present for all `/ledger` routes.
#[derive(Clone)]
pub struct TenantContext {
    tenant_id: TenantId,
    ledger: Arc<dyn LedgerService>,
}

impl TenantContext {
    pub fn new(ledger: Arc<dyn LedgerService>) -> Self {
        Self {
            tenant_id: ledger.tenant().clone(),
            ledger,
        }
    }

    pub fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }

    pub fn ledger(&self) -> &dyn LedgerService {
        self.ledger.as_ref()
    }
}

impl core::fmt::Debug for TenantContext {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TenantContext")
            .field("tenant_id", &self.tenant_id)
            .finish()
    }
}
