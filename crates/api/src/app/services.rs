use credits_infra::TenantRegistry;

/// Process-wide state visible to every handler.
#[derive(Debug, Clone)]
pub struct AppServices {
    pub app_name: String,
    pub registry: TenantRegistry,
}

impl AppServices {
    pub fn new(app_name: String, registry: TenantRegistry) -> Self {
        Self { app_name, registry }
    }

    pub fn tenant_names(&self) -> Vec<String> {
        self.registry.tenants().map(|t| t.to_string()).collect()
    }
}
