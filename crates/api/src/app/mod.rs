//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: tenant ledgers and app metadata shared by handlers
//! - `routes/`: HTTP routes + handlers
//! - `dto.rs`: request/response DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

use credits_infra::bootstrap::{self, BootstrapError};
use credits_infra::config::Settings;
use credits_infra::TenantRegistry;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router from settings (public entrypoint used by `main.rs`).
pub async fn build_app(settings: &Settings) -> Result<Router, BootstrapError> {
    let registry = bootstrap::build_registry(settings).await?;
    Ok(router(registry, settings.app_name.clone()))
}

/// Build the router over an already wired registry.
pub fn router(registry: TenantRegistry, app_name: String) -> Router {
    let services = Arc::new(services::AppServices::new(app_name, registry.clone()));

    // Tenant-scoped routes: require a resolvable tenant.
    let scoped = routes::router().route_layer(axum::middleware::from_fn_with_state(
        registry,
        middleware::tenant_middleware,
    ));

    Router::new()
        .route("/", get(routes::system::welcome))
        .route("/health", get(routes::system::health))
        .merge(scoped)
        .layer(Extension(services))
        .layer(ServiceBuilder::new())
}
