use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};

use credits_core::TenantId;
use credits_infra::TenantRegistry;

use crate::app::errors::json_error;
use crate::context::TenantContext;

/// Header naming the tenant a request is addressed to.
pub const TENANT_HEADER: &str = "x-tenant-id";

/// Resolve the request's tenant and attach its [`TenantContext`].
///
/// Without the header, a single-tenant deployment serves its only tenant.
pub async fn tenant_middleware(
    State(registry): State<TenantRegistry>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, Response> {
    let ledger = match extract_tenant(req.headers())? {
        Some(raw) => {
            let tenant = TenantId::parse(raw).map_err(|_| unknown_tenant(raw))?;
            registry.get(&tenant).ok_or_else(|| unknown_tenant(raw))?
        }
        None => registry.single().ok_or_else(|| {
            json_error(
                StatusCode::BAD_REQUEST,
                "missing_tenant",
                format!("{TENANT_HEADER} header is required"),
            )
        })?,
    };

    req.extensions_mut().insert(TenantContext::new(ledger));
    Ok(next.run(req).await)
}

fn extract_tenant(headers: &HeaderMap) -> Result<Option<&str>, Response> {
    let Some(value) = headers.get(TENANT_HEADER) else {
        return Ok(None);
    };
    let value = value.to_str().map_err(|_| {
        json_error(
            StatusCode::NOT_FOUND,
            "unknown_tenant",
            "tenant header is not a readable tenant id",
        )
    })?;

    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    Ok(Some(value))
}

fn unknown_tenant(raw: &str) -> Response {
    json_error(
        StatusCode::NOT_FOUND,
        "unknown_tenant",
        format!("tenant '{raw}' is not registered"),
    )
}
