use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use credits_core::OwnerId;

use crate::app::{dto, errors};
use crate::context::TenantContext;

pub fn router() -> Router {
    Router::new()
        .route("/ledger", post(add_entry))
        .route("/ledger/", post(add_entry))
        .route("/ledger/:owner_id", get(get_balance))
        .route("/ledger/:owner_id/entries", get(list_entries))
}

pub async fn get_balance(
    Extension(tenant): Extension<TenantContext>,
    Path(owner_id): Path<String>,
) -> axum::response::Response {
    let owner_id = match owner_id.parse::<OwnerId>() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match tenant.ledger().get_balance(&owner_id).await {
        Ok(snapshot) => (StatusCode::OK, Json(dto::BalanceResponse::from(snapshot))).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn list_entries(
    Extension(tenant): Extension<TenantContext>,
    Path(owner_id): Path<String>,
) -> axum::response::Response {
    let owner_id = match owner_id.parse::<OwnerId>() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match tenant.ledger().entries(&owner_id).await {
        Ok(entries) => {
            let body = dto::EntriesResponse {
                owner_id: owner_id.into(),
                items: entries.into_iter().map(dto::EntryResponse::from).collect(),
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn add_entry(
    Extension(tenant): Extension<TenantContext>,
    Json(body): Json<dto::AddEntryRequest>,
) -> axum::response::Response {
    let (owner_id, operation, nonce) = match body.parse() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match tenant.ledger().add_entry(owner_id, operation, nonce).await {
        Ok(entry) => (StatusCode::CREATED, Json(dto::EntryResponse::from(entry))).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}
