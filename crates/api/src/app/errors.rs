use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use credits_core::DomainError;
use credits_infra::LedgerError;

pub fn ledger_error_to_response(err: LedgerError) -> axum::response::Response {
    match err {
        LedgerError::UnknownOperation { .. } => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "unknown_operation", err.to_string())
        }
        LedgerError::Duplicate { .. } => {
            json_error(StatusCode::BAD_REQUEST, "duplicate_transaction", err.to_string())
        }
        LedgerError::InsufficientBalance { .. } => {
            json_error(StatusCode::BAD_REQUEST, "insufficient_balance", err.to_string())
        }
        LedgerError::StorageTimeout(_) => {
            json_error(StatusCode::GATEWAY_TIMEOUT, "storage_timeout", err.to_string())
        }
        LedgerError::StorageUnavailable(_) => {
            json_error(StatusCode::SERVICE_UNAVAILABLE, "storage_unavailable", err.to_string())
        }
        LedgerError::Schema(e) => {
            tracing::error!(error = %e, "catalog error at request time");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "schema_error", e.to_string())
        }
        LedgerError::Store(e) => {
            tracing::error!(error = %e, "ledger store failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", e.to_string())
        }
    }
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    json_error(StatusCode::UNPROCESSABLE_ENTITY, "validation_error", err.to_string())
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
