use axum::Router;

pub mod ledger;
pub mod system;

/// Router for all tenant-scoped endpoints.
pub fn router() -> Router {
    ledger::router()
}
