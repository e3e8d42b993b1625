//! API route definitions

mod governance;
mod health;
mod markets;
mod trading;
mod users;

use axum::{http::StatusCode, response::Json, Router};
use predex_core::LedgerError;
use serde::Serialize;

use crate::AppState;

/// Create all API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(markets::routes())
        .merge(trading::routes())
        .merge(users::routes())
        .merge(governance::routes())
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Map a domain error to an HTTP response
pub(crate) fn error_response(err: LedgerError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match &err {
        LedgerError::MarketNotFound(_)
        | LedgerError::UserNotFound(_)
        | LedgerError::ProposalNotFound(_)
        | LedgerError::NoPosition(_) => StatusCode::NOT_FOUND,
        LedgerError::InvalidAmount(_)
        | LedgerError::InsufficientBalance { .. }
        | LedgerError::InsufficientShares { .. } => StatusCode::BAD_REQUEST,
        LedgerError::MarketClosed(_)
        | LedgerError::VersionConflict { .. }
        | LedgerError::AlreadyVoted(_)
        | LedgerError::FaucetCooldown(_) => StatusCode::CONFLICT,
        LedgerError::BackendUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}
