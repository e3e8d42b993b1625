//! Market browsing and resolution endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use predex_core::{Market, MarketStatus, Outcome};
use predex_ledger::MarketStore;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error_response;
use crate::AppState;

/// Query parameters for listing markets
#[derive(Debug, Deserialize)]
pub struct ListMarketsQuery {
    /// Filter by status (TRADING, RESOLVED, ... or "all"); defaults to TRADING
    pub status: Option<String>,
}

/// A market with its derived prices
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketResponse {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: MarketStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution_outcome: Option<Outcome>,
    pub yes_price: Decimal,
    pub no_price: Decimal,
    pub total_yes_shares: Decimal,
    pub total_no_shares: Decimal,
    pub total_volume: Decimal,
    pub resolution_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<Market> for MarketResponse {
    fn from(market: Market) -> Self {
        Self {
            yes_price: market.yes_price(),
            no_price: market.no_price(),
            total_volume: market.total_volume(),
            id: market.id,
            title: market.title,
            description: market.description,
            status: market.status,
            resolution_outcome: market.resolution_outcome,
            total_yes_shares: market.total_yes_shares,
            total_no_shares: market.total_no_shares,
            resolution_date: market.resolution_date,
            created_at: market.created_at,
        }
    }
}

/// Response for listing markets
#[derive(Debug, Serialize)]
pub struct MarketsResponse {
    pub markets: Vec<MarketResponse>,
    pub count: usize,
}

/// A price history sample
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricePointResponse {
    pub time: DateTime<Utc>,
    pub yes_price: Decimal,
}

/// Request to resolve a market
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveRequest {
    pub outcome: Outcome,
}

async fn list_markets(
    State(state): State<AppState>,
    Query(query): Query<ListMarketsQuery>,
) -> impl IntoResponse {
    let status = match query.status.as_deref() {
        None => Some(MarketStatus::Trading),
        Some(s) if s.eq_ignore_ascii_case("all") => None,
        Some(s) => match s.parse::<MarketStatus>() {
            Ok(status) => Some(status),
            Err(e) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(super::ErrorResponse { error: e }),
                )
                    .into_response()
            }
        },
    };

    match state.backend.list_markets(status).await {
        Ok(markets) => {
            let markets: Vec<MarketResponse> = markets.into_iter().map(Into::into).collect();
            let count = markets.len();
            Json(MarketsResponse { markets, count }).into_response()
        }
        Err(e) => error_response(e).into_response(),
    }
}

async fn get_market(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.backend.get_market(&id).await {
        Ok(snapshot) => Json(MarketResponse::from(snapshot.market)).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

async fn get_price_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.backend.price_history(&id).await {
        Ok(points) => {
            let points: Vec<PricePointResponse> = points
                .into_iter()
                .map(|p| PricePointResponse {
                    time: p.time,
                    yes_price: p.yes_price,
                })
                .collect();
            Json(points).into_response()
        }
        Err(e) => error_response(e).into_response(),
    }
}

async fn resolve_market(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<ResolveRequest>,
) -> impl IntoResponse {
    match state.governance.resolve(&id, request.outcome).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

async fn begin_resolution(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.governance.begin_resolution(&id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

/// Create market routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/markets", get(list_markets))
        .route("/markets/{id}", get(get_market))
        .route("/markets/{id}/history", get(get_price_history))
        .route("/markets/{id}/resolving", post(begin_resolution))
        .route("/markets/{id}/resolve", post(resolve_market))
}
