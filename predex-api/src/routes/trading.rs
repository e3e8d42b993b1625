//! Trade execution endpoints

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use predex_core::{Outcome, TradeReceipt, TradeSide, TradeStatus};
use predex_ledger::{PositionStore, TradeSink};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error_response;
use crate::AppState;

/// Request to buy shares with a USDC amount
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyRequest {
    pub user_id: String,
    pub market_id: String,
    pub outcome: Outcome,
    /// USDC to spend
    pub amount: Decimal,
}

/// Request to sell a share count
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SellRequest {
    pub user_id: String,
    pub market_id: String,
    pub outcome: Outcome,
    /// Shares to sell
    pub shares: Decimal,
}

/// Executed trade response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeResponse {
    pub trade_id: String,
    pub side: TradeSide,
    pub outcome: Outcome,
    pub amount: Decimal,
    pub shares: Decimal,
    pub price: Decimal,
    pub new_balance: Decimal,
}

impl From<TradeReceipt> for TradeResponse {
    fn from(receipt: TradeReceipt) -> Self {
        Self {
            trade_id: receipt.trade_id,
            side: receipt.side,
            outcome: receipt.outcome,
            amount: receipt.amount,
            shares: receipt.shares,
            price: receipt.price,
            new_balance: receipt.new_balance,
        }
    }
}

/// A position row
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionResponse {
    pub market_id: String,
    pub yes_shares: Decimal,
    pub no_shares: Decimal,
}

/// A trade history row
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeHistoryResponse {
    pub id: String,
    pub market_id: String,
    pub outcome: Outcome,
    pub side: TradeSide,
    pub amount: Decimal,
    pub shares: Decimal,
    pub price: Decimal,
    pub status: TradeStatus,
    pub created_at: DateTime<Utc>,
}

async fn buy(
    State(state): State<AppState>,
    Json(request): Json<BuyRequest>,
) -> impl IntoResponse {
    match state
        .ledger
        .buy(
            &request.user_id,
            &request.market_id,
            request.outcome,
            request.amount,
        )
        .await
    {
        Ok(receipt) => Json(TradeResponse::from(receipt)).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

async fn sell(
    State(state): State<AppState>,
    Json(request): Json<SellRequest>,
) -> impl IntoResponse {
    match state
        .ledger
        .sell(
            &request.user_id,
            &request.market_id,
            request.outcome,
            request.shares,
        )
        .await
    {
        Ok(receipt) => Json(TradeResponse::from(receipt)).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

async fn get_positions(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> impl IntoResponse {
    match state.backend.positions_for_user(&user_id).await {
        Ok(positions) => {
            let positions: Vec<PositionResponse> = positions
                .into_iter()
                .map(|p| PositionResponse {
                    market_id: p.market_id,
                    yes_shares: p.yes_shares,
                    no_shares: p.no_shares,
                })
                .collect();
            Json(positions).into_response()
        }
        Err(e) => error_response(e).into_response(),
    }
}

async fn get_trades(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> impl IntoResponse {
    match state.backend.trades_for_user(&user_id).await {
        Ok(trades) => {
            let trades: Vec<TradeHistoryResponse> = trades
                .into_iter()
                .map(|t| TradeHistoryResponse {
                    id: t.id,
                    market_id: t.market_id,
                    outcome: t.outcome,
                    side: t.side,
                    amount: t.amount,
                    shares: t.shares,
                    price: t.price,
                    status: t.status,
                    created_at: t.created_at,
                })
                .collect();
            Json(trades).into_response()
        }
        Err(e) => error_response(e).into_response(),
    }
}

/// Create trading routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/trade/buy", post(buy))
        .route("/trade/sell", post(sell))
        .route("/users/{user_id}/positions", get(get_positions))
        .route("/users/{user_id}/trades", get(get_trades))
}
