//! User account endpoints: connect, balance, faucet, portfolio, referrals

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use predex_core::{Portfolio, User};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error_response;
use crate::AppState;

/// Request to bind a session to a wallet address
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectRequest {
    pub wallet_address: String,
    /// Referral code used at signup, if any
    pub referrer_code: Option<String>,
}

/// User account response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub wallet_address: String,
    pub usdc_balance: Decimal,
    pub referral_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referred_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            wallet_address: user.wallet_address,
            usdc_balance: user.usdc_balance,
            referral_code: user.referral_code,
            referred_by: user.referred_by,
            created_at: user.created_at,
        }
    }
}

/// Request to move USDC in or out of the spendable balance
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub amount: Decimal,
}

/// Balance after a transfer
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResponse {
    pub usdc_balance: Decimal,
}

/// Successful faucet claim
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FaucetResponse {
    pub amount: Decimal,
    pub new_balance: Decimal,
    pub next_claim_at: DateTime<Utc>,
}

/// Referral statistics
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferralStatsResponse {
    pub referral_code: String,
    pub referred_users: u64,
}

async fn connect(
    State(state): State<AppState>,
    Json(request): Json<ConnectRequest>,
) -> impl IntoResponse {
    match state
        .accounts
        .get_or_create_user(&request.wallet_address, request.referrer_code.as_deref())
        .await
    {
        Ok(user) => Json(UserResponse::from(user)).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> impl IntoResponse {
    match state.accounts.get_user(&user_id).await {
        Ok(user) => Json(UserResponse::from(user)).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

async fn get_portfolio(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> impl IntoResponse {
    match state.accounts.portfolio(&user_id).await {
        Ok(portfolio) => Json(PortfolioResponse::from(portfolio)).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

/// Portfolio response with holdings marked to current prices
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioResponse {
    pub holdings: Vec<HoldingResponse>,
    pub usdc_balance: Decimal,
    pub total_value: Decimal,
}

/// One holding row of the portfolio
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldingResponse {
    pub market_id: String,
    pub market_title: String,
    pub yes_shares: Decimal,
    pub no_shares: Decimal,
    pub yes_price: Decimal,
    pub no_price: Decimal,
    pub value: Decimal,
}

impl From<Portfolio> for PortfolioResponse {
    fn from(portfolio: Portfolio) -> Self {
        Self {
            holdings: portfolio
                .holdings
                .into_iter()
                .map(|h| HoldingResponse {
                    market_id: h.market_id,
                    market_title: h.market_title,
                    yes_shares: h.yes_shares,
                    no_shares: h.no_shares,
                    yes_price: h.yes_price,
                    no_price: h.no_price,
                    value: h.value,
                })
                .collect(),
            usdc_balance: portfolio.usdc_balance,
            total_value: portfolio.total_value,
        }
    }
}

async fn deposit(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(request): Json<TransferRequest>,
) -> impl IntoResponse {
    match state.accounts.deposit(&user_id, request.amount).await {
        Ok(balance) => Json(BalanceResponse {
            usdc_balance: balance,
        })
        .into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

async fn withdraw(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(request): Json<TransferRequest>,
) -> impl IntoResponse {
    match state.accounts.withdraw(&user_id, request.amount).await {
        Ok(balance) => Json(BalanceResponse {
            usdc_balance: balance,
        })
        .into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

/// Faucet eligibility and next claim time
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FaucetStatusResponse {
    pub eligible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_claim_at: Option<DateTime<Utc>>,
}

async fn faucet_status(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> impl IntoResponse {
    match state.faucet.eligibility(&user_id).await {
        Ok(next_claim_at) => Json(FaucetStatusResponse {
            eligible: next_claim_at.is_none(),
            next_claim_at,
        })
        .into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

async fn claim_faucet(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> impl IntoResponse {
    match state.faucet.claim(&user_id).await {
        Ok(claim) => Json(FaucetResponse {
            amount: claim.amount,
            new_balance: claim.new_balance,
            next_claim_at: claim.next_claim_at,
        })
        .into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

async fn referral_stats(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> impl IntoResponse {
    let user = match state.accounts.get_user(&user_id).await {
        Ok(user) => user,
        Err(e) => return error_response(e).into_response(),
    };
    match state.accounts.referral_stats(&user_id).await {
        Ok(count) => Json(ReferralStatsResponse {
            referral_code: user.referral_code,
            referred_users: count,
        })
        .into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

/// Create user routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users/connect", post(connect))
        .route("/users/{user_id}", get(get_user))
        .route("/users/{user_id}/portfolio", get(get_portfolio))
        .route("/users/{user_id}/deposit", post(deposit))
        .route("/users/{user_id}/withdraw", post(withdraw))
        .route("/users/{user_id}/faucet", get(faucet_status).post(claim_faucet))
        .route("/users/{user_id}/referrals", get(referral_stats))
}
