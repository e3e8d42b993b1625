//! Governance endpoints: proposals, voting, review

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use predex_core::{
    MembershipTier, Outcome, PartnerNfts, ProposalStatus, ProposedMarket, VoterAssets,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error_response;
use crate::routes::markets::MarketResponse;
use crate::AppState;

/// Request to submit a market proposal
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposeRequest {
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
}

/// A proposal row
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalResponse {
    pub id: String,
    pub proposer_id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: ProposalStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_notes: Option<String>,
    pub yes_votes: Decimal,
    pub no_votes: Decimal,
    pub created_at: DateTime<Utc>,
}

impl From<ProposedMarket> for ProposalResponse {
    fn from(proposal: ProposedMarket) -> Self {
        Self {
            id: proposal.id,
            proposer_id: proposal.proposer_id,
            title: proposal.title,
            description: proposal.description,
            status: proposal.status,
            admin_notes: proposal.admin_notes,
            yes_votes: proposal.yes_votes,
            no_votes: proposal.no_votes,
            created_at: proposal.created_at,
        }
    }
}

/// Voter assets backing a vote's weight
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VoterAssetsRequest {
    pub staked_balance: Decimal,
    pub tier: MembershipTier,
    pub standard_nfts: u32,
    pub premium_nfts: u32,
}

impl From<VoterAssetsRequest> for VoterAssets {
    fn from(request: VoterAssetsRequest) -> Self {
        Self {
            staked_balance: request.staked_balance,
            tier: request.tier,
            partner_nfts: PartnerNfts {
                standard: request.standard_nfts,
                premium: request.premium_nfts,
            },
        }
    }
}

/// Request to cast a vote
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub user_id: String,
    pub choice: Outcome,
    #[serde(default)]
    pub assets: VoterAssetsRequest,
}

/// Weight the vote was recorded with
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteResponse {
    pub total_votes: Decimal,
    pub base_votes: Decimal,
    pub multiplier: Decimal,
}

/// Request to approve a proposal into a market
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveRequest {
    pub resolution_date: DateTime<Utc>,
}

/// Request to reject a proposal
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectRequest {
    pub admin_notes: Option<String>,
}

async fn list_proposals(State(state): State<AppState>) -> impl IntoResponse {
    match state.governance.pending_proposals().await {
        Ok(proposals) => {
            let proposals: Vec<ProposalResponse> =
                proposals.into_iter().map(Into::into).collect();
            Json(proposals).into_response()
        }
        Err(e) => error_response(e).into_response(),
    }
}

async fn propose(
    State(state): State<AppState>,
    Json(request): Json<ProposeRequest>,
) -> impl IntoResponse {
    match state
        .governance
        .propose(&request.user_id, &request.title, request.description)
        .await
    {
        Ok(proposal) => (
            StatusCode::CREATED,
            Json(ProposalResponse::from(proposal)),
        )
            .into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

async fn vote(
    State(state): State<AppState>,
    Path(proposal_id): Path<String>,
    Json(request): Json<VoteRequest>,
) -> impl IntoResponse {
    let assets = VoterAssets::from(request.assets);
    match state
        .governance
        .vote(&proposal_id, &request.user_id, request.choice, &assets)
        .await
    {
        Ok(power) => Json(VoteResponse {
            total_votes: power.total_votes,
            base_votes: power.base_votes,
            multiplier: power.multiplier,
        })
        .into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

async fn approve(
    State(state): State<AppState>,
    Path(proposal_id): Path<String>,
    Json(request): Json<ApproveRequest>,
) -> impl IntoResponse {
    match state
        .governance
        .approve(&proposal_id, request.resolution_date)
        .await
    {
        Ok(market) => (StatusCode::CREATED, Json(MarketResponse::from(market))).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

async fn reject(
    State(state): State<AppState>,
    Path(proposal_id): Path<String>,
    Json(request): Json<RejectRequest>,
) -> impl IntoResponse {
    match state
        .governance
        .reject(&proposal_id, request.admin_notes)
        .await
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

/// Create governance routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/governance/proposals", get(list_proposals).post(propose))
        .route("/governance/proposals/{id}/vote", post(vote))
        .route("/governance/proposals/{id}/approve", post(approve))
        .route("/governance/proposals/{id}/reject", post(reject))
}
