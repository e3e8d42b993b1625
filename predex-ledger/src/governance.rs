//! Governance: market proposals, weighted voting, and resolution

use std::sync::Arc;

use chrono::{DateTime, Utc};
use predex_core::{
    LedgerError, LedgerResult, Market, MarketStatus, Outcome, ProposalStatus, ProposedMarket,
    VoterAssets, VotingPower,
};
use rust_decimal::Decimal;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::store::{MarketStore, ProposalStore, UserStore};

/// Service for the proposal/vote/approve lifecycle
pub struct GovernanceService<S> {
    store: Arc<S>,
}

impl<S> GovernanceService<S>
where
    S: ProposalStore + UserStore + MarketStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Submit a market proposal
    #[instrument(skip(self, description))]
    pub async fn propose(
        &self,
        proposer_id: &str,
        title: &str,
        description: Option<String>,
    ) -> LedgerResult<ProposedMarket> {
        // Proposer must be a real account
        self.store.get_user(proposer_id).await?;

        let proposal = ProposedMarket {
            id: Uuid::new_v4().to_string(),
            proposer_id: proposer_id.to_string(),
            title: title.to_string(),
            description,
            status: ProposalStatus::Pending,
            admin_notes: None,
            yes_votes: Decimal::ZERO,
            no_votes: Decimal::ZERO,
            created_at: Utc::now(),
        };
        self.store.insert_proposal(proposal.clone()).await?;
        info!(proposal = %proposal.id, "market proposed");
        Ok(proposal)
    }

    /// All proposals awaiting review
    pub async fn pending_proposals(&self) -> LedgerResult<Vec<ProposedMarket>> {
        self.store.pending_proposals().await
    }

    /// Cast a weighted YES/NO vote on a pending proposal
    ///
    /// The weight derives from the voter's assets; one vote per user per
    /// proposal.
    #[instrument(skip(self, assets))]
    pub async fn vote(
        &self,
        proposal_id: &str,
        user_id: &str,
        choice: Outcome,
        assets: &VoterAssets,
    ) -> LedgerResult<VotingPower> {
        self.store.get_user(user_id).await?;
        let proposal = self.store.get_proposal(proposal_id).await?;
        if proposal.status != ProposalStatus::Pending {
            // Voting closes with the review
            return Err(LedgerError::proposal_not_found(proposal_id));
        }

        let power = VotingPower::calculate(assets);
        self.store
            .record_vote(proposal_id, user_id, choice, power.total_votes)
            .await?;
        Ok(power)
    }

    /// Approve a pending proposal, opening it as a tradeable market
    ///
    /// The new market starts with zero share totals, so its first trade
    /// executes at the 0.5 no-liquidity price.
    #[instrument(skip(self))]
    pub async fn approve(
        &self,
        proposal_id: &str,
        resolution_date: DateTime<Utc>,
    ) -> LedgerResult<Market> {
        let proposal = self.store.get_proposal(proposal_id).await?;
        if proposal.status != ProposalStatus::Pending {
            return Err(LedgerError::proposal_not_found(proposal_id));
        }

        self.store
            .set_proposal_status(proposal_id, ProposalStatus::Approved, None)
            .await?;

        let market = Market {
            id: proposal.id.clone(),
            title: proposal.title.clone(),
            description: proposal.description.clone(),
            status: MarketStatus::Trading,
            resolution_outcome: None,
            total_yes_shares: Decimal::ZERO,
            total_no_shares: Decimal::ZERO,
            resolution_date,
            created_at: Utc::now(),
        };
        if let Err(e) = self.store.insert_market(market.clone()).await {
            // Reopen the proposal rather than stranding it approved with no market
            let _ = self
                .store
                .set_proposal_status(proposal_id, ProposalStatus::Pending, None)
                .await;
            return Err(e);
        }

        info!(market = %market.id, "proposal approved, market open");
        Ok(market)
    }

    /// Reject a pending proposal, optionally recording reviewer notes
    #[instrument(skip(self, admin_notes))]
    pub async fn reject(
        &self,
        proposal_id: &str,
        admin_notes: Option<String>,
    ) -> LedgerResult<()> {
        let proposal = self.store.get_proposal(proposal_id).await?;
        if proposal.status != ProposalStatus::Pending {
            return Err(LedgerError::proposal_not_found(proposal_id));
        }
        self.store
            .set_proposal_status(proposal_id, ProposalStatus::Rejected, admin_notes)
            .await
    }

    /// Freeze trading while a market's outcome is being verified
    #[instrument(skip(self))]
    pub async fn begin_resolution(&self, market_id: &str) -> LedgerResult<()> {
        let snapshot = self.store.get_market(market_id).await?;
        if snapshot.market.status != MarketStatus::Trading {
            return Err(LedgerError::MarketClosed(market_id.to_string()));
        }
        self.store
            .set_market_status(market_id, MarketStatus::Resolving, None)
            .await
    }

    /// Record a market's final outcome
    ///
    /// Share redemption is out of scope; resolution only freezes the
    /// market and records the winner.
    #[instrument(skip(self))]
    pub async fn resolve(&self, market_id: &str, outcome: Outcome) -> LedgerResult<()> {
        let snapshot = self.store.get_market(market_id).await?;
        match snapshot.market.status {
            MarketStatus::Trading | MarketStatus::Resolving => {
                self.store
                    .set_market_status(market_id, MarketStatus::Resolved, Some(outcome))
                    .await
            }
            _ => Err(LedgerError::MarketClosed(market_id.to_string())),
        }
    }
}
