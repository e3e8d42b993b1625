//! Governance proposals and voting power

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Review status of a market proposal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProposalStatus {
    Pending,
    Approved,
    Rejected,
}

/// A market proposed by a user, awaiting community vote and admin review
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposedMarket {
    /// Proposal identifier
    pub id: String,

    /// User who submitted the proposal
    pub proposer_id: String,

    /// Proposed market title/question
    pub title: String,

    /// Proposed market description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Review status
    pub status: ProposalStatus,

    /// Notes recorded by the reviewer, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_notes: Option<String>,

    /// Accumulated weighted YES votes
    pub yes_votes: Decimal,

    /// Accumulated weighted NO votes
    pub no_votes: Decimal,

    /// When the proposal was submitted
    pub created_at: DateTime<Utc>,
}

/// Membership NFT tier held by a voter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MembershipTier {
    None,
    Voter,
    Governor,
    Council,
}

impl MembershipTier {
    /// Flat votes granted by the tier itself
    pub fn base_votes(&self) -> Decimal {
        match self {
            MembershipTier::None => Decimal::ZERO,
            MembershipTier::Voter => Decimal::from(10),
            MembershipTier::Governor => Decimal::from(100),
            MembershipTier::Council => Decimal::from(1000),
        }
    }

    /// Multiplier applied to votes from other sources
    pub fn multiplier(&self) -> Decimal {
        match self {
            MembershipTier::None => Decimal::ONE,
            MembershipTier::Voter => Decimal::new(15, 1),
            MembershipTier::Governor => Decimal::from(5),
            MembershipTier::Council => Decimal::from(25),
        }
    }
}

impl Default for MembershipTier {
    fn default() -> Self {
        MembershipTier::None
    }
}

/// Partner NFT holdings that contribute votes
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PartnerNfts {
    /// Standard-collection NFTs, 10 votes each
    pub standard: u32,
    /// Premium-collection NFTs, 100 votes each
    pub premium: u32,
}

/// Everything a voter's weight is derived from
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VoterAssets {
    /// Staked token balance, one vote per unit
    pub staked_balance: Decimal,
    /// Membership tier held
    pub tier: MembershipTier,
    /// Partner NFT holdings
    pub partner_nfts: PartnerNfts,
}

/// Computed voting power breakdown
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VotingPower {
    /// Votes before the tier multiplier (tier base + other sources)
    pub base_votes: Decimal,
    /// Tier multiplier applied to non-tier votes
    pub multiplier: Decimal,
    /// Final weight: other_base * multiplier + tier_base
    pub total_votes: Decimal,
    /// Flat votes from the membership tier
    pub from_tier: Decimal,
    /// Votes from the staked balance
    pub from_staked: Decimal,
    /// Votes from partner NFTs
    pub from_partner_nfts: Decimal,
}

impl VotingPower {
    /// Compute voting power from a voter's assets
    ///
    /// The tier's flat votes are NOT scaled by its own multiplier; only
    /// votes from other sources are.
    pub fn calculate(assets: &VoterAssets) -> Self {
        let from_tier = assets.tier.base_votes();
        let from_staked = assets.staked_balance;
        let from_partner_nfts = Decimal::from(assets.partner_nfts.standard) * Decimal::from(10)
            + Decimal::from(assets.partner_nfts.premium) * Decimal::from(100);

        let other_base = from_staked + from_partner_nfts;
        let multiplier = assets.tier.multiplier();
        let total_votes = other_base * multiplier + from_tier;

        Self {
            base_votes: other_base + from_tier,
            multiplier,
            total_votes,
            from_tier,
            from_staked,
            from_partner_nfts,
        }
    }
}
