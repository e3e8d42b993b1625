//! Store traits: the boundary to the external backend
//!
//! The exchange delegates persistence to a hosted backend; these traits are
//! the shape of that collaboration. Every mutating market operation goes
//! through a conditional update keyed on a row version, so concurrent
//! writers surface as a version conflict instead of a lost update.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use predex_core::{
    LedgerResult, Market, MarketStatus, Outcome, Position, PricePoint, ProposalStatus,
    ProposedMarket, TradeRecord, TradeStatus, User,
};
use rust_decimal::Decimal;

/// A market read together with its row version
#[derive(Debug, Clone)]
pub struct MarketSnapshot {
    pub market: Market,
    /// Row version; `apply_delta` calls are conditional on it
    pub version: u64,
}

/// Market rows: versioned reads and conditional share-total updates
#[async_trait]
pub trait MarketStore: Send + Sync {
    /// Read a market with its current row version
    async fn get_market(&self, id: &str) -> LedgerResult<MarketSnapshot>;

    /// List markets, optionally filtered to a single status
    async fn list_markets(&self, status: Option<MarketStatus>) -> LedgerResult<Vec<Market>>;

    /// Insert a new market
    async fn insert_market(&self, market: Market) -> LedgerResult<()>;

    /// Transition a market's status, recording the winning outcome when
    /// resolving
    async fn set_market_status(
        &self,
        id: &str,
        status: MarketStatus,
        resolution_outcome: Option<Outcome>,
    ) -> LedgerResult<()>;

    /// Add `delta_shares` (may be negative) to one outcome's total
    ///
    /// The update only applies if the row version still equals
    /// `expected_version`; otherwise it fails with
    /// [`LedgerError::VersionConflict`](predex_core::LedgerError) and no
    /// state changes. Returns the new row version.
    async fn apply_delta(
        &self,
        id: &str,
        outcome: Outcome,
        delta_shares: Decimal,
        expected_version: u64,
    ) -> LedgerResult<u64>;

    /// YES price samples recorded after each applied delta, oldest first
    async fn price_history(&self, id: &str) -> LedgerResult<Vec<PricePoint>>;
}

/// Position rows keyed by (user, market)
#[async_trait]
pub trait PositionStore: Send + Sync {
    /// Read a position; `None` means the user holds nothing in the market
    async fn get_position(&self, user_id: &str, market_id: &str)
        -> LedgerResult<Option<Position>>;

    /// Insert or update a position
    ///
    /// A position with both share counts at zero removes the row, so a
    /// later `get_position` returns `None` rather than a stale zero record.
    async fn upsert_position(&self, position: Position) -> LedgerResult<()>;

    /// All non-empty positions held by a user
    async fn positions_for_user(&self, user_id: &str) -> LedgerResult<Vec<Position>>;
}

/// Spendable balance per user
#[async_trait]
pub trait BalanceStore: Send + Sync {
    /// Read a user's balance
    async fn get_balance(&self, user_id: &str) -> LedgerResult<Decimal>;

    /// Overwrite a user's balance; negative values are rejected
    async fn set_balance(&self, user_id: &str, new_balance: Decimal) -> LedgerResult<()>;
}

/// Audit trail of trades
///
/// Pricing correctness never depends on this sink; callers log and swallow
/// its failures.
#[async_trait]
pub trait TradeSink: Send + Sync {
    /// Append a trade record
    async fn record_trade(&self, trade: TradeRecord) -> LedgerResult<()>;

    /// Transition a recorded trade's status
    async fn set_trade_status(&self, trade_id: &str, status: TradeStatus) -> LedgerResult<()>;

    /// Trade history for a user, most recent first
    async fn trades_for_user(&self, user_id: &str) -> LedgerResult<Vec<TradeRecord>>;
}

/// User accounts
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Read a user by id
    async fn get_user(&self, id: &str) -> LedgerResult<User>;

    /// Look up a user by wallet address
    async fn get_user_by_wallet(&self, wallet_address: &str) -> LedgerResult<Option<User>>;

    /// Look up a user by referral code
    async fn get_user_by_referral_code(&self, code: &str) -> LedgerResult<Option<User>>;

    /// Insert a new user
    async fn create_user(&self, user: User) -> LedgerResult<User>;

    /// How many users signed up with this user's referral code
    async fn referral_count(&self, user_id: &str) -> LedgerResult<u64>;

    /// Record a successful faucet claim
    async fn set_last_faucet_claim(&self, user_id: &str, at: DateTime<Utc>) -> LedgerResult<()>;
}

/// Governance proposals and votes
#[async_trait]
pub trait ProposalStore: Send + Sync {
    /// Insert a new proposal
    async fn insert_proposal(&self, proposal: ProposedMarket) -> LedgerResult<()>;

    /// Read a proposal by id
    async fn get_proposal(&self, id: &str) -> LedgerResult<ProposedMarket>;

    /// All proposals still awaiting review, newest first
    async fn pending_proposals(&self) -> LedgerResult<Vec<ProposedMarket>>;

    /// Record a weighted vote; a second vote from the same user fails with
    /// [`LedgerError::AlreadyVoted`](predex_core::LedgerError)
    async fn record_vote(
        &self,
        proposal_id: &str,
        user_id: &str,
        choice: Outcome,
        weight: Decimal,
    ) -> LedgerResult<()>;

    /// Transition a proposal's review status
    async fn set_proposal_status(
        &self,
        id: &str,
        status: ProposalStatus,
        admin_notes: Option<String>,
    ) -> LedgerResult<()>;
}
