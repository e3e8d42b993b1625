//! In-memory store backend
//!
//! Market rows carry a version that every `apply_delta` both checks and
//! bumps, inside the map entry's exclusive guard, so share-total updates
//! are atomic read-modify-writes. Position rows are pruned when both
//! share counts reach zero.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use predex_core::{
    LedgerError, LedgerResult, Market, MarketStatus, Outcome, Position, PricePoint,
    ProposalStatus, ProposedMarket, TradeRecord, TradeStatus, User,
};
use predex_ledger::{
    BalanceStore, MarketSnapshot, MarketStore, PositionStore, ProposalStore, TradeSink, UserStore,
};
use rust_decimal::Decimal;
use tracing::debug;

/// A market row with its version counter
#[derive(Debug, Clone)]
struct VersionedMarket {
    market: Market,
    version: u64,
}

/// Concurrent in-memory backend implementing every store trait
#[derive(Default)]
pub struct MemoryBackend {
    users: DashMap<String, User>,
    markets: DashMap<String, VersionedMarket>,
    positions: DashMap<(String, String), Position>,
    trades: DashMap<String, TradeRecord>,
    proposals: DashMap<String, ProposedMarket>,
    /// (proposal, voter) -> (choice, weight); the key enforces one vote per user
    votes: DashMap<(String, String), (Outcome, Decimal)>,
    price_history: DashMap<String, Vec<PricePoint>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MarketStore for MemoryBackend {
    async fn get_market(&self, id: &str) -> LedgerResult<MarketSnapshot> {
        self.markets
            .get(id)
            .map(|row| MarketSnapshot {
                market: row.market.clone(),
                version: row.version,
            })
            .ok_or_else(|| LedgerError::market_not_found(id))
    }

    async fn list_markets(&self, status: Option<MarketStatus>) -> LedgerResult<Vec<Market>> {
        let mut markets: Vec<Market> = self
            .markets
            .iter()
            .map(|row| row.market.clone())
            .filter(|m| status.map_or(true, |s| m.status == s))
            .collect();
        markets.sort_by_key(|m| m.resolution_date);
        Ok(markets)
    }

    async fn insert_market(&self, market: Market) -> LedgerResult<()> {
        match self.markets.entry(market.id.clone()) {
            Entry::Occupied(_) => Err(LedgerError::backend(format!(
                "market {} already exists",
                market.id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(VersionedMarket { market, version: 0 });
                Ok(())
            }
        }
    }

    async fn set_market_status(
        &self,
        id: &str,
        status: MarketStatus,
        resolution_outcome: Option<Outcome>,
    ) -> LedgerResult<()> {
        let mut row = self
            .markets
            .get_mut(id)
            .ok_or_else(|| LedgerError::market_not_found(id))?;
        row.market.status = status;
        if resolution_outcome.is_some() {
            row.market.resolution_outcome = resolution_outcome;
        }
        // Any row change invalidates outstanding snapshots
        row.version += 1;
        Ok(())
    }

    async fn apply_delta(
        &self,
        id: &str,
        outcome: Outcome,
        delta_shares: Decimal,
        expected_version: u64,
    ) -> LedgerResult<u64> {
        let (version, point) = {
            let mut row = self
                .markets
                .get_mut(id)
                .ok_or_else(|| LedgerError::market_not_found(id))?;
            if row.version != expected_version {
                return Err(LedgerError::VersionConflict {
                    id: id.to_string(),
                    expected: expected_version,
                    actual: row.version,
                });
            }

            let next = row.market.total(outcome) + delta_shares;
            if next < Decimal::ZERO {
                return Err(LedgerError::backend(format!(
                    "share total for market {} would go negative",
                    id
                )));
            }
            match outcome {
                Outcome::Yes => row.market.total_yes_shares = next,
                Outcome::No => row.market.total_no_shares = next,
            }
            row.version += 1;
            debug!(market = %id, %delta_shares, version = row.version, "applied share delta");

            (
                row.version,
                PricePoint {
                    time: Utc::now(),
                    yes_price: row.market.yes_price(),
                },
            )
        };

        self.price_history.entry(id.to_string()).or_default().push(point);
        Ok(version)
    }

    async fn price_history(&self, id: &str) -> LedgerResult<Vec<PricePoint>> {
        if !self.markets.contains_key(id) {
            return Err(LedgerError::market_not_found(id));
        }
        Ok(self
            .price_history
            .get(id)
            .map(|points| points.clone())
            .unwrap_or_default())
    }
}

#[async_trait]
impl PositionStore for MemoryBackend {
    async fn get_position(
        &self,
        user_id: &str,
        market_id: &str,
    ) -> LedgerResult<Option<Position>> {
        Ok(self
            .positions
            .get(&(user_id.to_string(), market_id.to_string()))
            .map(|p| p.clone()))
    }

    async fn upsert_position(&self, position: Position) -> LedgerResult<()> {
        let key = (position.user_id.clone(), position.market_id.clone());
        if position.is_empty() {
            self.positions.remove(&key);
        } else {
            self.positions.insert(key, position);
        }
        Ok(())
    }

    async fn positions_for_user(&self, user_id: &str) -> LedgerResult<Vec<Position>> {
        Ok(self
            .positions
            .iter()
            .filter(|entry| entry.key().0 == user_id)
            .map(|entry| entry.value().clone())
            .collect())
    }
}

#[async_trait]
impl BalanceStore for MemoryBackend {
    async fn get_balance(&self, user_id: &str) -> LedgerResult<Decimal> {
        self.users
            .get(user_id)
            .map(|u| u.usdc_balance)
            .ok_or_else(|| LedgerError::user_not_found(user_id))
    }

    async fn set_balance(&self, user_id: &str, new_balance: Decimal) -> LedgerResult<()> {
        if new_balance < Decimal::ZERO {
            return Err(LedgerError::backend(format!(
                "negative balance rejected for user {}",
                user_id
            )));
        }
        let mut user = self
            .users
            .get_mut(user_id)
            .ok_or_else(|| LedgerError::user_not_found(user_id))?;
        user.usdc_balance = new_balance;
        Ok(())
    }
}

#[async_trait]
impl TradeSink for MemoryBackend {
    async fn record_trade(&self, trade: TradeRecord) -> LedgerResult<()> {
        self.trades.insert(trade.id.clone(), trade);
        Ok(())
    }

    async fn set_trade_status(&self, trade_id: &str, status: TradeStatus) -> LedgerResult<()> {
        let mut trade = self.trades.get_mut(trade_id).ok_or_else(|| {
            LedgerError::backend(format!("trade {} not recorded", trade_id))
        })?;
        trade.status = status;
        trade.updated_at = Utc::now();
        Ok(())
    }

    async fn trades_for_user(&self, user_id: &str) -> LedgerResult<Vec<TradeRecord>> {
        let mut trades: Vec<TradeRecord> = self
            .trades
            .iter()
            .filter(|entry| entry.user_id == user_id)
            .map(|entry| entry.value().clone())
            .collect();
        trades.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(trades)
    }
}

#[async_trait]
impl UserStore for MemoryBackend {
    async fn get_user(&self, id: &str) -> LedgerResult<User> {
        self.users
            .get(id)
            .map(|u| u.clone())
            .ok_or_else(|| LedgerError::user_not_found(id))
    }

    async fn get_user_by_wallet(&self, wallet_address: &str) -> LedgerResult<Option<User>> {
        Ok(self
            .users
            .iter()
            .find(|entry| entry.wallet_address == wallet_address)
            .map(|entry| entry.value().clone()))
    }

    async fn get_user_by_referral_code(&self, code: &str) -> LedgerResult<Option<User>> {
        Ok(self
            .users
            .iter()
            .find(|entry| entry.referral_code == code)
            .map(|entry| entry.value().clone()))
    }

    async fn create_user(&self, user: User) -> LedgerResult<User> {
        match self.users.entry(user.id.clone()) {
            Entry::Occupied(_) => Err(LedgerError::backend(format!(
                "user {} already exists",
                user.id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(user.clone());
                Ok(user)
            }
        }
    }

    async fn referral_count(&self, user_id: &str) -> LedgerResult<u64> {
        Ok(self
            .users
            .iter()
            .filter(|entry| entry.referred_by.as_deref() == Some(user_id))
            .count() as u64)
    }

    async fn set_last_faucet_claim(&self, user_id: &str, at: DateTime<Utc>) -> LedgerResult<()> {
        let mut user = self
            .users
            .get_mut(user_id)
            .ok_or_else(|| LedgerError::user_not_found(user_id))?;
        user.last_faucet_claim = Some(at);
        Ok(())
    }
}

#[async_trait]
impl ProposalStore for MemoryBackend {
    async fn insert_proposal(&self, proposal: ProposedMarket) -> LedgerResult<()> {
        self.proposals.insert(proposal.id.clone(), proposal);
        Ok(())
    }

    async fn get_proposal(&self, id: &str) -> LedgerResult<ProposedMarket> {
        self.proposals
            .get(id)
            .map(|p| p.clone())
            .ok_or_else(|| LedgerError::proposal_not_found(id))
    }

    async fn pending_proposals(&self) -> LedgerResult<Vec<ProposedMarket>> {
        let mut pending: Vec<ProposedMarket> = self
            .proposals
            .iter()
            .filter(|entry| entry.status == ProposalStatus::Pending)
            .map(|entry| entry.value().clone())
            .collect();
        pending.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(pending)
    }

    async fn record_vote(
        &self,
        proposal_id: &str,
        user_id: &str,
        choice: Outcome,
        weight: Decimal,
    ) -> LedgerResult<()> {
        if !self.proposals.contains_key(proposal_id) {
            return Err(LedgerError::proposal_not_found(proposal_id));
        }

        match self
            .votes
            .entry((proposal_id.to_string(), user_id.to_string()))
        {
            Entry::Occupied(_) => {
                return Err(LedgerError::AlreadyVoted(proposal_id.to_string()))
            }
            Entry::Vacant(slot) => {
                slot.insert((choice, weight));
            }
        }

        let mut proposal = self
            .proposals
            .get_mut(proposal_id)
            .ok_or_else(|| LedgerError::proposal_not_found(proposal_id))?;
        match choice {
            Outcome::Yes => proposal.yes_votes += weight,
            Outcome::No => proposal.no_votes += weight,
        }
        Ok(())
    }

    async fn set_proposal_status(
        &self,
        id: &str,
        status: ProposalStatus,
        admin_notes: Option<String>,
    ) -> LedgerResult<()> {
        let mut proposal = self
            .proposals
            .get_mut(id)
            .ok_or_else(|| LedgerError::proposal_not_found(id))?;
        proposal.status = status;
        if admin_notes.is_some() {
            proposal.admin_notes = admin_notes;
        }
        Ok(())
    }
}
