//! Trading ledger: outcome pricing and position accounting
//!
//! Executes buy/sell operations that keep market share totals, the acting
//! user's position, and the user's balance mutually consistent. All
//! preconditions are checked before any mutation; once deltas start
//! applying, a backend rejection triggers the exact inverse of every delta
//! already applied, so a call either lands completely or not at all.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use predex_core::{
    quantize_shares, quantize_usdc, LedgerError, LedgerResult, Outcome, Position, TradeReceipt,
    TradeRecord, TradeSide, TradeStatus,
};
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tracing::{debug, error, instrument, warn};
use uuid::Uuid;

use crate::store::{BalanceStore, MarketStore, PositionStore, TradeSink};

/// Floor for the price a buy executes at
///
/// A one-sided market prices the empty side at zero; dividing the spend by
/// that would mint unbounded shares. Clamping to one cent keeps the math
/// finite without disturbing any priced side above it.
pub const MIN_EXECUTION_PRICE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// The pricing ledger
///
/// Mutations on a given market are serialized through a per-market lock
/// held for the whole read-modify-write, and the share-total update itself
/// is conditional on the market's row version. No cross-market or global
/// locking.
pub struct TradingLedger<S> {
    store: Arc<S>,
    market_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl<S> TradingLedger<S>
where
    S: MarketStore + PositionStore + BalanceStore + TradeSink,
{
    /// Create a ledger over a backend
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            market_locks: DashMap::new(),
        }
    }

    fn market_lock(&self, market_id: &str) -> Arc<Mutex<()>> {
        self.market_locks
            .entry(market_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Current price of an outcome, derived from share totals
    ///
    /// Pure read; no side effects.
    pub async fn price(&self, market_id: &str, outcome: Outcome) -> LedgerResult<Decimal> {
        let snapshot = self.store.get_market(market_id).await?;
        Ok(snapshot.market.price(outcome))
    }

    /// Buy `amount` USDC worth of `outcome` shares
    ///
    /// Fails with `InvalidAmount`, `InsufficientBalance`, `MarketNotFound`,
    /// `UserNotFound`, or `MarketClosed` before touching any state. Returns
    /// the executed price and share count.
    #[instrument(skip(self))]
    pub async fn buy(
        &self,
        user_id: &str,
        market_id: &str,
        outcome: Outcome,
        amount: Decimal,
    ) -> LedgerResult<TradeReceipt> {
        let amount = quantize_usdc(amount);
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(amount));
        }

        let lock = self.market_lock(market_id);
        let _guard = lock.lock().await;

        let balance = self.store.get_balance(user_id).await?;
        if amount > balance {
            return Err(LedgerError::InsufficientBalance {
                required: amount,
                available: balance,
            });
        }

        let snapshot = self.store.get_market(market_id).await?;
        if !snapshot.market.is_tradeable() {
            return Err(LedgerError::MarketClosed(market_id.to_string()));
        }
        let prior_position = self.store.get_position(user_id, market_id).await?;

        let price = snapshot.market.price(outcome).max(MIN_EXECUTION_PRICE);
        let shares = quantize_shares(amount / price);
        debug!(%amount, %price, %shares, "executing buy");

        let trade_id = Uuid::new_v4().to_string();
        self.audit_trade(&trade_id, user_id, market_id, outcome, TradeSide::Buy, amount, shares, price)
            .await;

        // Apply deltas: balance, then position, then market totals. Each
        // failure unwinds what came before it.
        let new_balance = quantize_usdc(balance - amount);
        if let Err(e) = self.store.set_balance(user_id, new_balance).await {
            self.finish_trade(&trade_id, TradeStatus::Failed).await;
            return Err(e);
        }

        let mut position = prior_position
            .clone()
            .unwrap_or_else(|| Position::new(user_id, market_id));
        position.set_shares(outcome, quantize_shares(position.shares(outcome) + shares));
        if let Err(e) = self.store.upsert_position(position).await {
            self.restore_balance(user_id, balance).await;
            self.finish_trade(&trade_id, TradeStatus::Failed).await;
            return Err(e);
        }

        if let Err(e) = self
            .store
            .apply_delta(market_id, outcome, shares, snapshot.version)
            .await
        {
            self.restore_position(user_id, market_id, prior_position).await;
            self.restore_balance(user_id, balance).await;
            self.finish_trade(&trade_id, TradeStatus::Failed).await;
            return Err(e);
        }

        self.finish_trade(&trade_id, TradeStatus::Completed).await;

        Ok(TradeReceipt {
            trade_id,
            side: TradeSide::Buy,
            outcome,
            amount,
            shares,
            price,
            new_balance,
        })
    }

    /// Sell `shares` of `outcome` back to the market
    ///
    /// Price is computed from totals before the sell applies. Fails with
    /// `InvalidAmount`, `NoPosition`, `InsufficientShares`,
    /// `MarketNotFound`, `UserNotFound`, or `MarketClosed` before touching
    /// any state. Returns the proceeds and the executed price.
    #[instrument(skip(self))]
    pub async fn sell(
        &self,
        user_id: &str,
        market_id: &str,
        outcome: Outcome,
        shares: Decimal,
    ) -> LedgerResult<TradeReceipt> {
        let shares = quantize_shares(shares);
        if shares <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(shares));
        }

        let lock = self.market_lock(market_id);
        let _guard = lock.lock().await;

        let balance = self.store.get_balance(user_id).await?;

        let prior_position = self
            .store
            .get_position(user_id, market_id)
            .await?
            .ok_or_else(|| LedgerError::NoPosition(market_id.to_string()))?;
        let available = prior_position.shares(outcome);
        if shares > available {
            return Err(LedgerError::InsufficientShares {
                requested: shares,
                available,
            });
        }

        let snapshot = self.store.get_market(market_id).await?;
        if !snapshot.market.is_tradeable() {
            return Err(LedgerError::MarketClosed(market_id.to_string()));
        }

        let price = snapshot.market.price(outcome);
        let proceeds = quantize_usdc(shares * price);
        debug!(%shares, %price, %proceeds, "executing sell");

        let trade_id = Uuid::new_v4().to_string();
        self.audit_trade(&trade_id, user_id, market_id, outcome, TradeSide::Sell, proceeds, shares, price)
            .await;

        let mut position = prior_position.clone();
        position.set_shares(outcome, quantize_shares(available - shares));
        if let Err(e) = self.store.upsert_position(position).await {
            self.finish_trade(&trade_id, TradeStatus::Failed).await;
            return Err(e);
        }

        let new_version = match self
            .store
            .apply_delta(market_id, outcome, -shares, snapshot.version)
            .await
        {
            Ok(v) => v,
            Err(e) => {
                self.restore_position(user_id, market_id, Some(prior_position)).await;
                self.finish_trade(&trade_id, TradeStatus::Failed).await;
                return Err(e);
            }
        };

        let new_balance = quantize_usdc(balance + proceeds);
        if let Err(e) = self.store.set_balance(user_id, new_balance).await {
            if let Err(undo) = self
                .store
                .apply_delta(market_id, outcome, shares, new_version)
                .await
            {
                error!(market = %market_id, error = %undo, "failed to undo market delta during rollback");
            }
            self.restore_position(user_id, market_id, Some(prior_position)).await;
            self.finish_trade(&trade_id, TradeStatus::Failed).await;
            return Err(e);
        }

        self.finish_trade(&trade_id, TradeStatus::Completed).await;

        Ok(TradeReceipt {
            trade_id,
            side: TradeSide::Sell,
            outcome,
            amount: proceeds,
            shares,
            price,
            new_balance,
        })
    }

    /// Append a PENDING audit record; sink failures never fail the trade
    #[allow(clippy::too_many_arguments)]
    async fn audit_trade(
        &self,
        trade_id: &str,
        user_id: &str,
        market_id: &str,
        outcome: Outcome,
        side: TradeSide,
        amount: Decimal,
        shares: Decimal,
        price: Decimal,
    ) {
        let now = Utc::now();
        let record = TradeRecord {
            id: trade_id.to_string(),
            user_id: user_id.to_string(),
            market_id: market_id.to_string(),
            outcome,
            side,
            amount,
            shares,
            price,
            status: TradeStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        if let Err(e) = self.store.record_trade(record).await {
            warn!(trade = %trade_id, error = %e, "failed to record trade");
        }
    }

    async fn finish_trade(&self, trade_id: &str, status: TradeStatus) {
        if let Err(e) = self.store.set_trade_status(trade_id, status).await {
            warn!(trade = %trade_id, error = %e, "failed to update trade status");
        }
    }

    async fn restore_balance(&self, user_id: &str, balance: Decimal) {
        if let Err(e) = self.store.set_balance(user_id, balance).await {
            error!(user = %user_id, error = %e, "failed to restore balance during rollback");
        }
    }

    async fn restore_position(
        &self,
        user_id: &str,
        market_id: &str,
        prior: Option<Position>,
    ) {
        let position = prior.unwrap_or_else(|| Position::new(user_id, market_id));
        if let Err(e) = self.store.upsert_position(position).await {
            error!(user = %user_id, market = %market_id, error = %e, "failed to restore position during rollback");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MarketSnapshot;
    use async_trait::async_trait;
    use chrono::Utc;
    use predex_core::{Market, MarketStatus};
    use rust_decimal_macros::dec;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex as StdMutex;

    /// Minimal backend with a switch to reject market-delta writes,
    /// for exercising the compensation path.
    #[derive(Default)]
    struct FlakyStore {
        market: StdMutex<Option<(Market, u64)>>,
        positions: StdMutex<HashMap<(String, String), Position>>,
        balances: StdMutex<HashMap<String, Decimal>>,
        trades: StdMutex<HashMap<String, TradeRecord>>,
        reject_deltas: AtomicBool,
    }

    #[async_trait]
    impl crate::store::MarketStore for FlakyStore {
        async fn get_market(&self, id: &str) -> predex_core::LedgerResult<MarketSnapshot> {
            self.market
                .lock()
                .unwrap()
                .clone()
                .map(|(market, version)| MarketSnapshot { market, version })
                .ok_or_else(|| LedgerError::market_not_found(id))
        }

        async fn list_markets(
            &self,
            _status: Option<MarketStatus>,
        ) -> predex_core::LedgerResult<Vec<Market>> {
            unimplemented!()
        }

        async fn insert_market(&self, market: Market) -> predex_core::LedgerResult<()> {
            *self.market.lock().unwrap() = Some((market, 0));
            Ok(())
        }

        async fn set_market_status(
            &self,
            _id: &str,
            _status: MarketStatus,
            _resolution_outcome: Option<Outcome>,
        ) -> predex_core::LedgerResult<()> {
            unimplemented!()
        }

        async fn apply_delta(
            &self,
            _id: &str,
            outcome: Outcome,
            delta_shares: Decimal,
            _expected_version: u64,
        ) -> predex_core::LedgerResult<u64> {
            if self.reject_deltas.load(Ordering::SeqCst) {
                return Err(LedgerError::backend("injected failure"));
            }
            let mut guard = self.market.lock().unwrap();
            let (market, version) = guard.as_mut().unwrap();
            match outcome {
                Outcome::Yes => market.total_yes_shares += delta_shares,
                Outcome::No => market.total_no_shares += delta_shares,
            }
            *version += 1;
            Ok(*version)
        }

        async fn price_history(
            &self,
            _id: &str,
        ) -> predex_core::LedgerResult<Vec<predex_core::PricePoint>> {
            unimplemented!()
        }
    }

    #[async_trait]
    impl crate::store::PositionStore for FlakyStore {
        async fn get_position(
            &self,
            user_id: &str,
            market_id: &str,
        ) -> predex_core::LedgerResult<Option<Position>> {
            Ok(self
                .positions
                .lock()
                .unwrap()
                .get(&(user_id.to_string(), market_id.to_string()))
                .cloned())
        }

        async fn upsert_position(&self, position: Position) -> predex_core::LedgerResult<()> {
            let key = (position.user_id.clone(), position.market_id.clone());
            let mut positions = self.positions.lock().unwrap();
            if position.is_empty() {
                positions.remove(&key);
            } else {
                positions.insert(key, position);
            }
            Ok(())
        }

        async fn positions_for_user(
            &self,
            _user_id: &str,
        ) -> predex_core::LedgerResult<Vec<Position>> {
            unimplemented!()
        }
    }

    #[async_trait]
    impl crate::store::BalanceStore for FlakyStore {
        async fn get_balance(&self, user_id: &str) -> predex_core::LedgerResult<Decimal> {
            self.balances
                .lock()
                .unwrap()
                .get(user_id)
                .copied()
                .ok_or_else(|| LedgerError::user_not_found(user_id))
        }

        async fn set_balance(
            &self,
            user_id: &str,
            new_balance: Decimal,
        ) -> predex_core::LedgerResult<()> {
            self.balances
                .lock()
                .unwrap()
                .insert(user_id.to_string(), new_balance);
            Ok(())
        }
    }

    #[async_trait]
    impl crate::store::TradeSink for FlakyStore {
        async fn record_trade(&self, trade: TradeRecord) -> predex_core::LedgerResult<()> {
            self.trades.lock().unwrap().insert(trade.id.clone(), trade);
            Ok(())
        }

        async fn set_trade_status(
            &self,
            trade_id: &str,
            status: TradeStatus,
        ) -> predex_core::LedgerResult<()> {
            if let Some(trade) = self.trades.lock().unwrap().get_mut(trade_id) {
                trade.status = status;
            }
            Ok(())
        }

        async fn trades_for_user(
            &self,
            _user_id: &str,
        ) -> predex_core::LedgerResult<Vec<TradeRecord>> {
            unimplemented!()
        }
    }

    fn seeded_store(balance: Decimal) -> Arc<FlakyStore> {
        let store = Arc::new(FlakyStore::default());
        *store.market.lock().unwrap() = Some((
            Market {
                id: "m1".to_string(),
                title: "Test".to_string(),
                description: None,
                status: MarketStatus::Trading,
                resolution_outcome: None,
                total_yes_shares: dec!(100),
                total_no_shares: dec!(100),
                resolution_date: Utc::now(),
                created_at: Utc::now(),
            },
            0,
        ));
        store
            .balances
            .lock()
            .unwrap()
            .insert("u1".to_string(), balance);
        store
    }

    #[tokio::test]
    async fn test_buy_rolls_back_on_backend_rejection() {
        let store = seeded_store(dec!(100));
        store.reject_deltas.store(true, Ordering::SeqCst);
        let ledger = TradingLedger::new(Arc::clone(&store));

        let err = ledger.buy("u1", "m1", Outcome::Yes, dec!(50)).await.unwrap_err();
        assert!(matches!(err, LedgerError::BackendUnavailable(_)));

        // Balance and position restored to their pre-trade values
        assert_eq!(*store.balances.lock().unwrap().get("u1").unwrap(), dec!(100));
        assert!(store.positions.lock().unwrap().is_empty());

        // The audit record reflects the failure
        let trades = store.trades.lock().unwrap();
        assert_eq!(trades.len(), 1);
        assert!(trades
            .values()
            .all(|t| t.status == TradeStatus::Failed));
    }

    #[tokio::test]
    async fn test_sell_rolls_back_on_backend_rejection() {
        let store = seeded_store(dec!(0));
        store
            .positions
            .lock()
            .unwrap()
            .insert(("u1".to_string(), "m1".to_string()), {
                let mut p = Position::new("u1", "m1");
                p.yes_shares = dec!(40);
                p
            });
        store.reject_deltas.store(true, Ordering::SeqCst);
        let ledger = TradingLedger::new(Arc::clone(&store));

        let err = ledger.sell("u1", "m1", Outcome::Yes, dec!(40)).await.unwrap_err();
        assert!(matches!(err, LedgerError::BackendUnavailable(_)));

        let positions = store.positions.lock().unwrap();
        let position = positions
            .get(&("u1".to_string(), "m1".to_string()))
            .unwrap();
        assert_eq!(position.yes_shares, dec!(40));
        assert_eq!(*store.balances.lock().unwrap().get("u1").unwrap(), dec!(0));
    }

    #[tokio::test]
    async fn test_buy_happy_path_applies_all_deltas() {
        let store = seeded_store(dec!(100));
        let ledger = TradingLedger::new(Arc::clone(&store));

        let receipt = ledger.buy("u1", "m1", Outcome::Yes, dec!(50)).await.unwrap();
        assert_eq!(receipt.price, dec!(0.5));
        assert_eq!(receipt.shares, dec!(100));

        let guard = store.market.lock().unwrap();
        let (market, version) = guard.as_ref().unwrap();
        assert_eq!(market.total_yes_shares, dec!(200));
        assert_eq!(*version, 1);
    }
}
