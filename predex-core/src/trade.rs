//! Trade records and execution receipts

use crate::market::Outcome;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Side of a trade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeSide {
    Buy,
    Sell,
}

/// Lifecycle status of a trade record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeStatus {
    /// Recorded, awaiting backend acknowledgment
    Pending,
    /// All deltas applied
    Completed,
    /// Rejected or rolled back
    Failed,
}

/// Audit record of an executed (or attempted) trade
///
/// Trade records feed the audit trail and trade history; the correctness of
/// pricing never depends on them being written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeRecord {
    /// Trade identifier
    pub id: String,

    /// Acting user
    pub user_id: String,

    /// Market traded
    pub market_id: String,

    /// Which outcome was traded
    pub outcome: Outcome,

    /// Buy or sell
    pub side: TradeSide,

    /// USDC spent (buy) or received (sell)
    pub amount: Decimal,

    /// Shares bought or sold
    pub shares: Decimal,

    /// Execution price
    pub price: Decimal,

    /// Record status
    pub status: TradeStatus,

    /// When the trade was initiated
    pub created_at: DateTime<Utc>,

    /// Last status transition
    pub updated_at: DateTime<Utc>,
}

/// Result of a buy or sell returned to the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeReceipt {
    /// Identifier of the audit record for this trade
    pub trade_id: String,

    /// Buy or sell
    pub side: TradeSide,

    /// Outcome traded
    pub outcome: Outcome,

    /// USDC spent (buy) or proceeds received (sell)
    pub amount: Decimal,

    /// Shares bought or sold
    pub shares: Decimal,

    /// Execution price
    pub price: Decimal,

    /// User balance after the trade
    pub new_balance: Decimal,
}
