//! Market data structures and outcome pricing

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One of the two sides of a binary prediction market
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Outcome {
    Yes,
    No,
}

impl Outcome {
    /// The opposite side
    pub fn other(&self) -> Self {
        match self {
            Outcome::Yes => Outcome::No,
            Outcome::No => Outcome::Yes,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Yes => "YES",
            Outcome::No => "NO",
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Outcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "YES" => Ok(Outcome::Yes),
            "NO" => Ok(Outcome::No),
            _ => Err(format!("Unknown outcome: {}", s)),
        }
    }
}

/// Lifecycle status of a market
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MarketStatus {
    /// Proposed through governance, not yet tradeable
    Proposed,
    /// Open for trading
    Trading,
    /// Trading frozen while the resolution is verified
    Resolving,
    /// Settled with a final outcome
    Resolved,
}

impl MarketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketStatus::Proposed => "PROPOSED",
            MarketStatus::Trading => "TRADING",
            MarketStatus::Resolving => "RESOLVING",
            MarketStatus::Resolved => "RESOLVED",
        }
    }
}

impl Default for MarketStatus {
    fn default() -> Self {
        MarketStatus::Trading
    }
}

impl std::fmt::Display for MarketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for MarketStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "PROPOSED" => Ok(MarketStatus::Proposed),
            "TRADING" => Ok(MarketStatus::Trading),
            "RESOLVING" => Ok(MarketStatus::Resolving),
            "RESOLVED" => Ok(MarketStatus::Resolved),
            _ => Err(format!("Unknown market status: {}", s)),
        }
    }
}

/// A binary prediction market
///
/// Prices are not stored; they derive from the outstanding share totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Market {
    /// Unique identifier
    pub id: String,

    /// Human-readable title/question
    pub title: String,

    /// Detailed description of the market
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Current status of the market
    pub status: MarketStatus,

    /// Winning outcome, recorded at resolution
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution_outcome: Option<Outcome>,

    /// Outstanding YES shares issued
    pub total_yes_shares: Decimal,

    /// Outstanding NO shares issued
    pub total_no_shares: Decimal,

    /// When the market is scheduled to resolve
    pub resolution_date: DateTime<Utc>,

    /// When the market was created
    pub created_at: DateTime<Utc>,
}

impl Market {
    /// Current YES price (0.00 - 1.00, represents probability)
    ///
    /// Share-ratio pricing: the YES price is the YES share of all
    /// outstanding shares. An empty market prices at 0.5 by convention.
    pub fn yes_price(&self) -> Decimal {
        let total = self.total_yes_shares + self.total_no_shares;
        if total.is_zero() {
            Decimal::new(5, 1)
        } else {
            self.total_yes_shares / total
        }
    }

    /// Current NO price, the exact complement of the YES price
    pub fn no_price(&self) -> Decimal {
        Decimal::ONE - self.yes_price()
    }

    /// Price of the given outcome
    pub fn price(&self, outcome: Outcome) -> Decimal {
        match outcome {
            Outcome::Yes => self.yes_price(),
            Outcome::No => self.no_price(),
        }
    }

    /// Total outstanding shares across both outcomes
    pub fn total_volume(&self) -> Decimal {
        self.total_yes_shares + self.total_no_shares
    }

    /// Outstanding shares for the given outcome
    pub fn total(&self, outcome: Outcome) -> Decimal {
        match outcome {
            Outcome::Yes => self.total_yes_shares,
            Outcome::No => self.total_no_shares,
        }
    }

    /// Check if this market currently accepts buy/sell orders
    pub fn is_tradeable(&self) -> bool {
        self.status == MarketStatus::Trading
    }
}

/// A sampled point on a market's YES price history
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PricePoint {
    /// When the sample was taken
    pub time: DateTime<Utc>,
    /// YES price at that time
    pub yes_price: Decimal,
}
