//! Position and portfolio structures

use crate::market::Outcome;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A user's holdings in a single market
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    /// Owning user
    pub user_id: String,

    /// Market identifier
    pub market_id: String,

    /// YES shares held
    pub yes_shares: Decimal,

    /// NO shares held
    pub no_shares: Decimal,
}

impl Position {
    /// Create an empty position for a user/market pair
    pub fn new(user_id: impl Into<String>, market_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            market_id: market_id.into(),
            yes_shares: Decimal::ZERO,
            no_shares: Decimal::ZERO,
        }
    }

    /// Shares held for the given outcome
    pub fn shares(&self, outcome: Outcome) -> Decimal {
        match outcome {
            Outcome::Yes => self.yes_shares,
            Outcome::No => self.no_shares,
        }
    }

    /// Set the share count for the given outcome
    pub fn set_shares(&mut self, outcome: Outcome, shares: Decimal) {
        match outcome {
            Outcome::Yes => self.yes_shares = shares,
            Outcome::No => self.no_shares = shares,
        }
    }

    /// Whether both share counts are zero
    ///
    /// Empty positions are pruned from the backing store so stale
    /// zero-value rows never shadow "no position" detection.
    pub fn is_empty(&self) -> bool {
        self.yes_shares.is_zero() && self.no_shares.is_zero()
    }
}

/// A position joined with current market prices
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Holding {
    /// Market identifier
    pub market_id: String,

    /// Market title, for display
    pub market_title: String,

    /// YES shares held
    pub yes_shares: Decimal,

    /// NO shares held
    pub no_shares: Decimal,

    /// Current YES price
    pub yes_price: Decimal,

    /// Current NO price
    pub no_price: Decimal,

    /// Mark-to-market value of the holding
    pub value: Decimal,
}

/// A user's full portfolio: holdings plus spendable balance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Portfolio {
    /// All non-empty holdings
    pub holdings: Vec<Holding>,

    /// Spendable USDC balance
    pub usdc_balance: Decimal,

    /// Total portfolio value (holdings + balance)
    pub total_value: Decimal,
}

impl Portfolio {
    /// Build a portfolio from holdings and a balance, computing the total
    pub fn new(holdings: Vec<Holding>, usdc_balance: Decimal) -> Self {
        let holdings_value: Decimal = holdings.iter().map(|h| h.value).sum();
        Self {
            holdings,
            usdc_balance,
            total_value: holdings_value + usdc_balance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_shares_by_outcome() {
        let mut pos = Position::new("u1", "m1");
        pos.set_shares(Outcome::Yes, dec!(10));
        assert_eq!(pos.shares(Outcome::Yes), dec!(10));
        assert_eq!(pos.shares(Outcome::No), Decimal::ZERO);
        assert!(!pos.is_empty());
    }

    #[test]
    fn test_empty_detection() {
        let pos = Position::new("u1", "m1");
        assert!(pos.is_empty());
    }

    #[test]
    fn test_portfolio_total() {
        let holdings = vec![
            Holding {
                market_id: "m1".to_string(),
                market_title: "A".to_string(),
                yes_shares: dec!(10),
                no_shares: Decimal::ZERO,
                yes_price: dec!(0.6),
                no_price: dec!(0.4),
                value: dec!(6.00),
            },
            Holding {
                market_id: "m2".to_string(),
                market_title: "B".to_string(),
                yes_shares: Decimal::ZERO,
                no_shares: dec!(5),
                yes_price: dec!(0.3),
                no_price: dec!(0.7),
                value: dec!(3.50),
            },
        ];
        let portfolio = Portfolio::new(holdings, dec!(50.00));
        assert_eq!(portfolio.total_value, dec!(59.50));
    }
}
