//! Error types for the exchange

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

/// Exchange-wide error type
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("invalid amount: {0}")]
    InvalidAmount(Decimal),

    #[error("insufficient balance: need {required}, have {available}")]
    InsufficientBalance {
        required: Decimal,
        available: Decimal,
    },

    #[error("insufficient shares: need {requested}, have {available}")]
    InsufficientShares {
        requested: Decimal,
        available: Decimal,
    },

    #[error("no position in market {0}")]
    NoPosition(String),

    #[error("market not found: {0}")]
    MarketNotFound(String),

    #[error("user not found: {0}")]
    UserNotFound(String),

    #[error("market {0} is not open for trading")]
    MarketClosed(String),

    #[error("market {id} was modified concurrently (expected version {expected}, found {actual})")]
    VersionConflict {
        id: String,
        expected: u64,
        actual: u64,
    },

    #[error("proposal not found: {0}")]
    ProposalNotFound(String),

    #[error("already voted on proposal {0}")]
    AlreadyVoted(String),

    #[error("faucet cooldown active until {0}")]
    FaucetCooldown(DateTime<Utc>),

    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),
}

impl LedgerError {
    pub fn market_not_found(id: impl Into<String>) -> Self {
        LedgerError::MarketNotFound(id.into())
    }

    pub fn user_not_found(id: impl Into<String>) -> Self {
        LedgerError::UserNotFound(id.into())
    }

    pub fn proposal_not_found(id: impl Into<String>) -> Self {
        LedgerError::ProposalNotFound(id.into())
    }

    pub fn backend(msg: impl Into<String>) -> Self {
        LedgerError::BackendUnavailable(msg.into())
    }

    /// Whether this error was raised by a precondition check, before any
    /// state was touched.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            LedgerError::InvalidAmount(_)
                | LedgerError::InsufficientBalance { .. }
                | LedgerError::InsufficientShares { .. }
                | LedgerError::NoPosition(_)
                | LedgerError::MarketClosed(_)
        )
    }
}

/// Result type alias for exchange operations
pub type LedgerResult<T> = Result<T, LedgerError>;
