//! Predex Ledger - pricing and trading services
//!
//! This crate provides:
//! - The store traits that define the external-backend boundary
//! - The trading ledger (buy/sell with atomic read-modify-write semantics)
//! - Account management (signup, deposits, withdrawals, portfolio)
//! - The daily faucet
//! - Governance (market proposals and weighted voting)

pub mod account;
pub mod faucet;
pub mod governance;
pub mod ledger;
pub mod store;

pub use account::AccountService;
pub use faucet::{FaucetClaim, FaucetService, FAUCET_CLAIM_AMOUNT, FAUCET_COOLDOWN_HOURS};
pub use governance::GovernanceService;
pub use ledger::{TradingLedger, MIN_EXECUTION_PRICE};
pub use store::{
    BalanceStore, MarketSnapshot, MarketStore, PositionStore, ProposalStore, TradeSink, UserStore,
};
