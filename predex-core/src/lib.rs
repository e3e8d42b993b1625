//! Core types for the Predex paper-trading exchange
//!
//! This crate defines the shared data structures used across the exchange,
//! including market representations, positions, trade records, users, and
//! governance proposals, along with the pricing formula and the monetary
//! quantization policy.

pub mod error;
pub mod governance;
pub mod market;
pub mod position;
pub mod rounding;
pub mod trade;
pub mod user;

pub use error::{LedgerError, LedgerResult};
pub use governance::{
    MembershipTier, PartnerNfts, ProposalStatus, ProposedMarket, VoterAssets, VotingPower,
};
pub use market::{Market, MarketStatus, Outcome, PricePoint};
pub use position::{Holding, Portfolio, Position};
pub use rounding::{quantize_shares, quantize_usdc, SHARE_DP, USDC_DP};
pub use trade::{TradeReceipt, TradeRecord, TradeSide, TradeStatus};
pub use user::User;
