//! User account structure

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A user account, keyed off a wallet address
///
/// The balance is the off-chain spendable USDC amount; nothing here touches
/// a chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: String,

    /// Wallet address the account is bound to
    pub wallet_address: String,

    /// Spendable USDC balance
    pub usdc_balance: Decimal,

    /// This user's shareable referral code
    pub referral_code: String,

    /// Id of the user whose code was used at signup, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referred_by: Option<String>,

    /// Last successful faucet claim, used for the cooldown window
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_faucet_claim: Option<DateTime<Utc>>,

    /// When the account was created
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a fresh account with a zero balance
    pub fn new(
        id: impl Into<String>,
        wallet_address: impl Into<String>,
        referral_code: impl Into<String>,
        referred_by: Option<String>,
    ) -> Self {
        Self {
            id: id.into(),
            wallet_address: wallet_address.into(),
            usdc_balance: Decimal::ZERO,
            referral_code: referral_code.into(),
            referred_by,
            last_faucet_claim: None,
            created_at: Utc::now(),
        }
    }
}
