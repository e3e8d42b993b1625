//! Testnet faucet: a daily USDC allowance per user

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use predex_core::{quantize_usdc, LedgerError, LedgerResult};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{error, info, instrument};

use crate::store::{BalanceStore, UserStore};

/// USDC credited per claim
pub const FAUCET_CLAIM_AMOUNT: Decimal = Decimal::from_parts(1000, 0, 0, false, 0);

/// Hours a user must wait between claims
pub const FAUCET_COOLDOWN_HOURS: i64 = 24;

/// Result of a successful faucet claim
#[derive(Debug, Clone, Serialize)]
pub struct FaucetClaim {
    /// Amount credited
    pub amount: Decimal,
    /// Balance after the credit
    pub new_balance: Decimal,
    /// When the user may claim again
    pub next_claim_at: DateTime<Utc>,
}

/// Service dispensing the daily faucet allowance
pub struct FaucetService<S> {
    store: Arc<S>,
}

impl<S> FaucetService<S>
where
    S: UserStore + BalanceStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Claim the faucet allowance
    ///
    /// Fails with `FaucetCooldown` (carrying the next eligible time) when
    /// the last claim is younger than the cooldown window.
    #[instrument(skip(self))]
    pub async fn claim(&self, user_id: &str) -> LedgerResult<FaucetClaim> {
        let user = self.store.get_user(user_id).await?;
        let now = Utc::now();

        if let Some(last) = user.last_faucet_claim {
            let next_eligible = last + Duration::hours(FAUCET_COOLDOWN_HOURS);
            if now < next_eligible {
                return Err(LedgerError::FaucetCooldown(next_eligible));
            }
        }

        let balance = self.store.get_balance(user_id).await?;
        let new_balance = quantize_usdc(balance + FAUCET_CLAIM_AMOUNT);
        self.store.set_balance(user_id, new_balance).await?;

        if let Err(e) = self.store.set_last_faucet_claim(user_id, now).await {
            // Undo the credit so a stamp failure cannot mint repeat claims
            if let Err(undo) = self.store.set_balance(user_id, balance).await {
                error!(user = %user_id, error = %undo, "failed to undo faucet credit during rollback");
            }
            return Err(e);
        }

        info!(user = %user_id, %new_balance, "faucet claim dispensed");
        Ok(FaucetClaim {
            amount: FAUCET_CLAIM_AMOUNT,
            new_balance,
            next_claim_at: now + Duration::hours(FAUCET_COOLDOWN_HOURS),
        })
    }

    /// Whether a user could claim right now, and if not, when
    pub async fn eligibility(&self, user_id: &str) -> LedgerResult<Option<DateTime<Utc>>> {
        let user = self.store.get_user(user_id).await?;
        Ok(user.last_faucet_claim.and_then(|last| {
            let next_eligible = last + Duration::hours(FAUCET_COOLDOWN_HOURS);
            (Utc::now() < next_eligible).then_some(next_eligible)
        }))
    }
}
