//! Account management: signup, deposits, withdrawals, portfolio

use std::sync::Arc;

use predex_core::{
    quantize_usdc, Holding, LedgerError, LedgerResult, Portfolio, User,
};
use rand::Rng;
use rust_decimal::Decimal;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::store::{BalanceStore, MarketStore, PositionStore, UserStore};

/// Alphabet for referral codes
const REFERRAL_CODE_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Length of a referral code
const REFERRAL_CODE_LEN: usize = 8;

/// Service for user accounts and balances
pub struct AccountService<S> {
    store: Arc<S>,
}

impl<S> AccountService<S>
where
    S: UserStore + BalanceStore + PositionStore + MarketStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Fetch the account bound to a wallet address, creating it on first
    /// contact
    ///
    /// A new account gets a unique referral code; if `referrer_code` names
    /// an existing user, the signup is attributed to them. An unknown
    /// referrer code is ignored rather than failing the signup.
    #[instrument(skip(self))]
    pub async fn get_or_create_user(
        &self,
        wallet_address: &str,
        referrer_code: Option<&str>,
    ) -> LedgerResult<User> {
        if let Some(existing) = self.store.get_user_by_wallet(wallet_address).await? {
            return Ok(existing);
        }

        let referred_by = match referrer_code {
            Some(code) => {
                let referrer = self.store.get_user_by_referral_code(code).await?;
                if referrer.is_none() {
                    warn!(code, "unknown referrer code, ignoring");
                }
                referrer.map(|u| u.id)
            }
            None => None,
        };

        let referral_code = self.generate_unique_code().await?;
        let user = User::new(
            Uuid::new_v4().to_string(),
            wallet_address,
            referral_code,
            referred_by,
        );
        debug!(user = %user.id, "creating account");
        self.store.create_user(user).await
    }

    async fn generate_unique_code(&self) -> LedgerResult<String> {
        loop {
            let code = generate_referral_code();
            if self.store.get_user_by_referral_code(&code).await?.is_none() {
                return Ok(code);
            }
        }
    }

    /// Read a user by id
    pub async fn get_user(&self, user_id: &str) -> LedgerResult<User> {
        self.store.get_user(user_id).await
    }

    /// How many signups used this user's referral code
    pub async fn referral_stats(&self, user_id: &str) -> LedgerResult<u64> {
        self.store.referral_count(user_id).await
    }

    /// Credit USDC to a user's spendable balance
    #[instrument(skip(self))]
    pub async fn deposit(&self, user_id: &str, amount: Decimal) -> LedgerResult<Decimal> {
        let amount = quantize_usdc(amount);
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(amount));
        }
        let balance = self.store.get_balance(user_id).await?;
        let new_balance = quantize_usdc(balance + amount);
        self.store.set_balance(user_id, new_balance).await?;
        Ok(new_balance)
    }

    /// Withdraw USDC from a user's spendable balance
    #[instrument(skip(self))]
    pub async fn withdraw(&self, user_id: &str, amount: Decimal) -> LedgerResult<Decimal> {
        let amount = quantize_usdc(amount);
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(amount));
        }
        let balance = self.store.get_balance(user_id).await?;
        if amount > balance {
            return Err(LedgerError::InsufficientBalance {
                required: amount,
                available: balance,
            });
        }
        let new_balance = quantize_usdc(balance - amount);
        self.store.set_balance(user_id, new_balance).await?;
        Ok(new_balance)
    }

    /// A user's positions marked to current prices, plus their balance
    #[instrument(skip(self))]
    pub async fn portfolio(&self, user_id: &str) -> LedgerResult<Portfolio> {
        let balance = self.store.get_balance(user_id).await?;
        let positions = self.store.positions_for_user(user_id).await?;

        let mut holdings = Vec::with_capacity(positions.len());
        for position in positions {
            let market = match self.store.get_market(&position.market_id).await {
                Ok(snapshot) => snapshot.market,
                Err(e) => {
                    // A dangling position should not sink the whole view
                    warn!(market = %position.market_id, error = %e, "skipping position without market");
                    continue;
                }
            };
            let yes_price = market.yes_price();
            let no_price = market.no_price();
            let value = quantize_usdc(
                position.yes_shares * yes_price + position.no_shares * no_price,
            );
            holdings.push(Holding {
                market_id: position.market_id,
                market_title: market.title,
                yes_shares: position.yes_shares,
                no_shares: position.no_shares,
                yes_price,
                no_price,
                value,
            });
        }

        Ok(Portfolio::new(holdings, balance))
    }
}

/// Generate an 8-character A-Z/0-9 referral code
fn generate_referral_code() -> String {
    let mut rng = rand::rng();
    (0..REFERRAL_CODE_LEN)
        .map(|_| {
            let idx = rng.random_range(0..REFERRAL_CODE_CHARS.len());
            REFERRAL_CODE_CHARS[idx] as char
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_referral_code_shape() {
        let code = generate_referral_code();
        assert_eq!(code.len(), REFERRAL_CODE_LEN);
        assert!(code
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit()));
    }
}
