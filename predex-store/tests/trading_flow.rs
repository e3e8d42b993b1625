//! End-to-end trading flow tests over the in-memory backend

use std::sync::Arc;

use chrono::{Duration, Utc};
use predex_core::{
    LedgerError, Market, MarketStatus, Outcome, TradeStatus, User, VoterAssets,
};
use predex_ledger::{
    AccountService, FaucetService, GovernanceService, MarketStore, PositionStore, TradeSink,
    TradingLedger,
};
use predex_store::MemoryBackend;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn market(id: &str, yes: Decimal, no: Decimal) -> Market {
    Market {
        id: id.to_string(),
        title: format!("Market {}", id),
        description: None,
        status: MarketStatus::Trading,
        resolution_outcome: None,
        total_yes_shares: yes,
        total_no_shares: no,
        resolution_date: Utc::now() + Duration::days(30),
        created_at: Utc::now(),
    }
}

/// Create a funded user directly through the account service
async fn funded_user(backend: &Arc<MemoryBackend>, wallet: &str, amount: Decimal) -> User {
    let accounts = AccountService::new(Arc::clone(backend));
    let user = accounts.get_or_create_user(wallet, None).await.unwrap();
    accounts.deposit(&user.id, amount).await.unwrap();
    user
}

#[tokio::test]
async fn test_buy_on_empty_market_executes_at_half() {
    let backend = Arc::new(MemoryBackend::new());
    backend
        .insert_market(market("m1", dec!(0), dec!(0)))
        .await
        .unwrap();
    let user = funded_user(&backend, "0xalice", dec!(100)).await;
    let ledger = TradingLedger::new(Arc::clone(&backend));

    let receipt = ledger.buy(&user.id, "m1", Outcome::Yes, dec!(50)).await.unwrap();
    assert_eq!(receipt.price, dec!(0.5));
    assert_eq!(receipt.shares, dec!(100));
    assert_eq!(receipt.new_balance, dec!(50));

    let snap = backend.get_market("m1").await.unwrap();
    assert_eq!(snap.market.total_yes_shares, dec!(100));
    assert_eq!(snap.market.total_no_shares, dec!(0));
}

#[tokio::test]
async fn test_concrete_two_user_scenario() {
    // Empty market; Alice buys YES 50 at 0.5, Bob then buys YES 10 at 1.0,
    // Alice sells 50 YES at 1.0.
    let backend = Arc::new(MemoryBackend::new());
    backend
        .insert_market(market("m1", dec!(0), dec!(0)))
        .await
        .unwrap();
    let alice = funded_user(&backend, "0xalice", dec!(100)).await;
    let bob = funded_user(&backend, "0xbob", dec!(100)).await;
    let ledger = TradingLedger::new(Arc::clone(&backend));

    let first = ledger.buy(&alice.id, "m1", Outcome::Yes, dec!(50)).await.unwrap();
    assert_eq!(first.price, dec!(0.5));
    assert_eq!(first.shares, dec!(100));

    // All outstanding shares are YES now, so YES prices at 1.0; the NO
    // side being empty must not divide anything by zero.
    let second = ledger.buy(&bob.id, "m1", Outcome::Yes, dec!(10)).await.unwrap();
    assert_eq!(second.price, dec!(1));
    assert_eq!(second.shares, dec!(10));

    let sale = ledger.sell(&alice.id, "m1", Outcome::Yes, dec!(50)).await.unwrap();
    assert_eq!(sale.price, dec!(1));
    assert_eq!(sale.amount, dec!(50));

    let position = backend.get_position(&alice.id, "m1").await.unwrap().unwrap();
    assert_eq!(position.yes_shares, dec!(50));

    let snap = backend.get_market("m1").await.unwrap();
    assert_eq!(snap.market.total_yes_shares, dec!(60));
}

#[tokio::test]
async fn test_round_trip_scales_with_price_move() {
    // The buy itself moves the price, so the sell returns
    // amount * (price_after / price_before) within rounding tolerance.
    let backend = Arc::new(MemoryBackend::new());
    backend
        .insert_market(market("m1", dec!(100), dec!(100)))
        .await
        .unwrap();
    let user = funded_user(&backend, "0xalice", dec!(100)).await;
    let ledger = TradingLedger::new(Arc::clone(&backend));

    let price_before = ledger.price("m1", Outcome::Yes).await.unwrap();
    let receipt = ledger.buy(&user.id, "m1", Outcome::Yes, dec!(50)).await.unwrap();
    let price_after = ledger.price("m1", Outcome::Yes).await.unwrap();

    let sale = ledger
        .sell(&user.id, "m1", Outcome::Yes, receipt.shares)
        .await
        .unwrap();

    let expected = dec!(50) * (price_after / price_before);
    assert!(
        (sale.amount - expected).abs() <= dec!(0.01),
        "proceeds {} differ from expected {}",
        sale.amount,
        expected
    );
}

#[tokio::test]
async fn test_round_trip_at_stable_price_conserves_value() {
    // Against a deep market a small trade barely moves the price, so a
    // buy-then-sell round trip loses at most the rounding tolerance.
    let backend = Arc::new(MemoryBackend::new());
    backend
        .insert_market(market("m1", dec!(5000000), dec!(5000000)))
        .await
        .unwrap();
    let user = funded_user(&backend, "0xalice", dec!(100)).await;
    let ledger = TradingLedger::new(Arc::clone(&backend));

    let receipt = ledger.buy(&user.id, "m1", Outcome::Yes, dec!(10)).await.unwrap();
    let sale = ledger
        .sell(&user.id, "m1", Outcome::Yes, receipt.shares)
        .await
        .unwrap();

    assert!(
        (sale.amount - dec!(10)).abs() <= dec!(0.01),
        "round trip returned {}",
        sale.amount
    );
}

#[tokio::test]
async fn test_insufficient_balance_leaves_state_unchanged() {
    let backend = Arc::new(MemoryBackend::new());
    backend
        .insert_market(market("m1", dec!(100), dec!(100)))
        .await
        .unwrap();
    let user = funded_user(&backend, "0xalice", dec!(20)).await;
    let ledger = TradingLedger::new(Arc::clone(&backend));

    let err = ledger.buy(&user.id, "m1", Outcome::Yes, dec!(50)).await.unwrap_err();
    assert!(matches!(err, LedgerError::InsufficientBalance { .. }));

    let accounts = AccountService::new(Arc::clone(&backend));
    assert_eq!(accounts.get_user(&user.id).await.unwrap().usdc_balance, dec!(20));
    assert!(backend.get_position(&user.id, "m1").await.unwrap().is_none());
    let snap = backend.get_market("m1").await.unwrap();
    assert_eq!(snap.market.total_yes_shares, dec!(100));
}

#[tokio::test]
async fn test_oversell_leaves_state_unchanged() {
    let backend = Arc::new(MemoryBackend::new());
    backend
        .insert_market(market("m1", dec!(100), dec!(100)))
        .await
        .unwrap();
    let user = funded_user(&backend, "0xalice", dec!(100)).await;
    let ledger = TradingLedger::new(Arc::clone(&backend));

    let receipt = ledger.buy(&user.id, "m1", Outcome::Yes, dec!(50)).await.unwrap();
    let balance_after_buy = receipt.new_balance;

    let err = ledger
        .sell(&user.id, "m1", Outcome::Yes, receipt.shares + dec!(1))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InsufficientShares { .. }));

    let position = backend.get_position(&user.id, "m1").await.unwrap().unwrap();
    assert_eq!(position.yes_shares, receipt.shares);
    let accounts = AccountService::new(Arc::clone(&backend));
    assert_eq!(
        accounts.get_user(&user.id).await.unwrap().usdc_balance,
        balance_after_buy
    );
}

#[tokio::test]
async fn test_precondition_errors() {
    let backend = Arc::new(MemoryBackend::new());
    backend
        .insert_market(market("m1", dec!(100), dec!(100)))
        .await
        .unwrap();
    let user = funded_user(&backend, "0xalice", dec!(100)).await;
    let ledger = TradingLedger::new(Arc::clone(&backend));

    assert!(matches!(
        ledger.buy(&user.id, "m1", Outcome::Yes, dec!(0)).await.unwrap_err(),
        LedgerError::InvalidAmount(_)
    ));
    assert!(matches!(
        ledger.buy(&user.id, "m1", Outcome::Yes, dec!(-5)).await.unwrap_err(),
        LedgerError::InvalidAmount(_)
    ));
    assert!(matches!(
        ledger.sell(&user.id, "m1", Outcome::Yes, dec!(1)).await.unwrap_err(),
        LedgerError::NoPosition(_)
    ));
    assert!(matches!(
        ledger.buy(&user.id, "missing", Outcome::Yes, dec!(5)).await.unwrap_err(),
        LedgerError::MarketNotFound(_)
    ));
    assert!(matches!(
        ledger.buy("nobody", "m1", Outcome::Yes, dec!(5)).await.unwrap_err(),
        LedgerError::UserNotFound(_)
    ));
}

#[tokio::test]
async fn test_closed_market_rejects_trades() {
    let backend = Arc::new(MemoryBackend::new());
    backend
        .insert_market(market("m1", dec!(100), dec!(100)))
        .await
        .unwrap();
    let user = funded_user(&backend, "0xalice", dec!(100)).await;
    let ledger = TradingLedger::new(Arc::clone(&backend));

    backend
        .set_market_status("m1", MarketStatus::Resolving, None)
        .await
        .unwrap();

    assert!(matches!(
        ledger.buy(&user.id, "m1", Outcome::Yes, dec!(10)).await.unwrap_err(),
        LedgerError::MarketClosed(_)
    ));
}

#[tokio::test]
async fn test_position_pruned_after_full_exit() {
    let backend = Arc::new(MemoryBackend::new());
    backend
        .insert_market(market("m1", dec!(100), dec!(100)))
        .await
        .unwrap();
    let user = funded_user(&backend, "0xalice", dec!(100)).await;
    let ledger = TradingLedger::new(Arc::clone(&backend));

    let receipt = ledger.buy(&user.id, "m1", Outcome::Yes, dec!(50)).await.unwrap();
    ledger
        .sell(&user.id, "m1", Outcome::Yes, receipt.shares)
        .await
        .unwrap();

    // No stale zero-share row; a further sell reports NoPosition
    assert!(backend.get_position(&user.id, "m1").await.unwrap().is_none());
    assert!(matches!(
        ledger.sell(&user.id, "m1", Outcome::Yes, dec!(1)).await.unwrap_err(),
        LedgerError::NoPosition(_)
    ));
}

#[tokio::test]
async fn test_buying_the_empty_side_is_floored_not_divided_by_zero() {
    // YES holds all outstanding shares, so NO prices at zero; the buy
    // executes at the 0.01 floor instead of minting infinite shares.
    let backend = Arc::new(MemoryBackend::new());
    backend
        .insert_market(market("m1", dec!(100), dec!(0)))
        .await
        .unwrap();
    let user = funded_user(&backend, "0xalice", dec!(100)).await;
    let ledger = TradingLedger::new(Arc::clone(&backend));

    let receipt = ledger.buy(&user.id, "m1", Outcome::No, dec!(1)).await.unwrap();
    assert_eq!(receipt.price, dec!(0.01));
    assert_eq!(receipt.shares, dec!(100));
}

#[tokio::test]
async fn test_concurrent_buys_lose_no_updates() {
    let backend = Arc::new(MemoryBackend::new());
    backend
        .insert_market(market("m1", dec!(1000), dec!(1000)))
        .await
        .unwrap();
    let ledger = Arc::new(TradingLedger::new(Arc::clone(&backend)));

    let mut users = Vec::new();
    for i in 0..8 {
        users.push(funded_user(&backend, &format!("0xwallet{}", i), dec!(100)).await);
    }

    let mut handles = Vec::new();
    for user in &users {
        let ledger = Arc::clone(&ledger);
        let user_id = user.id.clone();
        handles.push(tokio::spawn(async move {
            ledger.buy(&user_id, "m1", Outcome::Yes, dec!(10)).await
        }));
    }

    let mut total_bought = Decimal::ZERO;
    for handle in handles {
        let receipt = handle.await.unwrap().expect("concurrent buy failed");
        total_bought += receipt.shares;
    }

    let snap = backend.get_market("m1").await.unwrap();
    assert_eq!(snap.market.total_yes_shares, dec!(1000) + total_bought);
}

#[tokio::test]
async fn test_trade_audit_records_completed() {
    let backend = Arc::new(MemoryBackend::new());
    backend
        .insert_market(market("m1", dec!(100), dec!(100)))
        .await
        .unwrap();
    let user = funded_user(&backend, "0xalice", dec!(100)).await;
    let ledger = TradingLedger::new(Arc::clone(&backend));

    let receipt = ledger.buy(&user.id, "m1", Outcome::Yes, dec!(25)).await.unwrap();

    let trades = backend.trades_for_user(&user.id).await.unwrap();
    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].id, receipt.trade_id);
    assert_eq!(trades[0].status, TradeStatus::Completed);
    assert_eq!(trades[0].amount, dec!(25));
    assert_eq!(trades[0].shares, receipt.shares);
}

#[tokio::test]
async fn test_faucet_claim_and_cooldown() {
    let backend = Arc::new(MemoryBackend::new());
    let accounts = AccountService::new(Arc::clone(&backend));
    let user = accounts.get_or_create_user("0xalice", None).await.unwrap();
    let faucet = FaucetService::new(Arc::clone(&backend));

    let claim = faucet.claim(&user.id).await.unwrap();
    assert_eq!(claim.amount, dec!(1000));
    assert_eq!(claim.new_balance, dec!(1000));

    let err = faucet.claim(&user.id).await.unwrap_err();
    assert!(matches!(err, LedgerError::FaucetCooldown(_)));
    assert_eq!(accounts.get_user(&user.id).await.unwrap().usdc_balance, dec!(1000));
}

#[tokio::test]
async fn test_withdraw_guard() {
    let backend = Arc::new(MemoryBackend::new());
    let accounts = AccountService::new(Arc::clone(&backend));
    let user = accounts.get_or_create_user("0xalice", None).await.unwrap();
    accounts.deposit(&user.id, dec!(100)).await.unwrap();

    let err = accounts.withdraw(&user.id, dec!(150)).await.unwrap_err();
    assert!(matches!(err, LedgerError::InsufficientBalance { .. }));

    let balance = accounts.withdraw(&user.id, dec!(40)).await.unwrap();
    assert_eq!(balance, dec!(60));
}

#[tokio::test]
async fn test_referral_attribution() {
    let backend = Arc::new(MemoryBackend::new());
    let accounts = AccountService::new(Arc::clone(&backend));

    let referrer = accounts.get_or_create_user("0xalice", None).await.unwrap();
    let referred = accounts
        .get_or_create_user("0xbob", Some(&referrer.referral_code))
        .await
        .unwrap();
    assert_eq!(referred.referred_by.as_deref(), Some(referrer.id.as_str()));

    // Unknown code is ignored, not fatal
    let loner = accounts
        .get_or_create_user("0xcarol", Some("NOSUCHCO"))
        .await
        .unwrap();
    assert!(loner.referred_by.is_none());

    assert_eq!(accounts.referral_stats(&referrer.id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_governance_proposal_to_tradeable_market() {
    let backend = Arc::new(MemoryBackend::new());
    let accounts = AccountService::new(Arc::clone(&backend));
    let proposer = accounts.get_or_create_user("0xalice", None).await.unwrap();
    let voter = accounts.get_or_create_user("0xbob", None).await.unwrap();
    let governance = GovernanceService::new(Arc::clone(&backend));

    let proposal = governance
        .propose(&proposer.id, "ETH flips BTC", Some("Market cap flip".to_string()))
        .await
        .unwrap();
    assert_eq!(governance.pending_proposals().await.unwrap().len(), 1);

    let assets = VoterAssets {
        staked_balance: dec!(100),
        tier: predex_core::MembershipTier::Voter,
        ..Default::default()
    };
    let power = governance
        .vote(&proposal.id, &voter.id, Outcome::Yes, &assets)
        .await
        .unwrap();
    assert_eq!(power.total_votes, dec!(160));

    let err = governance
        .vote(&proposal.id, &voter.id, Outcome::No, &assets)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::AlreadyVoted(_)));

    let market = governance
        .approve(&proposal.id, Utc::now() + Duration::days(60))
        .await
        .unwrap();
    assert_eq!(market.status, MarketStatus::Trading);
    assert_eq!(market.total_yes_shares, Decimal::ZERO);

    // The fresh market trades at the no-liquidity price
    accounts.deposit(&proposer.id, dec!(100)).await.unwrap();
    let ledger = TradingLedger::new(Arc::clone(&backend));
    let receipt = ledger
        .buy(&proposer.id, &market.id, Outcome::Yes, dec!(10))
        .await
        .unwrap();
    assert_eq!(receipt.price, dec!(0.5));
}

#[tokio::test]
async fn test_resolution_freezes_market() {
    let backend = Arc::new(MemoryBackend::new());
    backend
        .insert_market(market("m1", dec!(100), dec!(100)))
        .await
        .unwrap();
    let user = funded_user(&backend, "0xalice", dec!(100)).await;
    let governance = GovernanceService::new(Arc::clone(&backend));
    let ledger = TradingLedger::new(Arc::clone(&backend));

    governance.begin_resolution("m1").await.unwrap();
    governance.resolve("m1", Outcome::Yes).await.unwrap();

    let snap = backend.get_market("m1").await.unwrap();
    assert_eq!(snap.market.status, MarketStatus::Resolved);
    assert_eq!(snap.market.resolution_outcome, Some(Outcome::Yes));
    assert!(matches!(
        ledger.buy(&user.id, "m1", Outcome::Yes, dec!(10)).await.unwrap_err(),
        LedgerError::MarketClosed(_)
    ));
}

#[tokio::test]
async fn test_portfolio_marks_to_current_prices() {
    let backend = Arc::new(MemoryBackend::new());
    backend
        .insert_market(market("m1", dec!(100), dec!(100)))
        .await
        .unwrap();
    let user = funded_user(&backend, "0xalice", dec!(100)).await;
    let ledger = TradingLedger::new(Arc::clone(&backend));
    let accounts = AccountService::new(Arc::clone(&backend));

    let receipt = ledger.buy(&user.id, "m1", Outcome::Yes, dec!(50)).await.unwrap();

    let portfolio = accounts.portfolio(&user.id).await.unwrap();
    assert_eq!(portfolio.holdings.len(), 1);
    assert_eq!(portfolio.usdc_balance, dec!(50));

    let holding = &portfolio.holdings[0];
    let snap = backend.get_market("m1").await.unwrap();
    let expected = (receipt.shares * snap.market.yes_price()).round_dp(2);
    assert_eq!(holding.value, expected);
    assert_eq!(portfolio.total_value, dec!(50) + expected);
}
