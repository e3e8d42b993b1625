//! Demo market seeding
//!
//! Populates a fresh backend with a handful of markets whose share totals
//! imply realistic starting prices, so the API serves something browsable
//! out of the box.

use chrono::{Duration, Utc};
use predex_core::{LedgerResult, Market, MarketStatus};
use predex_ledger::MarketStore;
use rust_decimal::Decimal;
use tracing::info;

fn demo_market(
    id: &str,
    title: &str,
    description: &str,
    yes_shares: i64,
    no_shares: i64,
    days_to_resolution: i64,
) -> Market {
    let now = Utc::now();
    Market {
        id: id.to_string(),
        title: title.to_string(),
        description: Some(description.to_string()),
        status: MarketStatus::Trading,
        resolution_outcome: None,
        total_yes_shares: Decimal::from(yes_shares),
        total_no_shares: Decimal::from(no_shares),
        resolution_date: now + Duration::days(days_to_resolution),
        created_at: now,
    }
}

/// Insert the demo market set, returning how many were created
pub async fn seed_demo_markets<S: MarketStore>(store: &S) -> LedgerResult<usize> {
    let markets = vec![
        demo_market(
            "bitcoin-200k",
            "Bitcoin > $200k by EOY",
            "Will Bitcoin price exceed $200,000 by December 31?",
            65000,
            35000,
            148,
        ),
        demo_market(
            "ai-benchmark-sweep",
            "Frontier model tops every major benchmark this year",
            "Will a single model hold the top score on all major public benchmarks simultaneously?",
            28000,
            72000,
            148,
        ),
        demo_market(
            "us-recession",
            "US recession declared this year",
            "Will the United States enter an officially declared recession this year?",
            32000,
            68000,
            148,
        ),
        demo_market(
            "world-cup-brazil",
            "Brazil wins the next World Cup",
            "Will Brazil win the next FIFA World Cup?",
            18000,
            82000,
            340,
        ),
        demo_market(
            "tesla-500",
            "Tesla stock hits $500 this year",
            "Will Tesla (TSLA) stock reach $500 per share this year?",
            45000,
            55000,
            148,
        ),
        demo_market(
            "mars-landing",
            "Crewed Mars mission launches within two years",
            "Will a crewed mission to Mars launch within the next two years?",
            31000,
            69000,
            700,
        ),
    ];

    let count = markets.len();
    for market in markets {
        store.insert_market(market).await?;
    }
    info!(count, "seeded demo markets");
    Ok(count)
}
