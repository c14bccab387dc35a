//! Prediction pool simulation.
//!
//! Walks a two-option election market through buys, sells, a rejected
//! oversell and a settlement outage, logging each step.

use prediction_pool_core::*;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run() {
        error!(error = %e, "simulation failed");
        std::process::exit(1);
    }
}

fn run() -> Result<(), EngineError> {
    info!("Prediction Pool Simulation");

    let token = Arc::new(InMemorySettlement::new());
    let engine = Engine::new(EngineConfig::development(), token.clone())?;

    let admin = AccountId::from("admin");
    let alice = AccountId::from("alice");
    let bob = AccountId::from("bob");
    token.mint(&alice, Amount::new(5_000))?;
    token.mint(&bob, Amount::new(2_000))?;

    scenario_1_election(&engine, &token, &admin, &alice)?;
    scenario_2_settlement_outage(&engine, &token, &admin, &bob)?;
    scenario_3_late_escrow(&engine, &admin, &bob)?;

    info!(events = engine.events().len(), markets = engine.market_count(), "all simulations completed");
    Ok(())
}

fn print_details(engine: &Engine, market_id: MarketId) -> Result<(), EngineError> {
    for (i, option) in engine.get_details(market_id)?.iter().enumerate() {
        info!(
            index = i,
            name = %option.name,
            pool = %option.pool,
            price = %option.price,
            approx = %option.price.to_decimal().round_dp(4),
            "option"
        );
    }
    Ok(())
}

/// Buy, partial sell, rejected oversell.
fn scenario_1_election(
    engine: &Engine,
    token: &InMemorySettlement,
    admin: &AccountId,
    alice: &AccountId,
) -> Result<(), EngineError> {
    info!("Scenario 1: Election market");

    let market = engine.initialize(
        MarketSpec::new("US Elections", admin.clone())
            .with_option("donald", 500)
            .with_option("kamla", 700)
            .with_settlement_account(AccountId::from("election-escrow")),
    )?;
    print_details(engine, market)?;

    engine.buy(market, 0, Amount::new(500), alice)?;
    let shares = engine.get_user_shares(market, alice, 0)?;
    info!(%shares, "alice bought 500 of donald");

    engine.sell(market, 0, Amount::new(100), alice)?;
    let shares = engine.get_user_shares(market, alice, 0)?;
    info!(%shares, "alice sold 100 of donald");
    print_details(engine, market)?;

    match engine.sell(market, 0, Amount::new(1_000), alice) {
        Ok(_) => error!("oversell unexpectedly succeeded"),
        Err(e) => info!(kind = ?e.kind(), error = %e, "oversell rejected"),
    }

    info!(
        alice = %token.balance_of(alice),
        escrow = %token.balance_of(&AccountId::from("election-escrow")),
        "collateral balances"
    );
    Ok(())
}

/// Settlement refuses every transfer; the market must not move.
fn scenario_2_settlement_outage(
    engine: &Engine,
    token: &InMemorySettlement,
    admin: &AccountId,
    bob: &AccountId,
) -> Result<(), EngineError> {
    info!("Scenario 2: Settlement outage");

    let market = engine.initialize(
        MarketSpec::new("Rain tomorrow", admin.clone())
            .with_option("yes", 0)
            .with_option("no", 0)
            .with_settlement_account(AccountId::from("weather-escrow")),
    )?;
    print_details(engine, market)?;

    token.set_failure(Some("token program unavailable".to_string()));
    if let Err(e) = engine.buy(market, 1, Amount::new(250), bob) {
        info!(retryable = e.is_retryable(), error = %e, "buy failed during outage");
    }
    let pool = engine.get_details(market)?[1].pool;
    info!(%pool, "pool unchanged");

    token.set_failure(None);
    engine.buy(market, 1, Amount::new(250), bob)?;
    print_details(engine, market)?;
    Ok(())
}

/// Market created without escrow, bound later by the admin.
fn scenario_3_late_escrow(engine: &Engine, admin: &AccountId, bob: &AccountId) -> Result<(), EngineError> {
    info!("Scenario 3: Late escrow binding");

    let market = engine.initialize(
        MarketSpec::new("Three-way race", admin.clone())
            .with_option("red", 100)
            .with_option("green", 100)
            .with_option("blue", 100),
    )?;

    if let Err(e) = engine.buy(market, 2, Amount::new(50), bob) {
        info!(kind = ?e.kind(), "trading blocked until escrow is bound");
    }
    if let Err(e) = engine.bind_settlement_account(market, bob, AccountId::from("bob-wallet")) {
        info!(kind = ?e.kind(), "non-admin binding refused");
    }

    engine.bind_settlement_account(market, admin, AccountId::from("race-escrow"))?;
    engine.buy(market, 2, Amount::new(50), bob)?;
    print_details(engine, market)?;
    Ok(())
}
