//! Stress tests
//!
//! These tests hammer shared markets from many threads to verify trades stay
//! serialized per market and readers only ever see committed state.

use prediction_pool_core::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

const SEEDS: [u64; 3] = [500, 700, 300];

fn shared_engine(traders: usize, balance: u64) -> (Arc<Engine>, Arc<InMemorySettlement>) {
    let token = Arc::new(InMemorySettlement::new());
    for t in 0..traders {
        token.mint(&trader(t), Amount::new(balance)).unwrap();
    }
    let engine = Engine::new(EngineConfig::default(), token.clone()).unwrap();
    (Arc::new(engine), token)
}

fn trader(i: usize) -> AccountId {
    AccountId::new(format!("trader-{}", i))
}

fn open_market(engine: &Engine, escrow: &str) -> MarketId {
    let mut spec = MarketSpec::new("stress", AccountId::from("admin"))
        .with_settlement_account(AccountId::from(escrow));
    for (i, seed) in SEEDS.iter().enumerate() {
        spec = spec.with_option(format!("opt-{}", i), *seed);
    }
    engine.initialize(spec).unwrap()
}

// One details view must price every option from the same pool vector
fn assert_details_consistent(details: &[OptionDetails]) -> u128 {
    let total: u128 = details.iter().map(|d| d.pool.value() as u128).sum();
    for (d, seed) in details.iter().zip(SEEDS) {
        assert!(d.pool.value() >= seed, "pool below seed: {}", d.pool);
        assert_eq!(d.price, OptionPrice::new(d.pool.value() as u128, total).unwrap());
    }
    total
}

// Every snapshot must satisfy pool = seed + outstanding shares, with prices summing to one
fn assert_consistent(snapshot: &MarketSnapshot) {
    for (i, seed) in SEEDS.iter().enumerate() {
        assert_eq!(
            snapshot.details[i].pool.value() as u128,
            *seed as u128 + snapshot.outstanding_shares[i],
            "torn read at option {}",
            i
        );
    }
    let prices: Vec<OptionPrice> = snapshot.details.iter().map(|d| d.price).collect();
    assert!((price_sum(&prices) - Decimal::ONE).abs() < dec!(0.000000001));
}

/// Concurrent writers against one market.
mod contention_tests {
    use super::*;

    #[test]
    fn concurrent_buys_all_land() {
        let (engine, token) = shared_engine(8, 1_000_000);
        let market = open_market(&engine, "escrow");

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let engine = Arc::clone(&engine);
                thread::spawn(move || {
                    for n in 0..200 {
                        engine.buy(market, n % SEEDS.len(), Amount::new(1), &trader(t)).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let snapshot = engine.snapshot(market).unwrap();
        assert_consistent(&snapshot);
        let outstanding: u128 = snapshot.outstanding_shares.iter().sum();
        assert_eq!(outstanding, 8 * 200);
        assert_eq!(token.balance_of(&AccountId::from("escrow")), Amount::new(1_600));
        for t in 0..8 {
            assert_eq!(token.balance_of(&trader(t)), Amount::new(1_000_000 - 200));
        }
    }

    #[test]
    fn racing_sells_never_overdraw() {
        let (engine, token) = shared_engine(1, 1_000);
        let market = open_market(&engine, "escrow");
        let seller = trader(0);
        engine.buy(market, 0, Amount::new(100), &seller).unwrap();

        // 16 threads each try to sell 10 of the same 100 shares
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let engine = Arc::clone(&engine);
                let seller = seller.clone();
                thread::spawn(move || engine.sell(market, 0, Amount::new(10), &seller).is_ok())
            })
            .collect();
        let succeeded = handles.into_iter().map(|h| h.join().unwrap()).filter(|ok| *ok).count();

        assert_eq!(succeeded, 10);
        assert_eq!(engine.get_user_shares(market, &seller, 0).unwrap(), Amount::ZERO);
        assert_eq!(engine.get_details(market).unwrap()[0].pool, Amount::new(500));
        assert_eq!(token.balance_of(&seller), Amount::new(1_000));
        assert_eq!(token.balance_of(&AccountId::from("escrow")), Amount::ZERO);
    }

    #[test]
    fn mixed_traffic_with_readers() {
        let (engine, _token) = shared_engine(6, 1_000_000);
        let market = open_market(&engine, "escrow");
        let done = Arc::new(AtomicBool::new(false));
        let seeded: u128 = SEEDS.iter().map(|s| *s as u128).sum();
        // 6 writers x 150 buys of 7; at most that much can ever be pooled on top of the seeds
        let max_pooled = seeded + 6 * 150 * 7;

        let snapshot_readers: Vec<_> = (0..2)
            .map(|_| {
                let engine = Arc::clone(&engine);
                let done = Arc::clone(&done);
                thread::spawn(move || {
                    let mut reads = 0usize;
                    while !done.load(Ordering::Acquire) || reads == 0 {
                        assert_consistent(&engine.snapshot(market).unwrap());
                        reads += 1;
                    }
                    reads
                })
            })
            .collect();

        let details_readers: Vec<_> = (0..2)
            .map(|_| {
                let engine = Arc::clone(&engine);
                let done = Arc::clone(&done);
                thread::spawn(move || {
                    let mut reads = 0usize;
                    while !done.load(Ordering::Acquire) || reads == 0 {
                        let total = assert_details_consistent(&engine.get_details(market).unwrap());
                        assert!(total >= seeded && total <= max_pooled, "pooled total {}", total);
                        reads += 1;
                    }
                    reads
                })
            })
            .collect();

        let writers: Vec<_> = (0..6)
            .map(|t| {
                let engine = Arc::clone(&engine);
                thread::spawn(move || {
                    let me = trader(t);
                    for n in 0..150 {
                        let option = (t + n) % SEEDS.len();
                        engine.buy(market, option, Amount::new(7), &me).unwrap();
                        if n % 3 == 0 {
                            // only this thread sells its own shares, so this never overdraws
                            engine.sell(market, option, Amount::new(5), &me).unwrap();
                        }
                    }
                })
            })
            .collect();

        for w in writers {
            w.join().unwrap();
        }
        done.store(true, Ordering::Release);
        for r in snapshot_readers.into_iter().chain(details_readers) {
            assert!(r.join().unwrap() > 0);
        }

        let bought: u128 = 6 * 150 * 7;
        let sold: u128 = 6 * 50 * 5;
        let snapshot = engine.snapshot(market).unwrap();
        assert_consistent(&snapshot);
        let outstanding: u128 = snapshot.outstanding_shares.iter().sum();
        assert_eq!(outstanding, bought - sold);

        let total = assert_details_consistent(&engine.get_details(market).unwrap());
        assert_eq!(total, seeded + bought - sold);
    }
}

/// Independent markets under load.
mod isolation_tests {
    use super::*;

    #[test]
    fn markets_do_not_interfere() {
        let (engine, token) = shared_engine(4, 1_000_000);
        let markets: Vec<MarketId> = (0..4).map(|m| open_market(&engine, &format!("escrow-{}", m))).collect();

        let handles: Vec<_> = markets
            .iter()
            .enumerate()
            .map(|(t, &market)| {
                let engine = Arc::clone(&engine);
                thread::spawn(move || {
                    for _ in 0..100 {
                        engine.buy(market, t % SEEDS.len(), Amount::new(3), &trader(t)).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        for (t, &market) in markets.iter().enumerate() {
            let snapshot = engine.snapshot(market).unwrap();
            assert_consistent(&snapshot);
            for option in 0..SEEDS.len() {
                let expected = if option == t % SEEDS.len() { 300 } else { 0 };
                assert_eq!(snapshot.outstanding_shares[option], expected);
            }
            assert_eq!(token.balance_of(&AccountId::new(format!("escrow-{}", t))), Amount::new(300));
        }
    }

    #[test]
    fn concurrent_initialize_assigns_unique_ids() {
        let (engine, _token) = shared_engine(0, 0);

        let handles: Vec<_> = (0..8)
            .map(|n| {
                let engine = Arc::clone(&engine);
                thread::spawn(move || {
                    (0..25)
                        .map(|_| open_market(&engine, &format!("escrow-{}", n)))
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut ids: Vec<MarketId> = handles.into_iter().flat_map(|h| h.join().unwrap()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 200);
        assert_eq!(engine.market_ids(), ids);

        // one init event per market, recorded in id order
        let inits: Vec<MarketId> = engine
            .events()
            .iter()
            .filter_map(|e| match &e.payload {
                EventPayload::MarketInitialized(init) => Some(init.market_id),
                _ => None,
            })
            .collect();
        assert_eq!(inits, ids);
    }
}

/// Long trade sequences on a single thread.
mod volume_tests {
    use super::*;

    #[test]
    fn event_log_stays_bounded() {
        let token = Arc::new(InMemorySettlement::new());
        token.mint(&trader(0), Amount::new(1_000_000)).unwrap();
        let config = EngineConfig { max_events: 50, ..EngineConfig::default() };
        let engine = Engine::new(config, token).unwrap();
        let market = open_market(&engine, "escrow");

        for _ in 0..500 {
            engine.buy(market, 1, Amount::new(2), &trader(0)).unwrap();
            engine.sell(market, 1, Amount::new(1), &trader(0)).unwrap();
        }

        let events = engine.events();
        assert_eq!(events.len(), 50);
        assert!(matches!(events.last().unwrap().payload, EventPayload::SharesSold(_)));
        assert_eq!(engine.get_user_shares(market, &trader(0), 1).unwrap(), Amount::new(500));
    }

    #[test]
    fn large_pools_keep_exact_prices() {
        let token = Arc::new(InMemorySettlement::new());
        token.mint(&trader(0), Amount::new(u64::MAX / 2)).unwrap();
        let engine = Engine::new(EngineConfig::default(), token).unwrap();
        let market = engine
            .initialize(
                MarketSpec::new("whale", AccountId::from("admin"))
                    .with_option("a", u64::MAX / 2)
                    .with_option("b", 0)
                    .with_settlement_account(AccountId::from("escrow")),
            )
            .unwrap();

        engine.buy(market, 1, Amount::new(u64::MAX / 2), &trader(0)).unwrap();

        let details = engine.get_details(market).unwrap();
        assert_eq!(details[0].price, OptionPrice::new(1, 2).unwrap());
        assert_eq!(details[1].price, OptionPrice::new(1, 2).unwrap());
        assert_eq!(details[0].price.to_decimal(), dec!(0.5));
    }
}
