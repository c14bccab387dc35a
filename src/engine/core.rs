// 8.0 engine/core.rs: main engine. holds every market, the settlement seam and the event log.
// lock order: registry -> events and market -> events. registry and market locks never nest.

use super::results::EngineError;
use crate::config::EngineConfig;
use crate::events::{
    Event, EventLog, EventPayload, MarketInitializedEvent, SettlementAccountBoundEvent,
};
use crate::market::{Market, MarketSpec};
use crate::settlement::Settlement;
use crate::types::{AccountId, MarketId, Timestamp};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, warn};

/** 8.1: main engine struct. share it behind an Arc; every method takes &self */
pub struct Engine {
    pub(super) config: EngineConfig,
    pub(super) settlement: Arc<dyn Settlement>,
    pub(super) markets: RwLock<HashMap<MarketId, Arc<RwLock<Market>>>>,
    pub(super) events: Mutex<EventLog>,
    pub(super) next_market_id: AtomicU64,
}

// state is only written after every fallible step has passed, so a poisoned
// lock still guards consistent data
pub(super) fn read_lock<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

pub(super) fn write_lock<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

impl Engine {
    pub fn new(config: EngineConfig, settlement: Arc<dyn Settlement>) -> Result<Self, EngineError> {
        config.validate()?;
        let events = EventLog::new(config.max_events);

        Ok(Self {
            config,
            settlement,
            markets: RwLock::new(HashMap::new()),
            events: Mutex::new(events),
            next_market_id: AtomicU64::new(1),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn settlement_backend(&self) -> &str {
        self.settlement.backend_type()
    }

    /// Creates a market and returns its handle. Nothing is stored on failure.
    pub fn initialize(&self, spec: MarketSpec) -> Result<MarketId, EngineError> {
        if let Err(e) = spec.validate(&self.config) {
            warn!(description = %spec.description, error = %e, "market initialization rejected");
            return Err(e.into());
        }

        // id allocated, registered and announced under one registry lock, so
        // init events follow id order and no trade event can precede them
        let mut markets = write_lock(&self.markets);
        let market_id = MarketId(self.next_market_id.fetch_add(1, Ordering::Relaxed));
        let payload = MarketInitializedEvent {
            market_id,
            description: spec.description.clone(),
            option_names: spec.option_names.clone(),
            initial_pools: spec.initial_pools.clone(),
            admin: spec.admin.clone(),
            settlement_account: spec.settlement_account.clone(),
        };

        let market = Market::new(market_id, spec, &self.config, Timestamp::now())?;
        let option_count = market.option_count();
        let total_pool = market.total_pool();

        markets.insert(market_id, Arc::new(RwLock::new(market)));
        self.emit_event(EventPayload::MarketInitialized(payload));
        drop(markets);

        info!(%market_id, options = option_count, total_pool = %total_pool, "market initialized");

        Ok(market_id)
    }

    /// Admin-only escrow binding for markets created without one.
    pub fn bind_settlement_account(
        &self,
        market_id: MarketId,
        caller: &AccountId,
        account: AccountId,
    ) -> Result<(), EngineError> {
        let handle = self.market_handle(market_id)?;
        let mut market = write_lock(&handle);

        if let Err(e) = market.bind_settlement_account(caller, account.clone()) {
            warn!(%market_id, %caller, error = %e, "settlement account binding rejected");
            return Err(e.into());
        }

        info!(%market_id, %account, "settlement account bound");
        self.emit_event(EventPayload::SettlementAccountBound(SettlementAccountBoundEvent {
            market_id,
            account,
        }));

        Ok(())
    }

    pub(super) fn market_handle(&self, market_id: MarketId) -> Result<Arc<RwLock<Market>>, EngineError> {
        read_lock(&self.markets)
            .get(&market_id)
            .cloned()
            .ok_or(EngineError::MarketNotFound(market_id))
    }

    pub fn market_ids(&self) -> Vec<MarketId> {
        let mut ids: Vec<MarketId> = read_lock(&self.markets).keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn market_count(&self) -> usize {
        read_lock(&self.markets).len()
    }

    pub fn events(&self) -> Vec<Event> {
        self.event_log().events().to_vec()
    }

    pub fn recent_events(&self, count: usize) -> Vec<Event> {
        self.event_log().recent(count).to_vec()
    }

    fn event_log(&self) -> MutexGuard<'_, EventLog> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(super) fn emit_event(&self, payload: EventPayload) {
        let mut log = self.event_log();
        let event = log.record(Timestamp::now(), payload);

        if self.config.verbose {
            debug!(event_id = event.id.0, payload = ?event.payload, "event");
        }
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("settlement", &self.settlement.backend_type())
            .field("markets", &self.market_count())
            .finish()
    }
}
