// 11.0: every committed mutation and every rejected trade produces an event.
// used for audit trails and for replaying what happened to a market.

use crate::types::{AccountId, Amount, MarketId, Timestamp, TradeSide};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId(pub u64);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub timestamp: Timestamp,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(id: EventId, timestamp: Timestamp, payload: EventPayload) -> Self {
        Self {
            id,
            timestamp,
            payload,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventPayload {
    // Market lifecycle
    MarketInitialized(MarketInitializedEvent),
    SettlementAccountBound(SettlementAccountBoundEvent),

    // Trades
    SharesBought(TradeEvent),
    SharesSold(TradeEvent),
    TradeRejected(TradeRejectedEvent),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketInitializedEvent {
    pub market_id: MarketId,
    pub description: String,
    pub option_names: Vec<String>,
    pub initial_pools: Vec<Amount>,
    pub admin: AccountId,
    pub settlement_account: Option<AccountId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementAccountBoundEvent {
    pub market_id: MarketId,
    pub account: AccountId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeEvent {
    pub market_id: MarketId,
    pub account: AccountId,
    pub option: usize,
    pub amount: Amount,
    pub pool_after: Amount,
    pub shares_after: Amount,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeRejectedEvent {
    pub market_id: MarketId,
    pub account: AccountId,
    pub side: TradeSide,
    pub option: usize,
    pub amount: Amount,
    pub reason: String,
}

/// Bounded event buffer. Oldest events are dropped past `max_events`.
#[derive(Debug)]
pub struct EventLog {
    events: Vec<Event>,
    next_id: u64,
    max_events: usize,
}

impl EventLog {
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Vec::new(),
            next_id: 1,
            max_events: max_events.max(1),
        }
    }

    pub fn record(&mut self, timestamp: Timestamp, payload: EventPayload) -> &Event {
        let event = Event::new(EventId(self.next_id), timestamp, payload);
        self.next_id += 1;
        self.events.push(event);

        if self.events.len() > self.max_events {
            let drain_count = self.events.len() - self.max_events;
            self.events.drain(0..drain_count);
        }

        // max_events >= 1 so the newest event survives the drain
        &self.events[self.events.len() - 1]
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn recent(&self, count: usize) -> &[Event] {
        let start = self.events.len().saturating_sub(count);
        &self.events[start..]
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
