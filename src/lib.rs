// prediction-pool-core: multi-option prediction market ledger.
// pool/share accounting first: every trade moves collateral and ledger together or not at all.
// the only outside call is the injected Settlement seam.
//
// file map (search X.0 for structs, X.1+ for logic):
//   1.x  types.rs: primitives: MarketId, AccountId, Amount, TradeSide, Timestamp
//   2.x  option.rs: named option with its collateral pool
//   3.x  ledger.rs: (user, option) -> shares
//   4.x  pricing.rs: pool-share price derivation, uniform fallback
//   5.x  market.rs: market aggregate, creation spec, staged trades
//   7.x  config.rs: engine limits and logging
//   8.x  engine/: market registry, buy/sell, read views
//   9.x  settlement.rs: collateral transfer seam + in-memory token
//   11.x events.rs: state transition events for audit

// core accounting modules
pub mod engine;
pub mod events;
pub mod ledger;
pub mod market;
pub mod option;
pub mod pricing;
pub mod types;

// integration modules
pub mod config;
pub mod settlement;

// re exports for convenience
pub use config::{ConfigError, EngineConfig};
pub use engine::*;
pub use events::*;
pub use ledger::ShareLedger;
pub use market::*;
pub use option::MarketOption;
pub use pricing::*;
pub use settlement::{InMemorySettlement, Settlement, SettlementError, TransferDirection, TransferRecord};
pub use types::*;
