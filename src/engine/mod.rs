// 8.0: core engine. owns every market, routes trades through settlement,
// serves read views from consistent snapshots.
// one writer at a time per market, any number of readers, markets independent.

mod core;
mod queries;
mod results;
mod trades;

pub use core::Engine;
pub use results::{EngineError, ErrorKind, MarketInfo, MarketSnapshot, TradeResult};
