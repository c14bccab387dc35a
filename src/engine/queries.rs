//! Read views. Each call takes the market's read lock once, so every value it
//! returns comes from the same committed state.

use super::core::{read_lock, Engine};
use super::results::{EngineError, MarketInfo, MarketSnapshot};
use crate::market::{Market, OptionDetails};
use crate::types::{AccountId, Amount, MarketId};

fn market_info(market: &Market) -> MarketInfo {
    MarketInfo {
        market_id: market.id(),
        description: market.description().to_string(),
        admin: market.admin().clone(),
        settlement_account: market.settlement_account().cloned(),
        option_count: market.option_count(),
        total_pool: market.total_pool(),
        created_at: market.created_at(),
        last_updated: market.last_updated(),
    }
}

impl Engine {
    /// Name, pool and price of every option, in option order.
    pub fn get_details(&self, market_id: MarketId) -> Result<Vec<OptionDetails>, EngineError> {
        let handle = self.market_handle(market_id)?;
        let market = read_lock(&handle);
        Ok(market.details())
    }

    /// Shares `user` holds at `option`. Zero if they never traded it.
    pub fn get_user_shares(
        &self,
        market_id: MarketId,
        user: &AccountId,
        option: usize,
    ) -> Result<Amount, EngineError> {
        let handle = self.market_handle(market_id)?;
        let market = read_lock(&handle);
        Ok(market.shares(user, option)?)
    }

    pub fn market_info(&self, market_id: MarketId) -> Result<MarketInfo, EngineError> {
        let handle = self.market_handle(market_id)?;
        let market = read_lock(&handle);
        Ok(market_info(&market))
    }

    /// Sum of every holder's shares at `option`. Seed pools are unowned, so this
    /// is at most the pool, not equal to it.
    pub fn total_shares(&self, market_id: MarketId, option: usize) -> Result<u128, EngineError> {
        let handle = self.market_handle(market_id)?;
        let market = read_lock(&handle);
        Ok(market.outstanding_shares(option)?)
    }

    pub fn snapshot(&self, market_id: MarketId) -> Result<MarketSnapshot, EngineError> {
        let handle = self.market_handle(market_id)?;
        let market = read_lock(&handle);

        let outstanding_shares = (0..market.option_count())
            .map(|i| market.ledger().outstanding(i))
            .collect();

        Ok(MarketSnapshot {
            info: market_info(&market),
            details: market.details(),
            outstanding_shares,
        })
    }
}
