//! Buy and sell execution.
//!
//! Each trade runs under the market's write lock: stage (validate + checked
//! math), move collateral, then commit pool and ledger together. Any failure
//! before the commit returns with the market untouched.

use super::core::{write_lock, Engine};
use super::results::{EngineError, TradeResult};
use crate::events::{EventPayload, TradeEvent, TradeRejectedEvent};
use crate::types::{AccountId, Amount, MarketId, Timestamp, TradeSide};
use tracing::{debug, error, info, warn};

impl Engine {
    /// Deposit `amount` collateral into `option`, minting the same number of shares to `buyer`.
    pub fn buy(
        &self,
        market_id: MarketId,
        option: usize,
        amount: Amount,
        buyer: &AccountId,
    ) -> Result<TradeResult, EngineError> {
        self.execute_trade(market_id, TradeSide::Buy, option, amount, buyer)
    }

    /// Burn `amount` shares of `option` held by `seller` and release the same collateral.
    pub fn sell(
        &self,
        market_id: MarketId,
        option: usize,
        amount: Amount,
        seller: &AccountId,
    ) -> Result<TradeResult, EngineError> {
        self.execute_trade(market_id, TradeSide::Sell, option, amount, seller)
    }

    fn execute_trade(
        &self,
        market_id: MarketId,
        side: TradeSide,
        option: usize,
        amount: Amount,
        account: &AccountId,
    ) -> Result<TradeResult, EngineError> {
        let handle = self.market_handle(market_id)?;
        let mut market = write_lock(&handle);

        let staged = match side {
            TradeSide::Buy => market.stage_buy(option, amount, account),
            TradeSide::Sell => market.stage_sell(option, amount, account),
        };
        let staged = match staged {
            Ok(staged) => staged,
            Err(e) => return Err(self.reject(market_id, side, option, amount, account, e.into())),
        };

        debug!(%market_id, %side, %account, escrow = %staged.escrow, %amount, "moving collateral");
        let transfer = match side {
            TradeSide::Buy => self.settlement.transfer_in(amount, account, &staged.escrow),
            TradeSide::Sell => self.settlement.transfer_out(amount, &staged.escrow, account),
        };
        if let Err(e) = transfer {
            return Err(self.reject(market_id, side, option, amount, account, e.into()));
        }

        // staged under this same write lock, so the index is still valid
        if let Err(e) = market.commit(&staged, Timestamp::now()) {
            error!(%market_id, %side, %account, option, %amount, error = %e, "commit failed after settlement");
            return Err(self.reject(market_id, side, option, amount, account, e.into()));
        }
        let details = market.details();

        let event = TradeEvent {
            market_id,
            account: account.clone(),
            option,
            amount,
            pool_after: staged.new_pool,
            shares_after: staged.new_shares,
        };
        self.emit_event(match side {
            TradeSide::Buy => EventPayload::SharesBought(event),
            TradeSide::Sell => EventPayload::SharesSold(event),
        });
        drop(market);

        info!(
            %market_id,
            %side,
            %account,
            option,
            %amount,
            pool = %staged.new_pool,
            shares = %staged.new_shares,
            "trade executed"
        );

        Ok(TradeResult {
            market_id,
            side,
            account: staged.account,
            option,
            amount,
            pool_after: staged.new_pool,
            shares_after: staged.new_shares,
            details,
        })
    }

    // audit the rejection, hand the error back
    fn reject(
        &self,
        market_id: MarketId,
        side: TradeSide,
        option: usize,
        amount: Amount,
        account: &AccountId,
        err: EngineError,
    ) -> EngineError {
        warn!(%market_id, %side, %account, option, %amount, error = %err, "trade rejected");
        self.emit_event(EventPayload::TradeRejected(TradeRejectedEvent {
            market_id,
            account: account.clone(),
            side,
            option,
            amount,
            reason: err.to_string(),
        }));
        err
    }
}
