//! Outcome options.
//!
//! One option is one discrete outcome of a market: an immutable label plus the
//! collateral pool currently backing it. Prices are derived from the pool
//! vector on demand, see `pricing`.

use crate::types::Amount;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketOption {
    name: String,
    pool: Amount,
}

impl MarketOption {
    pub fn new(name: impl Into<String>, pool: Amount) -> Self {
        Self {
            name: name.into(),
            pool,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pool(&self) -> Amount {
        self.pool
    }

    // only the market commits pool changes, after settlement has cleared
    pub(crate) fn set_pool(&mut self, pool: Amount) {
        self.pool = pool;
    }
}
