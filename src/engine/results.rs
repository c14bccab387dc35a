// 8.0.2: result types and errors for engine operations.

use crate::config::ConfigError;
use crate::market::{MarketError, OptionDetails, ValidationError};
use crate::settlement::SettlementError;
use crate::types::{AccountId, Amount, ArithmeticError, MarketId, Timestamp, TradeSide};
use serde::{Deserialize, Serialize};

/// Market state right after a successful buy or sell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeResult {
    pub market_id: MarketId,
    pub side: TradeSide,
    pub account: AccountId,
    pub option: usize,
    pub amount: Amount,
    pub pool_after: Amount,
    pub shares_after: Amount,
    pub details: Vec<OptionDetails>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketInfo {
    pub market_id: MarketId,
    pub description: String,
    pub admin: AccountId,
    pub settlement_account: Option<AccountId>,
    pub option_count: usize,
    pub total_pool: u128,
    pub created_at: Timestamp,
    pub last_updated: Timestamp,
}

/// Everything a reader may want, taken under one lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub info: MarketInfo,
    pub details: Vec<OptionDetails>,
    // sum of all holders' shares, per option
    pub outstanding_shares: Vec<u128>,
}

/// Flat error classification for callers deciding whether to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    InsufficientShares,
    SettlementFailure,
    ArithmeticOverflow,
    ArithmeticUnderflow,
    Unauthorized,
    EscrowNotBound,
    Config,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("Market {0} not found")]
    MarketNotFound(MarketId),

    #[error("Market error: {0}")]
    Market(#[from] MarketError),

    #[error("Settlement failure: {0}")]
    Settlement(#[from] SettlementError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl From<ValidationError> for EngineError {
    fn from(err: ValidationError) -> Self {
        EngineError::Market(MarketError::Validation(err))
    }
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::MarketNotFound(_) => ErrorKind::NotFound,
            EngineError::Settlement(_) => ErrorKind::SettlementFailure,
            EngineError::Config(_) => ErrorKind::Config,
            EngineError::Market(err) => match err {
                MarketError::Validation(_) => ErrorKind::Validation,
                MarketError::InsufficientShares { .. } => ErrorKind::InsufficientShares,
                MarketError::Arithmetic(ArithmeticError::Overflow { .. }) => ErrorKind::ArithmeticOverflow,
                MarketError::Arithmetic(ArithmeticError::Underflow { .. }) => ErrorKind::ArithmeticUnderflow,
                MarketError::Unauthorized { .. } => ErrorKind::Unauthorized,
                MarketError::EscrowNotBound(_) => ErrorKind::EscrowNotBound,
            },
        }
    }

    /// Only a settlement failure can succeed on a plain retry.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::SettlementFailure
    }
}
