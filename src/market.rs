//! Market aggregate.
//!
//! A market owns its ordered options and its share ledger. The option order
//! fixed at creation is the index space every trade and query uses.
//!
//! Trades are applied in two steps: `stage_*` validates and computes the new
//! pool and share values without touching state, `commit` writes them. The
//! engine moves collateral between the two, so a failed transfer never leaves
//! a half-applied trade behind.

use crate::config::EngineConfig;
use crate::ledger::ShareLedger;
use crate::option::MarketOption;
use crate::pricing::{calculate_prices, total_pool, OptionPrice};
use crate::types::{AccountId, Amount, ArithmeticError, MarketId, Timestamp};
use serde::{Deserialize, Serialize};

/// Creation request for a market.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSpec {
    pub description: String,
    pub option_names: Vec<String>,
    pub initial_pools: Vec<Amount>,
    pub admin: AccountId,
    /// Escrow for collateral. may be bound after creation.
    pub settlement_account: Option<AccountId>,
}

impl MarketSpec {
    pub fn new(description: impl Into<String>, admin: AccountId) -> Self {
        Self {
            description: description.into(),
            option_names: Vec::new(),
            initial_pools: Vec::new(),
            admin,
            settlement_account: None,
        }
    }

    pub fn with_option(mut self, name: impl Into<String>, initial_pool: u64) -> Self {
        self.option_names.push(name.into());
        self.initial_pools.push(Amount::new(initial_pool));
        self
    }

    pub fn with_settlement_account(mut self, account: AccountId) -> Self {
        self.settlement_account = Some(account);
        self
    }

    pub fn validate(&self, config: &EngineConfig) -> Result<(), ValidationError> {
        if self.option_names.len() != self.initial_pools.len() {
            return Err(ValidationError::LengthMismatch {
                names: self.option_names.len(),
                pools: self.initial_pools.len(),
            });
        }
        if self.option_names.is_empty() {
            return Err(ValidationError::NoOptions);
        }
        if self.option_names.len() > config.max_options_per_market {
            return Err(ValidationError::TooManyOptions {
                count: self.option_names.len(),
                max: config.max_options_per_market,
            });
        }
        if self.description.len() > config.max_label_len {
            return Err(ValidationError::LabelTooLong {
                len: self.description.len(),
                max: config.max_label_len,
            });
        }
        if let Some(name) = self.option_names.iter().find(|n| n.len() > config.max_label_len) {
            return Err(ValidationError::LabelTooLong {
                len: name.len(),
                max: config.max_label_len,
            });
        }
        Ok(())
    }
}

/// One row of the details view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionDetails {
    pub name: String,
    pub pool: Amount,
    pub price: OptionPrice,
}

/// Pool and ledger values computed for a trade, not yet applied.
/// Only the engine builds and commits these, around the settlement call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StagedTrade {
    pub(crate) option: usize,
    pub(crate) account: AccountId,
    pub(crate) escrow: AccountId,
    pub(crate) new_pool: Amount,
    pub(crate) new_shares: Amount,
}

#[derive(Debug, Clone)]
pub struct Market {
    id: MarketId,
    description: String,
    admin: AccountId,
    settlement_account: Option<AccountId>,
    options: Vec<MarketOption>,
    ledger: ShareLedger,
    created_at: Timestamp,
    last_updated: Timestamp,
}

impl Market {
    /// Builds a market from a validated spec. No market exists if this fails.
    pub fn new(
        id: MarketId,
        spec: MarketSpec,
        config: &EngineConfig,
        timestamp: Timestamp,
    ) -> Result<Self, ValidationError> {
        spec.validate(config)?;

        let options = spec
            .option_names
            .into_iter()
            .zip(spec.initial_pools)
            .map(|(name, pool)| MarketOption::new(name, pool))
            .collect();

        Ok(Self {
            id,
            description: spec.description,
            admin: spec.admin,
            settlement_account: spec.settlement_account,
            options,
            ledger: ShareLedger::new(),
            created_at: timestamp,
            last_updated: timestamp,
        })
    }

    pub fn id(&self) -> MarketId {
        self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn admin(&self) -> &AccountId {
        &self.admin
    }

    pub fn settlement_account(&self) -> Option<&AccountId> {
        self.settlement_account.as_ref()
    }

    pub fn options(&self) -> &[MarketOption] {
        &self.options
    }

    pub fn option_count(&self) -> usize {
        self.options.len()
    }

    pub fn ledger(&self) -> &ShareLedger {
        &self.ledger
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn last_updated(&self) -> Timestamp {
        self.last_updated
    }

    pub fn total_pool(&self) -> u128 {
        total_pool(&self.options)
    }

    pub fn validate_index(&self, option: usize) -> Result<(), ValidationError> {
        if option >= self.options.len() {
            return Err(ValidationError::OptionIndexOutOfRange {
                index: option,
                len: self.options.len(),
            });
        }
        Ok(())
    }

    pub fn details(&self) -> Vec<OptionDetails> {
        self.options
            .iter()
            .zip(calculate_prices(&self.options))
            .map(|(option, price)| OptionDetails {
                name: option.name().to_string(),
                pool: option.pool(),
                price,
            })
            .collect()
    }

    pub fn shares(&self, account: &AccountId, option: usize) -> Result<Amount, ValidationError> {
        self.validate_index(option)?;
        Ok(self.ledger.shares(account, option))
    }

    pub fn outstanding_shares(&self, option: usize) -> Result<u128, ValidationError> {
        self.validate_index(option)?;
        Ok(self.ledger.outstanding(option))
    }

    /// Admin-only. Binds the escrow when the market was created without one.
    pub fn bind_settlement_account(
        &mut self,
        caller: &AccountId,
        account: AccountId,
    ) -> Result<(), MarketError> {
        if caller != &self.admin {
            return Err(MarketError::Unauthorized { caller: caller.clone() });
        }
        if let Some(bound) = &self.settlement_account {
            return Err(ValidationError::EscrowAlreadyBound { account: bound.clone() }.into());
        }
        self.settlement_account = Some(account);
        Ok(())
    }

    fn check_trade(&self, option: usize, amount: Amount) -> Result<AccountId, MarketError> {
        self.validate_index(option)?;
        if amount.is_zero() {
            return Err(ValidationError::ZeroAmount.into());
        }
        self.settlement_account
            .clone()
            .ok_or(MarketError::EscrowNotBound(self.id))
    }

    pub(crate) fn stage_buy(
        &self,
        option: usize,
        amount: Amount,
        buyer: &AccountId,
    ) -> Result<StagedTrade, MarketError> {
        let escrow = self.check_trade(option, amount)?;

        let new_pool = self.options[option].pool().checked_add(amount)?;
        let new_shares = self.ledger.shares(buyer, option).checked_add(amount)?;

        Ok(StagedTrade {
            option,
            account: buyer.clone(),
            escrow,
            new_pool,
            new_shares,
        })
    }

    pub(crate) fn stage_sell(
        &self,
        option: usize,
        amount: Amount,
        seller: &AccountId,
    ) -> Result<StagedTrade, MarketError> {
        let escrow = self.check_trade(option, amount)?;

        let held = self.ledger.shares(seller, option);
        if held < amount {
            return Err(MarketError::InsufficientShares {
                account: seller.clone(),
                option,
                requested: amount,
                available: held,
            });
        }

        // holders can never out-sell the pool while the ledger is consistent
        let new_pool = self.options[option].pool().checked_sub(amount)?;
        let new_shares = held.checked_sub(amount)?;

        Ok(StagedTrade {
            option,
            account: seller.clone(),
            escrow,
            new_pool,
            new_shares,
        })
    }

    /// Applies a staged trade. Pool and ledger change together, or not at all.
    pub(crate) fn commit(&mut self, staged: &StagedTrade, timestamp: Timestamp) -> Result<(), ValidationError> {
        self.validate_index(staged.option)?;
        self.options[staged.option].set_pool(staged.new_pool);
        self.ledger
            .set_shares(&staged.account, staged.option, staged.new_shares);
        self.last_updated = timestamp;
        Ok(())
    }
}

/// Malformed input. Nothing was mutated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Got {names} option names but {pools} initial pools")]
    LengthMismatch { names: usize, pools: usize },

    #[error("A market needs at least one option")]
    NoOptions,

    #[error("Market allows at most {max} options, got {count}")]
    TooManyOptions { count: usize, max: usize },

    #[error("Label of {len} bytes exceeds limit {max}")]
    LabelTooLong { len: usize, max: usize },

    #[error("Option index {index} out of range for {len} options")]
    OptionIndexOutOfRange { index: usize, len: usize },

    #[error("Trade amount must be positive")]
    ZeroAmount,

    #[error("Settlement account already bound to {account}")]
    EscrowAlreadyBound { account: AccountId },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MarketError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("{account} holds {available} shares of option {option}, cannot sell {requested}")]
    InsufficientShares {
        account: AccountId,
        option: usize,
        requested: Amount,
        available: Amount,
    },

    #[error("Arithmetic error: {0}")]
    Arithmetic(#[from] ArithmeticError),

    #[error("{caller} is not the market admin")]
    Unauthorized { caller: AccountId },

    #[error("{0} has no settlement account bound")]
    EscrowNotBound(MarketId),
}
