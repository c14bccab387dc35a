// 9.0 settlement.rs: collateral movement seam. the market calls this, never the other way round.
// InMemorySettlement is a plain token ledger; production adapters would wrap a real token program.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::types::{AccountId, Amount};

// Which leg of a trade a transfer belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferDirection {
    // account -> escrow (buy)
    In,
    // escrow -> account (sell)
    Out,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRecord {
    pub direction: TransferDirection,
    pub from: AccountId,
    pub to: AccountId,
    pub amount: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettlementError {
    #[error("Insufficient funds in {account}: requested {requested}, available {available}")]
    InsufficientFunds {
        account: AccountId,
        requested: Amount,
        available: Amount,
    },

    #[error("Balance of {account} would overflow")]
    BalanceOverflow { account: AccountId },

    #[error("Transfer rejected: {reason}")]
    Rejected { reason: String },
}

/// Synchronous collateral mover. One call, one outcome, no retries.
///
/// Implementations must either move the full amount or nothing at all.
pub trait Settlement: Send + Sync {
    /// Move `amount` from a participant into the market escrow.
    fn transfer_in(&self, amount: Amount, from: &AccountId, escrow: &AccountId) -> Result<(), SettlementError>;

    /// Release `amount` from the market escrow back to a participant.
    fn transfer_out(&self, amount: Amount, escrow: &AccountId, to: &AccountId) -> Result<(), SettlementError>;

    fn backend_type(&self) -> &str;
}

#[derive(Debug, Default)]
struct TokenLedger {
    balances: HashMap<AccountId, Amount>,
    transfers: Vec<TransferRecord>,
    total_supply: u128,
    forced_failure: Option<String>,
}

impl TokenLedger {
    fn balance_of(&self, account: &AccountId) -> Amount {
        self.balances.get(account).copied().unwrap_or(Amount::ZERO)
    }

    fn transfer(&mut self, record: TransferRecord) -> Result<(), SettlementError> {
        if let Some(reason) = &self.forced_failure {
            return Err(SettlementError::Rejected { reason: reason.clone() });
        }

        // validate both legs before touching either balance
        let available = self.balance_of(&record.from);
        let debited = available
            .checked_sub(record.amount)
            .map_err(|_| SettlementError::InsufficientFunds {
                account: record.from.clone(),
                requested: record.amount,
                available,
            })?;

        if record.from != record.to {
            let credited = self
                .balance_of(&record.to)
                .checked_add(record.amount)
                .map_err(|_| SettlementError::BalanceOverflow { account: record.to.clone() })?;
            self.balances.insert(record.from.clone(), debited);
            self.balances.insert(record.to.clone(), credited);
        }

        self.transfers.push(record);
        Ok(())
    }
}

/// In-memory collateral token. Deterministic, so tests can script every outcome.
#[derive(Debug, Default)]
pub struct InMemorySettlement {
    state: Mutex<TokenLedger>,
}

impl InMemorySettlement {
    pub fn new() -> Self {
        Self::default()
    }

    fn ledger(&self) -> MutexGuard<'_, TokenLedger> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // create new collateral out of thin air
    pub fn mint(&self, account: &AccountId, amount: Amount) -> Result<(), SettlementError> {
        let mut ledger = self.ledger();
        let credited = ledger
            .balance_of(account)
            .checked_add(amount)
            .map_err(|_| SettlementError::BalanceOverflow { account: account.clone() })?;
        ledger.balances.insert(account.clone(), credited);
        ledger.total_supply += amount.value() as u128;
        Ok(())
    }

    pub fn balance_of(&self, account: &AccountId) -> Amount {
        self.ledger().balance_of(account)
    }

    pub fn total_supply(&self) -> u128 {
        self.ledger().total_supply
    }

    /// Make every transfer fail with `reason` until cleared with `None`.
    pub fn set_failure(&self, reason: Option<String>) {
        self.ledger().forced_failure = reason;
    }

    pub fn transfers(&self) -> Vec<TransferRecord> {
        self.ledger().transfers.clone()
    }

    pub fn transfer_count(&self) -> usize {
        self.ledger().transfers.len()
    }
}

impl Settlement for InMemorySettlement {
    fn transfer_in(&self, amount: Amount, from: &AccountId, escrow: &AccountId) -> Result<(), SettlementError> {
        self.ledger().transfer(TransferRecord {
            direction: TransferDirection::In,
            from: from.clone(),
            to: escrow.clone(),
            amount,
        })
    }

    fn transfer_out(&self, amount: Amount, escrow: &AccountId, to: &AccountId) -> Result<(), SettlementError> {
        self.ledger().transfer(TransferRecord {
            direction: TransferDirection::Out,
            from: escrow.clone(),
            to: to.clone(),
            amount,
        })
    }

    fn backend_type(&self) -> &str {
        "in_memory"
    }
}
