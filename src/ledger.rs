// 3.0 ledger.rs: per-user, per-option share balances.
// entries appear on first write and are only ever zeroed, never removed.

use crate::types::{AccountId, Amount};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ShareKey {
    account: AccountId,
    option: usize,
}

/** 3.1: share ledger. a missing entry reads as zero */
#[derive(Debug, Clone, Default)]
pub struct ShareLedger {
    entries: HashMap<ShareKey, Amount>,
}

impl ShareLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shares(&self, account: &AccountId, option: usize) -> Amount {
        self.entries
            .get(&ShareKey {
                account: account.clone(),
                option,
            })
            .copied()
            .unwrap_or(Amount::ZERO)
    }

    // overwrite; callers have already computed the new balance with checked math
    pub(crate) fn set_shares(&mut self, account: &AccountId, option: usize, shares: Amount) {
        self.entries.insert(
            ShareKey {
                account: account.clone(),
                option,
            },
            shares,
        );
    }

    /// All holders with a recorded entry at `option`, including zeroed ones.
    pub fn holders(&self, option: usize) -> impl Iterator<Item = (&AccountId, Amount)> {
        self.entries
            .iter()
            .filter(move |(key, _)| key.option == option)
            .map(|(key, shares)| (&key.account, *shares))
    }

    /// Sum of every account's shares at `option`. widened so it cannot overflow.
    pub fn outstanding(&self, option: usize) -> u128 {
        self.holders(option).map(|(_, s)| s.value() as u128).sum()
    }
}
