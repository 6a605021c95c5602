//! Pool fund accounting.
//!
//! The ledger tracks the raw pool balance; the unallocated view subtracts
//! the amounts committed to outstanding proposals and is recomputed on
//! demand because proposal states change independently of ledger
//! operations.

use crate::error::GovernanceError;
use crate::proposal::ProposalStore;
use covault_types::{Address, Amount};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Failure reported by an external transfer sink.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("{0}")]
pub struct TransferError(pub String);

impl From<TransferError> for GovernanceError {
    fn from(e: TransferError) -> Self {
        GovernanceError::TransferFailed(e.0)
    }
}

/// Synchronous external fund transfer.
///
/// The call either moves the funds and returns `Ok`, or fails without
/// moving anything; it never suspends and is never retried by the engine.
pub trait Transfer {
    fn transfer(&mut self, to: &Address, amount: Amount) -> Result<(), TransferError>;
}

/// In-process sink crediting recipients in a map; never fails.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreditLedger {
    credits: BTreeMap<Address, Amount>,
}

impl CreditLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total amount transferred to `who` so far.
    pub fn credit_of(&self, who: &Address) -> Amount {
        self.credits.get(who).copied().unwrap_or(0)
    }
}

impl Transfer for CreditLedger {
    fn transfer(&mut self, to: &Address, amount: Amount) -> Result<(), TransferError> {
        let credit = self.credits.entry(*to).or_insert(0);
        *credit = credit.saturating_add(amount);
        Ok(())
    }
}

/// The shared pool.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TreasuryLedger {
    balance: Amount,
}

impl TreasuryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_balance(balance: Amount) -> Self {
        Self { balance }
    }

    /// Raw pool balance.
    pub fn balance(&self) -> Amount {
        self.balance
    }

    /// Credit the pool.
    pub fn deposit(&mut self, amount: Amount) {
        self.balance = self.balance.saturating_add(amount);
    }

    /// Funds not committed to outstanding proposals.
    pub fn unallocated(&self, store: &ProposalStore) -> Amount {
        let committed = store
            .all()
            .filter(|p| p.is_outstanding())
            .map(|p| p.amount)
            .fold(0u128, Amount::saturating_add);
        self.balance.saturating_sub(committed)
    }

    /// Remove funds from the pool; callers validate the amount first.
    pub(crate) fn debit(&mut self, amount: Amount) {
        self.balance = self.balance.saturating_sub(amount);
    }

    /// Return funds to the pool when a staged execution is rolled back.
    pub(crate) fn credit(&mut self, amount: Amount) {
        self.balance = self.balance.saturating_add(amount);
    }
}
