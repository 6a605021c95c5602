//! Shared engine handle.
//!
//! The engine is single-writer by construction; this handle adds the
//! process-wide sequencing lock for callers that submit commands from
//! several threads. Operations are applied in lock-acquisition order and
//! never interleave mid-operation.

use crate::engine::GovernanceEngine;
use crate::error::GovernanceError;
use crate::events::GovernanceEvent;
use crate::proposal::Ballot;
use covault_types::{Address, Amount, Timestamp};
use parking_lot::Mutex;
use std::sync::Arc;

/// Cloneable, thread-safe handle around a [`GovernanceEngine`].
#[derive(Clone)]
pub struct SharedEngine {
    inner: Arc<Mutex<GovernanceEngine>>,
}

impl SharedEngine {
    pub fn new(engine: GovernanceEngine) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    /// Run `f` with exclusive access to the engine.
    ///
    /// Queries borrow from the engine, so reads go through the same
    /// closure: `handle.with(|e| e.queries().unallocated())`.
    pub fn with<R>(&self, f: impl FnOnce(&mut GovernanceEngine) -> R) -> R {
        let mut engine = self.inner.lock();
        f(&mut engine)
    }

    pub fn deposit(&self, from: Address, amount: Amount) {
        self.with(|e| e.deposit(from, amount))
    }

    pub fn create_proposal(
        &self,
        proposer: Address,
        recipient: Address,
        amount: Amount,
        description: String,
        now: Timestamp,
    ) -> Result<u64, GovernanceError> {
        self.with(|e| e.create_proposal(proposer, recipient, amount, description, now))
    }

    pub fn cast_vote(
        &self,
        id: u64,
        voter: Address,
        ballot: Ballot,
        now: Timestamp,
    ) -> Result<(), GovernanceError> {
        self.with(|e| e.cast_vote(id, voter, ballot, now))
    }

    pub fn execute_proposal(&self, id: u64, now: Timestamp) -> Result<(), GovernanceError> {
        self.with(|e| e.execute_proposal(id, now))
    }

    pub fn cancel_proposal(&self, id: u64, caller: Address) -> Result<(), GovernanceError> {
        self.with(|e| e.cancel_proposal(id, caller))
    }

    pub fn set_member_weight(
        &self,
        caller: Address,
        member: Address,
        weight: u64,
    ) -> Result<(), GovernanceError> {
        self.with(|e| e.set_member_weight(caller, member, weight))
    }

    pub fn admin_withdraw(
        &self,
        caller: Address,
        to: Address,
        amount: Amount,
    ) -> Result<(), GovernanceError> {
        self.with(|e| e.admin_withdraw(caller, to, amount))
    }

    pub fn drain_events(&self) -> Vec<GovernanceEvent> {
        self.with(|e| e.drain_events())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GovernanceConfig;
    use crate::treasury::CreditLedger;
    use covault_types::Duration;
    use std::thread;

    const T0: Timestamp = Timestamp::from_secs(1_000);

    fn member(tag: u8) -> Address {
        Address::from_bytes([tag; 20])
    }

    fn admin() -> Address {
        member(0xad)
    }

    fn shared_engine() -> SharedEngine {
        let config = GovernanceConfig::new(51, Duration::from_days(7), admin()).unwrap();
        let handle = SharedEngine::new(GovernanceEngine::new(
            config,
            Box::new(CreditLedger::new()),
        ));
        handle.deposit(admin(), 1_000);
        handle
    }

    #[test]
    fn test_commands_through_the_handle() {
        let handle = shared_engine();
        handle.set_member_weight(admin(), member(1), 2).unwrap();

        let id = handle
            .create_proposal(admin(), member(9), 300, "grant".to_string(), T0)
            .unwrap();
        handle.cast_vote(id, member(1), Ballot::For, T0).unwrap();

        assert!(handle.with(|e| e.proposals().get(id).unwrap().executed));
        assert_eq!(handle.with(|e| e.queries().balance()), 700);
        assert!(!handle.drain_events().is_empty());
    }

    #[test]
    fn test_concurrent_votes_serialize() {
        // High quorum keeps the proposal open while the voters pile in
        let config = GovernanceConfig::new(100, Duration::from_days(7), admin()).unwrap();
        let handle = SharedEngine::new(GovernanceEngine::new(
            config,
            Box::new(CreditLedger::new()),
        ));
        handle.deposit(admin(), 1_000);

        for tag in 1..=8u8 {
            handle.set_member_weight(admin(), member(tag), 1).unwrap();
        }
        let id = handle
            .create_proposal(admin(), member(9), 300, "grant".to_string(), T0)
            .unwrap();

        let threads: Vec<_> = (1..=8u8)
            .map(|tag| {
                let handle = handle.clone();
                thread::spawn(move || handle.cast_vote(id, member(tag), Ballot::For, T0))
            })
            .collect();
        for t in threads {
            t.join().unwrap().unwrap();
        }

        // Every ballot landed exactly once
        handle.with(|e| {
            let proposal = e.proposals().get(id).unwrap();
            assert_eq!(proposal.votes_for, 8);
            assert_eq!(proposal.voters.len(), 8);
        });
    }
}
