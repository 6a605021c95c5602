//! Proposal records and the proposal store.
//!
//! A proposal is created open for voting and reaches at most one terminal
//! outcome: executed, failed once its deadline passes, or canceled.

use crate::error::GovernanceError;
use covault_types::{Address, Amount, Duration, Timestamp, Weight};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Ballot direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ballot {
    /// Vote in favor
    For,
    /// Vote against
    Against,
}

/// Lifecycle status, computed lazily from the record and the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalStatus {
    /// Open for voting, or approved and awaiting the explicit execute call
    Pending,
    /// Executed: funds moved to the recipient
    Passed,
    /// Deadline elapsed without the thresholds being met
    Failed,
    /// Canceled by the proposer or the administrator
    Canceled,
}

/// A fund-transfer proposal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    /// Sequential id, assigned at creation, never reused
    pub id: u64,
    /// Member that created the proposal
    pub proposer: Address,
    /// Identity receiving the funds on execution
    pub recipient: Address,
    /// Requested amount, fixed at creation
    pub amount: Amount,
    /// Free text, fixed at creation
    pub description: String,
    /// Weight-accumulated tally in favor
    pub votes_for: Weight,
    /// Weight-accumulated tally against
    pub votes_against: Weight,
    /// Voting closes at this instant
    pub deadline: Timestamp,
    /// One-way flag: funds were transferred
    pub executed: bool,
    /// One-way flag: proposal was withdrawn
    pub canceled: bool,
    /// Members that have cast a ballot
    pub voters: BTreeSet<Address>,
}

impl Proposal {
    pub fn new(
        id: u64,
        proposer: Address,
        recipient: Address,
        amount: Amount,
        description: String,
        created_at: Timestamp,
        voting_period: Duration,
    ) -> Self {
        Self {
            id,
            proposer,
            recipient,
            amount,
            description,
            votes_for: 0,
            votes_against: 0,
            deadline: created_at + voting_period,
            executed: false,
            canceled: false,
            voters: BTreeSet::new(),
        }
    }

    /// Open for voting: not finalized and before the deadline.
    pub fn is_open(&self, now: Timestamp) -> bool {
        !self.executed && !self.canceled && now < self.deadline
    }

    /// Neither executed nor canceled; the amount still counts against the
    /// pool's unallocated funds.
    pub fn is_outstanding(&self) -> bool {
        !self.executed && !self.canceled
    }

    /// Check if a member has already cast a ballot.
    pub fn has_voted(&self, voter: &Address) -> bool {
        self.voters.contains(voter)
    }

    /// Record a ballot with the voter's weight snapshot.
    ///
    /// Tallies only grow, and only while the proposal is open; the weight
    /// used is the one passed in, frozen at vote time.
    pub fn record_ballot(
        &mut self,
        voter: Address,
        ballot: Ballot,
        weight: Weight,
        now: Timestamp,
    ) -> Result<(), GovernanceError> {
        if !self.is_open(now) {
            return Err(GovernanceError::VotingClosed);
        }
        if self.voters.contains(&voter) {
            return Err(GovernanceError::AlreadyVoted);
        }

        match ballot {
            Ballot::For => self.votes_for = self.votes_for.saturating_add(weight),
            Ballot::Against => self.votes_against = self.votes_against.saturating_add(weight),
        }
        self.voters.insert(voter);
        Ok(())
    }

    /// Total weight cast either way.
    pub fn total_votes(&self) -> Weight {
        self.votes_for.saturating_add(self.votes_against)
    }
}

/// Authoritative table of proposals keyed by sequential id.
///
/// Ids start at 1 and are never reused; proposals are never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposalStore {
    proposals: BTreeMap<u64, Proposal>,
    next_id: u64,
}

impl ProposalStore {
    pub fn new() -> Self {
        Self {
            proposals: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Rebuild a store from persisted proposals and the saved id counter.
    pub fn from_parts(proposals: impl IntoIterator<Item = Proposal>, next_id: u64) -> Self {
        Self {
            proposals: proposals.into_iter().map(|p| (p.id, p)).collect(),
            next_id,
        }
    }

    /// Create a new proposal, assigning the next sequential id.
    pub fn create(
        &mut self,
        proposer: Address,
        recipient: Address,
        amount: Amount,
        description: String,
        now: Timestamp,
        voting_period: Duration,
    ) -> u64 {
        let id = self.next_id;
        self.next_id += 1;

        let proposal = Proposal::new(
            id,
            proposer,
            recipient,
            amount,
            description,
            now,
            voting_period,
        );
        self.proposals.insert(id, proposal);
        id
    }

    /// Get a proposal.
    pub fn get(&self, id: u64) -> Option<&Proposal> {
        self.proposals.get(&id)
    }

    /// Get a proposal mutably.
    pub fn get_mut(&mut self, id: u64) -> Option<&mut Proposal> {
        self.proposals.get_mut(&id)
    }

    /// All proposals in ascending id order.
    pub fn all(&self) -> impl Iterator<Item = &Proposal> {
        self.proposals.values()
    }

    /// Id the next created proposal will receive.
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    pub fn len(&self) -> usize {
        self.proposals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proposals.is_empty()
    }
}

impl Default for ProposalStore {
    fn default() -> Self {
        Self::new()
    }
}
