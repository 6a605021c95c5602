//! Read-only filters and sorts over the proposal store.
//!
//! Pure views; nothing here mutates state or emits events.

use crate::config::GovernanceConfig;
use crate::members::MembershipRegistry;
use crate::proposal::{Proposal, ProposalStatus, ProposalStore};
use crate::quorum;
use crate::treasury::TreasuryLedger;
use covault_types::{Address, Amount, Timestamp, Weight};

/// Borrowed query surface; construct via `GovernanceEngine::queries`.
pub struct QueryService<'a> {
    proposals: &'a ProposalStore,
    members: &'a MembershipRegistry,
    treasury: &'a TreasuryLedger,
    config: &'a GovernanceConfig,
}

impl<'a> QueryService<'a> {
    pub(crate) fn new(
        proposals: &'a ProposalStore,
        members: &'a MembershipRegistry,
        treasury: &'a TreasuryLedger,
        config: &'a GovernanceConfig,
    ) -> Self {
        Self {
            proposals,
            members,
            treasury,
            config,
        }
    }

    /// One proposal by id.
    pub fn get(&self, id: u64) -> Option<&'a Proposal> {
        self.proposals.get(id)
    }

    /// All proposals, ascending by id.
    pub fn all(&self) -> Vec<&'a Proposal> {
        self.proposals.all().collect()
    }

    /// Proposals still open for voting.
    pub fn active(&self, now: Timestamp) -> Vec<&'a Proposal> {
        self.proposals.all().filter(|p| p.is_open(now)).collect()
    }

    /// Proposals whose funds were transferred.
    pub fn executed(&self) -> Vec<&'a Proposal> {
        self.proposals.all().filter(|p| p.executed).collect()
    }

    /// Proposals withdrawn before finalization.
    pub fn canceled(&self) -> Vec<&'a Proposal> {
        self.proposals.all().filter(|p| p.canceled).collect()
    }

    /// Proposals created by one member.
    pub fn by_proposer(&self, proposer: &Address) -> Vec<&'a Proposal> {
        self.proposals
            .all()
            .filter(|p| p.proposer == *proposer)
            .collect()
    }

    /// Proposals a member has cast a ballot on.
    pub fn by_voter(&self, voter: &Address) -> Vec<&'a Proposal> {
        self.proposals
            .all()
            .filter(|p| p.has_voted(voter))
            .collect()
    }

    /// The `n` proposals with the highest tallies in favor.
    ///
    /// Descending by `votes_for`; equal tallies order by ascending id so
    /// repeated calls return the same ranking.
    pub fn top_voted(&self, n: usize) -> Vec<&'a Proposal> {
        let mut ranked: Vec<&Proposal> = self.proposals.all().collect();
        ranked.sort_by_key(|p| (std::cmp::Reverse(p.votes_for), p.id));
        ranked.truncate(n);
        ranked
    }

    /// Whether a member has cast a ballot on a proposal.
    pub fn has_voted(&self, id: u64, member: &Address) -> bool {
        self.proposals
            .get(id)
            .map(|p| p.has_voted(member))
            .unwrap_or(false)
    }

    /// Lifecycle status of one proposal at `now`.
    pub fn status(&self, id: u64, now: Timestamp) -> Option<ProposalStatus> {
        self.proposals.get(id).map(|p| {
            quorum::status(
                p,
                self.members.total_weight(),
                self.config.quorum_percent,
                now,
            )
        })
    }

    /// Raw pool balance.
    pub fn balance(&self) -> Amount {
        self.treasury.balance()
    }

    /// Pool funds not committed to pending proposals.
    pub fn unallocated(&self) -> Amount {
        self.treasury.unallocated(self.proposals)
    }

    /// A member's current voting weight.
    pub fn member_weight(&self, member: &Address) -> Weight {
        self.members.weight_of(member)
    }

    /// Sum of all member weights.
    pub fn total_weight(&self) -> Weight {
        self.members.total_weight()
    }
}
