//! The governance engine: command surface and lifecycle state machine.
//!
//! Every mutating operation is an atomic, non-interleaved unit behind
//! `&mut self` and is applied in submission order; callers that share the
//! engine across threads wrap it in [`crate::SharedEngine`]. The current
//! wall-clock time is passed into each call and deadlines are evaluated
//! lazily against it; no background timer fires anywhere.

use crate::config::{CommitmentPolicy, GovernanceConfig};
use crate::error::GovernanceError;
use crate::events::GovernanceEvent;
use crate::members::MembershipRegistry;
use crate::proposal::{Ballot, ProposalStore};
use crate::query::QueryService;
use crate::quorum;
use crate::treasury::{Transfer, TreasuryLedger};
use covault_types::{Address, Amount, Timestamp};

/// Weighted treasury governance over a single fund pool.
pub struct GovernanceEngine {
    config: GovernanceConfig,
    members: MembershipRegistry,
    proposals: ProposalStore,
    treasury: TreasuryLedger,
    transfers: Box<dyn Transfer + Send>,
    events: Vec<GovernanceEvent>,
}

impl GovernanceEngine {
    /// Create an engine with an empty pool.
    ///
    /// The administrator is seeded as a member with weight 1.
    pub fn new(config: GovernanceConfig, transfers: Box<dyn Transfer + Send>) -> Self {
        let mut members = MembershipRegistry::new();
        members.set_weight(config.administrator, 1);

        Self {
            config,
            members,
            proposals: ProposalStore::new(),
            treasury: TreasuryLedger::new(),
            transfers,
            events: Vec::new(),
        }
    }

    /// Rebuild an engine from previously captured state.
    pub(crate) fn from_parts(
        config: GovernanceConfig,
        members: MembershipRegistry,
        proposals: ProposalStore,
        treasury: TreasuryLedger,
        transfers: Box<dyn Transfer + Send>,
    ) -> Self {
        Self {
            config,
            members,
            proposals,
            treasury,
            transfers,
            events: Vec::new(),
        }
    }

    pub fn config(&self) -> &GovernanceConfig {
        &self.config
    }

    pub fn members(&self) -> &MembershipRegistry {
        &self.members
    }

    pub fn proposals(&self) -> &ProposalStore {
        &self.proposals
    }

    pub fn treasury(&self) -> &TreasuryLedger {
        &self.treasury
    }

    /// Read-only query surface over the current state.
    pub fn queries(&self) -> QueryService<'_> {
        QueryService::new(&self.proposals, &self.members, &self.treasury, &self.config)
    }

    /// Drain the ordered event log.
    pub fn drain_events(&mut self) -> Vec<GovernanceEvent> {
        std::mem::take(&mut self.events)
    }

    /// Credit the pool with external funds.
    pub fn deposit(&mut self, from: Address, amount: Amount) {
        self.treasury.deposit(amount);
        tracing::info!(%from, amount, balance = self.treasury.balance(), "funds deposited");
        self.events.push(GovernanceEvent::FundsDeposited { from, amount });
    }

    /// Create a fund-transfer proposal and return its id.
    ///
    /// The funds check follows the configured [`CommitmentPolicy`]; under
    /// the default raw-balance policy, concurrently pending proposals may
    /// jointly request more than the pool holds.
    pub fn create_proposal(
        &mut self,
        proposer: Address,
        recipient: Address,
        amount: Amount,
        description: String,
        now: Timestamp,
    ) -> Result<u64, GovernanceError> {
        if !self.members.is_member(&proposer) {
            return Err(GovernanceError::Unauthorized(
                "proposer is not a member".to_string(),
            ));
        }
        if recipient.is_zero() {
            return Err(GovernanceError::InvalidRecipient);
        }

        match self.config.commitment_policy {
            CommitmentPolicy::RawBalance => {
                let balance = self.treasury.balance();
                if amount > balance {
                    return Err(GovernanceError::InsufficientFunds {
                        requested: amount,
                        balance,
                    });
                }
            }
            CommitmentPolicy::Unallocated => {
                let unallocated = self.treasury.unallocated(&self.proposals);
                if amount > unallocated {
                    return Err(GovernanceError::InsufficientUnallocated {
                        requested: amount,
                        unallocated,
                    });
                }
            }
        }

        let id = self.proposals.create(
            proposer,
            recipient,
            amount,
            description.clone(),
            now,
            self.config.voting_period,
        );
        let deadline = now + self.config.voting_period;

        tracing::info!(id, %proposer, %recipient, amount, %deadline, "proposal created");
        self.events.push(GovernanceEvent::ProposalCreated {
            id,
            proposer,
            recipient,
            amount,
            description,
            deadline,
        });
        Ok(id)
    }

    /// Cast a weighted ballot.
    ///
    /// The voter's weight is snapshotted at vote time; later weight changes
    /// never alter already-cast votes. If this ballot completes quorum and
    /// majority, execution fires immediately within the same operation; a
    /// transfer failure during that execution surfaces to this call while
    /// the ballot itself stays recorded.
    pub fn cast_vote(
        &mut self,
        id: u64,
        voter: Address,
        ballot: Ballot,
        now: Timestamp,
    ) -> Result<(), GovernanceError> {
        if self.proposals.get(id).is_none() {
            return Err(GovernanceError::ProposalNotFound(id));
        }
        let weight = self.members.weight_of(&voter);
        if weight == 0 {
            return Err(GovernanceError::Unauthorized(
                "voter is not a member".to_string(),
            ));
        }

        let total_weight = self.members.total_weight();
        let quorum_percent = self.config.quorum_percent;

        let ready = {
            let proposal = self
                .proposals
                .get_mut(id)
                .ok_or(GovernanceError::ProposalNotFound(id))?;
            proposal.record_ballot(voter, ballot, weight, now)?;
            quorum::thresholds_met(proposal, total_weight, quorum_percent)
        };

        tracing::info!(id, %voter, ?ballot, weight, "vote cast");
        self.events.push(GovernanceEvent::VoteCast {
            id,
            voter,
            ballot,
            weight,
        });

        if ready {
            self.finalize_execution(id)?;
        }
        Ok(())
    }

    /// Execute an approved proposal whose voting window has closed.
    ///
    /// Threshold crossings during the window execute automatically inside
    /// [`Self::cast_vote`]; this explicit trigger covers proposals whose
    /// thresholds were already met when the deadline passed.
    pub fn execute_proposal(&mut self, id: u64, now: Timestamp) -> Result<(), GovernanceError> {
        let total_weight = self.members.total_weight();
        let quorum_percent = self.config.quorum_percent;

        let proposal = self
            .proposals
            .get(id)
            .ok_or(GovernanceError::ProposalNotFound(id))?;
        if !quorum::can_execute(proposal, total_weight, quorum_percent, now) {
            return Err(GovernanceError::CannotExecute);
        }

        self.finalize_execution(id)
    }

    /// Cancel a proposal before it is finalized.
    pub fn cancel_proposal(&mut self, id: u64, caller: Address) -> Result<(), GovernanceError> {
        let is_admin = self.config.is_administrator(&caller);

        let proposal = self
            .proposals
            .get_mut(id)
            .ok_or(GovernanceError::ProposalNotFound(id))?;
        if proposal.executed || proposal.canceled {
            return Err(GovernanceError::AlreadyFinalized);
        }
        if caller != proposal.proposer && !is_admin {
            return Err(GovernanceError::Unauthorized(
                "only the proposer or the administrator may cancel".to_string(),
            ));
        }

        proposal.canceled = true;

        tracing::info!(id, %caller, "proposal canceled");
        self.events.push(GovernanceEvent::ProposalCanceled { id, by: caller });
        Ok(())
    }

    /// Set a member's voting weight. Administrator only.
    pub fn set_member_weight(
        &mut self,
        caller: Address,
        member: Address,
        weight: u64,
    ) -> Result<(), GovernanceError> {
        if !self.config.is_administrator(&caller) {
            return Err(GovernanceError::Unauthorized(
                "only the administrator may set weights".to_string(),
            ));
        }

        let previous = self.members.set_weight(member, weight);

        tracing::info!(
            %member,
            weight,
            previous,
            total_weight = self.members.total_weight(),
            "member weight updated"
        );
        self.events.push(GovernanceEvent::MembershipUpdated { member, weight });
        Ok(())
    }

    /// Withdraw unallocated funds from the pool. Administrator only.
    ///
    /// The unallocated amount is recomputed at call time; funds committed
    /// to pending proposals cannot be withdrawn.
    pub fn admin_withdraw(
        &mut self,
        caller: Address,
        to: Address,
        amount: Amount,
    ) -> Result<(), GovernanceError> {
        if !self.config.is_administrator(&caller) {
            return Err(GovernanceError::Unauthorized(
                "only the administrator may withdraw".to_string(),
            ));
        }
        let unallocated = self.treasury.unallocated(&self.proposals);
        if amount > unallocated {
            return Err(GovernanceError::InsufficientUnallocated {
                requested: amount,
                unallocated,
            });
        }
        if to.is_zero() {
            return Err(GovernanceError::InvalidRecipient);
        }

        // Nothing is staged before the sink call, so a failure here leaves
        // the pool untouched.
        self.transfers.transfer(&to, amount)?;
        self.treasury.debit(amount);

        tracing::info!(%to, amount, balance = self.treasury.balance(), "treasury withdrawal");
        self.events.push(GovernanceEvent::FundsWithdrawn { to, amount });
        Ok(())
    }

    /// Execution tail shared by the vote and execute paths.
    ///
    /// The `executed` flag is staged before the funds move so any observer
    /// of the record sees it finalized; if the transfer fails, the flag and
    /// the pool balance are rolled back together and the proposal stays
    /// un-executed.
    fn finalize_execution(&mut self, id: u64) -> Result<(), GovernanceError> {
        let (recipient, amount) = {
            let proposal = self
                .proposals
                .get_mut(id)
                .ok_or(GovernanceError::ProposalNotFound(id))?;
            proposal.executed = true;
            (proposal.recipient, proposal.amount)
        };

        if let Err(e) = self.pay_out(&recipient, amount) {
            if let Some(proposal) = self.proposals.get_mut(id) {
                proposal.executed = false;
            }
            tracing::warn!(id, %recipient, amount, error = %e, "transfer failed, execution rolled back");
            return Err(e);
        }

        tracing::info!(id, %recipient, amount, balance = self.treasury.balance(), "proposal executed");
        self.events.push(GovernanceEvent::ProposalExecuted {
            id,
            recipient,
            amount,
        });
        Ok(())
    }

    /// Move pool funds to a recipient through the transfer sink.
    ///
    /// Re-validates that the pool can cover the amount at transfer time:
    /// under the raw-balance commitment policy, earlier executions may have
    /// drained what this proposal assumed was available.
    fn pay_out(&mut self, to: &Address, amount: Amount) -> Result<(), GovernanceError> {
        let balance = self.treasury.balance();
        if amount > balance {
            return Err(GovernanceError::TransferFailed(format!(
                "pool balance {balance} cannot cover {amount}"
            )));
        }
        self.transfers.transfer(to, amount)?;
        self.treasury.debit(amount);
        Ok(())
    }
}
