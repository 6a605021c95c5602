//! Quorum and majority evaluation.
//!
//! Pure functions over a proposal's tallies and the registry's total weight;
//! no side effects. Percentage arithmetic uses integer division truncating
//! toward zero.

use crate::proposal::{Proposal, ProposalStatus};
use covault_types::{Timestamp, Weight};

/// Quorum and strict majority both met for the current tallies.
///
/// Quorum compares the participation percentage of the total weight against
/// the configured minimum; a tie between the tallies fails the majority. A
/// total weight of zero can never reach quorum.
pub fn thresholds_met(proposal: &Proposal, total_weight: Weight, quorum_percent: u8) -> bool {
    if total_weight == 0 {
        return false;
    }

    let total_votes = proposal.total_votes() as u128;
    let quorum_reached = total_votes * 100 / total_weight as u128 >= quorum_percent as u128;

    quorum_reached && proposal.votes_for > proposal.votes_against
}

/// Whether the explicit execute path may fire.
///
/// Requires an unfinalized proposal whose voting window has closed with the
/// thresholds met. Threshold crossings before the deadline execute through
/// the vote path instead, not through this check.
pub fn can_execute(
    proposal: &Proposal,
    total_weight: Weight,
    quorum_percent: u8,
    now: Timestamp,
) -> bool {
    if proposal.executed || proposal.canceled {
        return false;
    }
    if now < proposal.deadline {
        return false;
    }
    thresholds_met(proposal, total_weight, quorum_percent)
}

/// Lazily computed lifecycle status.
///
/// A proposal past its deadline with the thresholds met but not yet
/// executed reports `Pending`: it still awaits the explicit execute call.
pub fn status(
    proposal: &Proposal,
    total_weight: Weight,
    quorum_percent: u8,
    now: Timestamp,
) -> ProposalStatus {
    if proposal.canceled {
        return ProposalStatus::Canceled;
    }
    if proposal.executed {
        return ProposalStatus::Passed;
    }
    if now >= proposal.deadline && !thresholds_met(proposal, total_weight, quorum_percent) {
        return ProposalStatus::Failed;
    }
    ProposalStatus::Pending
}
