//! Observable engine events.
//!
//! Each event carries the full relevant record for off-engine indexing and
//! UI. The engine appends to an ordered log that collaborators drain; events
//! are never read back for control flow.

use crate::proposal::Ballot;
use covault_types::{Address, Amount, Timestamp, Weight};
use serde::{Deserialize, Serialize};

/// A state change observable by collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GovernanceEvent {
    ProposalCreated {
        id: u64,
        proposer: Address,
        recipient: Address,
        amount: Amount,
        description: String,
        deadline: Timestamp,
    },
    VoteCast {
        id: u64,
        voter: Address,
        ballot: Ballot,
        /// Weight snapshot applied to the tally
        weight: Weight,
    },
    ProposalExecuted {
        id: u64,
        recipient: Address,
        amount: Amount,
    },
    ProposalCanceled {
        id: u64,
        by: Address,
    },
    MembershipUpdated {
        member: Address,
        weight: Weight,
    },
    FundsDeposited {
        from: Address,
        amount: Amount,
    },
    FundsWithdrawn {
        to: Address,
        amount: Amount,
    },
}
