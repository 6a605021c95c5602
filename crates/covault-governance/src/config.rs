//! Engine configuration.

use crate::error::GovernanceError;
use covault_types::{Address, Duration};
use serde::{Deserialize, Serialize};

/// Which balance gates proposal creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CommitmentPolicy {
    /// Check the requested amount against the raw pool balance. Several
    /// pending proposals may jointly commit more than the pool holds;
    /// execution re-validates against the pool at transfer time, so funds
    /// can never go negative.
    #[default]
    RawBalance,
    /// Check against funds not already committed to pending proposals.
    Unallocated,
}

/// Immutable engine configuration, validated at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GovernanceConfig {
    /// Minimum percentage of total weight that must have voted, in [0, 100].
    pub quorum_percent: u8,
    /// Voting window added to each proposal's creation time.
    pub voting_period: Duration,
    /// Privileged identity: sets weights, withdraws unallocated funds, may
    /// cancel any proposal.
    pub administrator: Address,
    /// Funds check applied at proposal creation.
    pub commitment_policy: CommitmentPolicy,
}

impl GovernanceConfig {
    pub fn new(
        quorum_percent: u8,
        voting_period: Duration,
        administrator: Address,
    ) -> Result<Self, GovernanceError> {
        if quorum_percent > 100 {
            return Err(GovernanceError::InvalidConfig(format!(
                "quorum_percent must be in [0, 100], got {quorum_percent}"
            )));
        }
        if voting_period.is_zero() {
            return Err(GovernanceError::InvalidConfig(
                "voting_period must be nonzero".to_string(),
            ));
        }
        if administrator.is_zero() {
            return Err(GovernanceError::InvalidConfig(
                "administrator must not be the zero identity".to_string(),
            ));
        }

        Ok(Self {
            quorum_percent,
            voting_period,
            administrator,
            commitment_policy: CommitmentPolicy::default(),
        })
    }

    /// Replace the creation-time funds check.
    pub fn with_commitment_policy(mut self, policy: CommitmentPolicy) -> Self {
        self.commitment_policy = policy;
        self
    }

    pub fn is_administrator(&self, who: &Address) -> bool {
        *who == self.administrator
    }
}
