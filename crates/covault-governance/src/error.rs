use covault_types::Amount;
use thiserror::Error;

/// Errors that can occur in governance operations.
///
/// Grouped by cause: authorization (`Unauthorized`), validity
/// (`ProposalNotFound`, `InvalidRecipient`, `InvalidConfig`), state conflicts
/// (`AlreadyVoted`, `AlreadyFinalized`, `VotingClosed`, `CannotExecute`),
/// resource limits (`InsufficientFunds`, `InsufficientUnallocated`) and
/// external transfer failure (`TransferFailed`). All are surfaced
/// synchronously to the caller of the mutating operation; the engine never
/// retries on its own.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GovernanceError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Proposal not found: {0}")]
    ProposalNotFound(u64),

    #[error("Invalid recipient")]
    InvalidRecipient,

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Already voted")]
    AlreadyVoted,

    #[error("Proposal already finalized")]
    AlreadyFinalized,

    #[error("Voting closed")]
    VotingClosed,

    #[error("Proposal cannot be executed")]
    CannotExecute,

    #[error("Insufficient funds: requested {requested}, balance {balance}")]
    InsufficientFunds { requested: Amount, balance: Amount },

    #[error("Insufficient unallocated funds: requested {requested}, unallocated {unallocated}")]
    InsufficientUnallocated {
        requested: Amount,
        unallocated: Amount,
    },

    #[error("Transfer failed: {0}")]
    TransferFailed(String),
}
