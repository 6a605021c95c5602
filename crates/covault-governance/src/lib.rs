//! Covault Governance - weighted treasury governance engine.
//!
//! This crate provides:
//! - Proposal lifecycle management with automatic execution on threshold
//!   crossing
//! - Token-weighted voting with quorum and strict-majority evaluation
//! - Membership weight registry with a cached aggregate
//! - Treasury fund accounting (raw balance vs. unallocated funds)
//! - Read-only query surface and an observable event stream

pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod handle;
pub mod members;
pub mod proposal;
pub mod query;
pub mod quorum;
pub mod snapshot;
pub mod treasury;

pub use config::{CommitmentPolicy, GovernanceConfig};
pub use engine::GovernanceEngine;
pub use error::GovernanceError;
pub use events::GovernanceEvent;
pub use handle::SharedEngine;
pub use members::MembershipRegistry;
pub use proposal::{Ballot, Proposal, ProposalStatus, ProposalStore};
pub use query::QueryService;
pub use snapshot::GovernanceSnapshot;
pub use treasury::{CreditLedger, Transfer, TransferError, TreasuryLedger};
