//! Full-state capture for durable storage.
//!
//! The engine itself is in-memory; a collaborator with durable storage
//! captures a snapshot after mutations and saves it through
//! [`GovernanceDb`], then restores on restart. The transfer sink is not
//! part of the captured state and is supplied again at restore time.

use crate::config::GovernanceConfig;
use crate::engine::GovernanceEngine;
use crate::members::MembershipRegistry;
use crate::proposal::{Proposal, ProposalStore};
use crate::treasury::{Transfer, TreasuryLedger};
use covault_storage::{GovernanceDb, StorageError};
use covault_types::Amount;
use serde::{Deserialize, Serialize};

const META_CONFIG: &str = "config";
const META_NEXT_ID: &str = "next_id";
const META_BALANCE: &str = "balance";

/// Serializable capture of the engine state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GovernanceSnapshot {
    pub config: GovernanceConfig,
    pub members: MembershipRegistry,
    pub proposals: ProposalStore,
    pub balance: Amount,
}

impl GovernanceSnapshot {
    /// Capture the engine's current state.
    pub fn capture(engine: &GovernanceEngine) -> Self {
        Self {
            config: engine.config().clone(),
            members: engine.members().clone(),
            proposals: engine.proposals().clone(),
            balance: engine.treasury().balance(),
        }
    }

    /// Rebuild an engine around this state and a fresh transfer sink.
    pub fn restore(self, transfers: Box<dyn Transfer + Send>) -> GovernanceEngine {
        GovernanceEngine::from_parts(
            self.config,
            self.members,
            self.proposals,
            TreasuryLedger::with_balance(self.balance),
            transfers,
        )
    }

    /// Persist into the proposal, ballot and member tables plus metadata.
    pub fn save(&self, db: &GovernanceDb) -> Result<(), StorageError> {
        for proposal in self.proposals.all() {
            db.put_proposal(proposal.id, proposal)?;
            for voter in &proposal.voters {
                db.put_ballot(proposal.id, voter, &true)?;
            }
        }
        for (member, weight) in self.members.members() {
            db.put_member_weight(member, weight)?;
        }
        db.put_meta(META_CONFIG, &self.config)?;
        db.put_meta(META_NEXT_ID, &self.proposals.next_id())?;
        db.put_meta(META_BALANCE, &self.balance)?;

        tracing::debug!(
            proposals = self.proposals.len(),
            balance = self.balance,
            "governance snapshot saved"
        );
        Ok(())
    }

    /// Load a previously saved snapshot; `None` if the database is empty.
    pub fn load(db: &GovernanceDb) -> Result<Option<Self>, StorageError> {
        let Some(config) = db.meta::<GovernanceConfig>(META_CONFIG)? else {
            return Ok(None);
        };
        let next_id = db.meta::<u64>(META_NEXT_ID)?.unwrap_or(1);
        let balance = db.meta::<Amount>(META_BALANCE)?.unwrap_or(0);

        let proposals: Vec<Proposal> = db.proposals()?;
        let members = db.members()?;

        Ok(Some(Self {
            config,
            members: MembershipRegistry::from_weights(members),
            proposals: ProposalStore::from_parts(proposals, next_id),
            balance,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GovernanceConfig;
    use crate::proposal::Ballot;
    use crate::treasury::CreditLedger;
    use covault_types::{Address, Duration, Timestamp};
    use tempfile::TempDir;

    const T0: Timestamp = Timestamp::from_secs(1_000);

    fn member(tag: u8) -> Address {
        Address::from_bytes([tag; 20])
    }

    fn admin() -> Address {
        member(0xad)
    }

    fn busy_engine() -> GovernanceEngine {
        let config = GovernanceConfig::new(51, Duration::from_days(7), admin()).unwrap();
        let mut engine = GovernanceEngine::new(config, Box::new(CreditLedger::new()));
        engine.deposit(admin(), 1_000);
        engine.set_member_weight(admin(), member(1), 2).unwrap();

        let id = engine
            .create_proposal(member(1), member(9), 300, "grant".to_string(), T0)
            .unwrap();
        engine.cast_vote(id, admin(), Ballot::Against, T0).unwrap();
        engine
            .create_proposal(admin(), member(8), 100, "ops".to_string(), T0)
            .unwrap();
        engine
    }

    #[test]
    fn test_capture_restore_roundtrip_in_memory() {
        let engine = busy_engine();
        let snapshot = GovernanceSnapshot::capture(&engine);
        let restored = snapshot.restore(Box::new(CreditLedger::new()));

        assert_eq!(restored.treasury().balance(), engine.treasury().balance());
        assert_eq!(restored.members().total_weight(), 3);
        assert_eq!(restored.proposals().len(), 2);
        assert_eq!(restored.proposals().next_id(), 3);
        assert_eq!(
            restored.proposals().get(1).unwrap(),
            engine.proposals().get(1).unwrap()
        );
    }

    #[test]
    fn test_save_load_through_database() {
        let temp_dir = TempDir::new().unwrap();
        let engine = busy_engine();

        {
            let db = GovernanceDb::open(temp_dir.path()).unwrap();
            GovernanceSnapshot::capture(&engine).save(&db).unwrap();
        }

        let db = GovernanceDb::open(temp_dir.path()).unwrap();
        let loaded = GovernanceSnapshot::load(&db).unwrap().unwrap();

        assert_eq!(loaded.balance, 1_000);
        assert_eq!(loaded.members.total_weight(), 3);
        assert_eq!(loaded.proposals.len(), 2);
        assert_eq!(loaded.proposals.next_id(), 3);

        let first = loaded.proposals.get(1).unwrap();
        assert_eq!(first.votes_against, 1);
        assert!(first.has_voted(&admin()));

        // The ballot table mirrors the voter sets
        let ballots = db.ballots::<bool>(1).unwrap();
        assert_eq!(ballots.len(), 1);
        assert_eq!(ballots[0].0, admin());
    }

    #[test]
    fn test_snapshot_serializes_as_json() {
        let engine = busy_engine();
        let snapshot = GovernanceSnapshot::capture(&engine);

        let json = serde_json::to_string(&snapshot).unwrap();
        let back: GovernanceSnapshot = serde_json::from_str(&json).unwrap();

        assert_eq!(back.balance, snapshot.balance);
        assert_eq!(back.members.total_weight(), snapshot.members.total_weight());
        assert_eq!(
            back.proposals.get(1).unwrap(),
            snapshot.proposals.get(1).unwrap()
        );
    }

    #[test]
    fn test_load_from_empty_database() {
        let temp_dir = TempDir::new().unwrap();
        let db = GovernanceDb::open(temp_dir.path()).unwrap();
        assert!(GovernanceSnapshot::load(&db).unwrap().is_none());
    }

    #[test]
    fn test_restored_engine_continues_the_id_sequence() {
        let engine = busy_engine();
        let snapshot = GovernanceSnapshot::capture(&engine);
        let mut restored = snapshot.restore(Box::new(CreditLedger::new()));

        let id = restored
            .create_proposal(admin(), member(7), 50, "next".to_string(), T0)
            .unwrap();
        assert_eq!(id, 3);
    }
}
