//! Typed governance tables over the column database.
//!
//! Layout:
//! - `proposals`: big-endian u64 id -> JSON proposal record. Ids are
//!   assigned sequentially and records are never deleted, so the column is
//!   append-only apart from in-place updates of a record's own fields.
//! - `ballots`: id ∥ member address -> JSON ballot record
//! - `members`: member address -> JSON weight
//! - `meta`: engine-level counters, pool balance, configuration
//!
//! Records are generic serde values; the governance crate owns the concrete
//! types, this crate owns the key layout.

use crate::db::Database;
use crate::error::StorageError;
use covault_types::{Address, Weight};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

const CF_PROPOSALS: &str = "proposals";
const CF_BALLOTS: &str = "ballots";
const CF_MEMBERS: &str = "members";
const CF_META: &str = "meta";

/// Governance state database.
pub struct GovernanceDb {
    db: Database,
}

impl GovernanceDb {
    /// Open (or create) the governance database at `path`.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        Ok(Self {
            db: Database::open(path)?,
        })
    }

    fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, StorageError> {
        serde_json::to_vec(value).map_err(|e| StorageError::Serialization(e.to_string()))
    }

    fn decode<T: DeserializeOwned>(column: &str, bytes: &[u8]) -> Result<T, StorageError> {
        serde_json::from_slice(bytes).map_err(|e| StorageError::Corrupt {
            column: column.to_string(),
            reason: e.to_string(),
        })
    }

    fn ballot_key(id: u64, voter: &Address) -> Vec<u8> {
        let mut key = Vec::with_capacity(8 + Address::LEN);
        key.extend_from_slice(&id.to_be_bytes());
        key.extend_from_slice(voter.as_bytes());
        key
    }

    /// Store a proposal record under its sequential id.
    pub fn put_proposal<T: Serialize>(&self, id: u64, record: &T) -> Result<(), StorageError> {
        self.db
            .put(CF_PROPOSALS, &id.to_be_bytes(), &Self::encode(record)?)
    }

    /// Load one proposal record.
    pub fn proposal<T: DeserializeOwned>(&self, id: u64) -> Result<Option<T>, StorageError> {
        match self.db.get(CF_PROPOSALS, &id.to_be_bytes())? {
            Some(bytes) => Ok(Some(Self::decode(CF_PROPOSALS, &bytes)?)),
            None => Ok(None),
        }
    }

    /// All proposal records in ascending id order.
    pub fn proposals<T: DeserializeOwned>(&self) -> Result<Vec<T>, StorageError> {
        self.db
            .scan(CF_PROPOSALS)?
            .iter()
            .map(|(_, bytes)| Self::decode(CF_PROPOSALS, bytes))
            .collect()
    }

    /// Store a ballot record keyed by (proposal id, member).
    pub fn put_ballot<T: Serialize>(
        &self,
        id: u64,
        voter: &Address,
        record: &T,
    ) -> Result<(), StorageError> {
        self.db
            .put(CF_BALLOTS, &Self::ballot_key(id, voter), &Self::encode(record)?)
    }

    /// Ballot records of one proposal, ascending by voter identity.
    pub fn ballots<T: DeserializeOwned>(
        &self,
        id: u64,
    ) -> Result<Vec<(Address, T)>, StorageError> {
        let mut out = Vec::new();
        for (key, bytes) in self.db.scan_prefix(CF_BALLOTS, &id.to_be_bytes())? {
            let voter = Address::from_slice(&key[8..])?;
            out.push((voter, Self::decode(CF_BALLOTS, &bytes)?));
        }
        Ok(out)
    }

    /// Store a member's voting weight.
    pub fn put_member_weight(&self, member: &Address, weight: Weight) -> Result<(), StorageError> {
        self.db
            .put(CF_MEMBERS, member.as_bytes(), &Self::encode(&weight)?)
    }

    /// All member weights, ascending by identity.
    pub fn members(&self) -> Result<Vec<(Address, Weight)>, StorageError> {
        let mut out = Vec::new();
        for (key, bytes) in self.db.scan(CF_MEMBERS)? {
            let member = Address::from_slice(&key)?;
            out.push((member, Self::decode(CF_MEMBERS, &bytes)?));
        }
        Ok(out)
    }

    /// Store an engine-level metadata value.
    pub fn put_meta<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        self.db.put(CF_META, key.as_bytes(), &Self::encode(value)?)
    }

    /// Load an engine-level metadata value.
    pub fn meta<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        match self.db.get(CF_META, key.as_bytes())? {
            Some(bytes) => Ok(Some(Self::decode(CF_META, &bytes)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Record {
        id: u64,
        note: String,
    }

    fn open_test_db() -> (GovernanceDb, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db = GovernanceDb::open(temp_dir.path()).unwrap();
        (db, temp_dir)
    }

    #[test]
    fn test_proposal_roundtrip() {
        let (db, _temp) = open_test_db();

        let record = Record { id: 1, note: "grant".to_string() };
        db.put_proposal(1, &record).unwrap();

        assert_eq!(db.proposal::<Record>(1).unwrap(), Some(record));
        assert_eq!(db.proposal::<Record>(2).unwrap(), None);
    }

    #[test]
    fn test_proposals_ascending_by_id() {
        let (db, _temp) = open_test_db();

        for id in [3u64, 1, 2] {
            db.put_proposal(id, &Record { id, note: String::new() }).unwrap();
        }

        let ids: Vec<u64> = db.proposals::<Record>().unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_ballots_grouped_by_proposal() {
        let (db, _temp) = open_test_db();

        let alice = Address::from_bytes([1u8; 20]);
        let bob = Address::from_bytes([2u8; 20]);

        db.put_ballot(1, &alice, &true).unwrap();
        db.put_ballot(1, &bob, &false).unwrap();
        db.put_ballot(2, &alice, &true).unwrap();

        let ballots = db.ballots::<bool>(1).unwrap();
        assert_eq!(ballots, vec![(alice, true), (bob, false)]);
        assert_eq!(db.ballots::<bool>(2).unwrap().len(), 1);
        assert!(db.ballots::<bool>(3).unwrap().is_empty());
    }

    #[test]
    fn test_member_weights() {
        let (db, _temp) = open_test_db();

        let alice = Address::from_bytes([1u8; 20]);
        db.put_member_weight(&alice, 5).unwrap();
        db.put_member_weight(&alice, 7).unwrap();

        assert_eq!(db.members().unwrap(), vec![(alice, 7)]);
    }

    #[test]
    fn test_meta_values() {
        let (db, _temp) = open_test_db();

        db.put_meta("next_id", &42u64).unwrap();
        assert_eq!(db.meta::<u64>("next_id").unwrap(), Some(42));
        assert_eq!(db.meta::<u64>("missing").unwrap(), None);
    }

    #[test]
    fn test_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let record = Record { id: 9, note: "persisted".to_string() };

        {
            let db = GovernanceDb::open(temp_dir.path()).unwrap();
            db.put_proposal(9, &record).unwrap();
            db.put_meta("balance", &1_000u128).unwrap();
        }

        let db = GovernanceDb::open(temp_dir.path()).unwrap();
        assert_eq!(db.proposal::<Record>(9).unwrap(), Some(record));
        assert_eq!(db.meta::<u128>("balance").unwrap(), Some(1_000));
    }
}
