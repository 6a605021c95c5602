//! Column-oriented JSON file database.
//!
//! Columns are independent key spaces; keys and values are raw bytes,
//! hex-encoded in the on-disk JSON document. The whole document is
//! rewritten on every mutation, which keeps recovery trivial: the file is
//! either the previous state or the new one.

use crate::error::StorageError;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// column name -> hex key -> hex value
type Columns = BTreeMap<String, BTreeMap<String, String>>;

const DATA_FILE: &str = "covault.json";

/// File-backed column database.
pub struct Database {
    path: PathBuf,
    data: Arc<RwLock<Columns>>,
}

impl Database {
    /// Open (or create) a database directory.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        fs::create_dir_all(path)?;

        let data_file = path.join(DATA_FILE);
        let data = if data_file.exists() {
            let content = fs::read_to_string(&data_file)?;
            serde_json::from_str(&content)
                .map_err(|e| StorageError::Deserialization(e.to_string()))?
        } else {
            Columns::new()
        };

        Ok(Self {
            path: path.to_path_buf(),
            data: Arc::new(RwLock::new(data)),
        })
    }

    /// Get a value from a column.
    pub fn get(&self, column: &str, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        let data = self.data.read();
        match data.get(column).and_then(|col| col.get(&hex::encode(key))) {
            Some(value) => {
                let bytes = hex::decode(value)
                    .map_err(|e| StorageError::Deserialization(e.to_string()))?;
                Ok(Some(bytes))
            }
            None => Ok(None),
        }
    }

    /// Put a value into a column.
    pub fn put(&self, column: &str, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
        // Clone under the lock, persist outside it
        let to_persist = {
            let mut data = self.data.write();
            data.entry(column.to_string())
                .or_default()
                .insert(hex::encode(key), hex::encode(value));
            data.clone()
        };
        self.persist(&to_persist)
    }

    /// Delete a value from a column.
    pub fn delete(&self, column: &str, key: &[u8]) -> Result<(), StorageError> {
        let to_persist = {
            let mut data = self.data.write();
            if let Some(col) = data.get_mut(column) {
                col.remove(&hex::encode(key));
            }
            data.clone()
        };
        self.persist(&to_persist)
    }

    /// All entries of a column in ascending key order.
    ///
    /// Hex encoding preserves byte order, so fixed-width big-endian keys
    /// come back numerically sorted.
    pub fn scan(&self, column: &str) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StorageError> {
        let data = self.data.read();
        let Some(col) = data.get(column) else {
            return Ok(Vec::new());
        };

        let mut entries = Vec::with_capacity(col.len());
        for (key, value) in col {
            let decode = |s: &str| {
                hex::decode(s).map_err(|e| StorageError::Corrupt {
                    column: column.to_string(),
                    reason: e.to_string(),
                })
            };
            entries.push((decode(key)?, decode(value)?));
        }
        Ok(entries)
    }

    /// Entries of a column whose key starts with `prefix`, ascending.
    pub fn scan_prefix(
        &self,
        column: &str,
        prefix: &[u8],
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StorageError> {
        let mut entries = self.scan(column)?;
        entries.retain(|(key, _)| key.starts_with(prefix));
        Ok(entries)
    }

    fn persist(&self, data: &Columns) -> Result<(), StorageError> {
        let content = serde_json::to_string_pretty(data)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        fs::write(self.path.join(DATA_FILE), content)?;
        tracing::debug!(path = %self.path.display(), "database persisted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_test_db() -> (Database, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db = Database::open(temp_dir.path()).unwrap();
        (db, temp_dir)
    }

    #[test]
    fn test_put_and_get() {
        let (db, _temp) = open_test_db();

        db.put("meta", b"key", b"value").unwrap();
        assert_eq!(db.get("meta", b"key").unwrap(), Some(b"value".to_vec()));
    }

    #[test]
    fn test_get_nonexistent() {
        let (db, _temp) = open_test_db();
        assert_eq!(db.get("meta", b"missing").unwrap(), None);
    }

    #[test]
    fn test_delete() {
        let (db, _temp) = open_test_db();

        db.put("meta", b"key", b"value").unwrap();
        db.delete("meta", b"key").unwrap();
        assert_eq!(db.get("meta", b"key").unwrap(), None);
    }

    #[test]
    fn test_overwrite() {
        let (db, _temp) = open_test_db();

        db.put("meta", b"key", b"old").unwrap();
        db.put("meta", b"key", b"new").unwrap();
        assert_eq!(db.get("meta", b"key").unwrap(), Some(b"new".to_vec()));
    }

    #[test]
    fn test_columns_are_independent() {
        let (db, _temp) = open_test_db();

        db.put("a", b"key", b"1").unwrap();
        db.put("b", b"key", b"2").unwrap();

        assert_eq!(db.get("a", b"key").unwrap(), Some(b"1".to_vec()));
        assert_eq!(db.get("b", b"key").unwrap(), Some(b"2".to_vec()));
        assert_eq!(db.get("a", b"other").unwrap(), None);
    }

    #[test]
    fn test_scan_is_key_ordered() {
        let (db, _temp) = open_test_db();

        db.put("ids", &3u64.to_be_bytes(), b"three").unwrap();
        db.put("ids", &1u64.to_be_bytes(), b"one").unwrap();
        db.put("ids", &2u64.to_be_bytes(), b"two").unwrap();

        let entries = db.scan("ids").unwrap();
        let values: Vec<&[u8]> = entries.iter().map(|(_, v)| v.as_slice()).collect();
        assert_eq!(values, vec![b"one".as_slice(), b"two", b"three"]);
    }

    #[test]
    fn test_scan_prefix() {
        let (db, _temp) = open_test_db();

        db.put("ballots", b"\x01\x01aaa", b"a").unwrap();
        db.put("ballots", b"\x01\x01bbb", b"b").unwrap();
        db.put("ballots", b"\x01\x02ccc", b"c").unwrap();

        let entries = db.scan_prefix("ballots", b"\x01\x01").unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn test_persistence_across_reopen() {
        let temp_dir = TempDir::new().unwrap();

        {
            let db = Database::open(temp_dir.path()).unwrap();
            db.put("meta", b"key", b"value").unwrap();
        }

        let db = Database::open(temp_dir.path()).unwrap();
        assert_eq!(db.get("meta", b"key").unwrap(), Some(b"value".to_vec()));
    }
}
