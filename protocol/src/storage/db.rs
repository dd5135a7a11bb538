//! # LedgerDb — Persistent Storage Engine
//!
//! The persistence layer for a Regalium node, built on sled's embedded
//! key-value store. The ledger itself is a plain in-memory state machine;
//! this module keeps the latest committed copy on disk together with an
//! append-only journal of the operations that produced it.
//!
//! ## Tree Layout
//!
//! | Tree        | Key                 | Value                      |
//! |-------------|---------------------|----------------------------|
//! | `snapshots` | `"ledger"`          | `bincode(ledger state)`    |
//! | `journal`   | `sequence` (8B BE)  | `json(journal entry)`      |
//! | `metadata`  | key (UTF-8)         | value (bytes)              |
//!
//! Sequence numbers are big-endian so sled's lexicographic ordering matches
//! numeric ordering and the journal iterates oldest-first.
//!
//! ## Atomicity
//!
//! [`LedgerDb::commit`] writes the new snapshot, its journal entry and the
//! bumped operation counter in one multi-tree sled transaction. Either all
//! three land or none do, so the snapshot on disk always matches the tail of
//! the journal.

use serde::de::DeserializeOwned;
use serde::Serialize;
use sled::transaction::{ConflictableTransactionError, TransactionError};
use sled::{Db, Transactional, Tree};
use std::path::Path;

// ---------------------------------------------------------------------------
// Error Type
// ---------------------------------------------------------------------------

/// Errors that can occur during database operations.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("corrupt metadata entry: {0}")]
    Corrupt(String),
}

pub type DbResult<T> = Result<T, DbError>;

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

/// Key of the single live snapshot in the `snapshots` tree.
const SNAPSHOT_KEY: &[u8] = b"ledger";

/// Well-known key in the `metadata` tree for the number of committed operations.
const META_OPERATION_COUNT: &[u8] = b"operation_count";

fn decode_u64(bytes: &[u8]) -> Option<u64> {
    let arr: [u8; 8] = bytes.try_into().ok()?;
    Some(u64::from_be_bytes(arr))
}

// ---------------------------------------------------------------------------
// LedgerDb
// ---------------------------------------------------------------------------

/// Persistent storage for ledger snapshots and the operation journal.
///
/// Generic over the snapshot and journal types so this crate stays ignorant
/// of the ledger's internals. Cheap to clone; sled handles are reference
/// counted and safe to share across threads.
#[derive(Debug, Clone)]
pub struct LedgerDb {
    db: Db,
    snapshots: Tree,
    journal: Tree,
    metadata: Tree,
}

impl LedgerDb {
    /// Open or create a database at the given filesystem path.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let db = sled::open(path)?;
        Self::from_db(db)
    }

    /// Create a temporary database that is removed when dropped.
    ///
    /// Ideal for unit tests: no filesystem side effects, no cleanup needed.
    pub fn open_temporary() -> DbResult<Self> {
        let config = sled::Config::new().temporary(true);
        let db = config.open()?;
        Self::from_db(db)
    }

    fn from_db(db: Db) -> DbResult<Self> {
        let snapshots = db.open_tree("snapshots")?;
        let journal = db.open_tree("journal")?;
        let metadata = db.open_tree("metadata")?;

        Ok(Self {
            db,
            snapshots,
            journal,
            metadata,
        })
    }

    // -- Snapshots ----------------------------------------------------------

    /// Store `state` as the live snapshot without touching the journal.
    ///
    /// Used once at genesis; every later write goes through [`commit`](Self::commit).
    pub fn put_genesis<T: Serialize>(&self, state: &T) -> DbResult<()> {
        let bytes =
            bincode::serialize(state).map_err(|e| DbError::Serialization(e.to_string()))?;
        self.snapshots.insert(SNAPSHOT_KEY, bytes)?;
        self.metadata
            .insert(META_OPERATION_COUNT, &0u64.to_be_bytes()[..])?;
        self.db.flush()?;
        tracing::debug!("genesis snapshot written");
        Ok(())
    }

    /// Atomically replace the snapshot with `state` and append `entry` to the
    /// journal. Returns the journal sequence number assigned to `entry`.
    pub fn commit<T: Serialize, E: Serialize>(&self, state: &T, entry: &E) -> DbResult<u64> {
        let snapshot =
            bincode::serialize(state).map_err(|e| DbError::Serialization(e.to_string()))?;
        let record =
            serde_json::to_vec(entry).map_err(|e| DbError::Serialization(e.to_string()))?;

        let seq = (&self.snapshots, &self.journal, &self.metadata)
            .transaction(|(snapshots, journal, metadata)| {
                let seq = match metadata.get(META_OPERATION_COUNT)? {
                    Some(raw) => match decode_u64(&raw) {
                        Some(n) => n,
                        None => return Err(ConflictableTransactionError::Abort(())),
                    },
                    None => 0,
                };
                snapshots.insert(SNAPSHOT_KEY, snapshot.as_slice())?;
                journal.insert(&seq.to_be_bytes()[..], record.as_slice())?;
                metadata.insert(META_OPERATION_COUNT, &(seq + 1).to_be_bytes()[..])?;
                Ok(seq)
            })
            .map_err(|e: TransactionError<()>| match e {
                TransactionError::Abort(()) => {
                    DbError::Corrupt("operation_count is not an 8-byte integer".into())
                }
                TransactionError::Storage(e) => DbError::Sled(e),
            })?;

        self.db.flush()?;
        Ok(seq)
    }

    /// Load and decode the live snapshot, or `None` on a fresh database.
    pub fn load_snapshot<T: DeserializeOwned>(&self) -> DbResult<Option<T>> {
        match self.snapshots.get(SNAPSHOT_KEY)? {
            Some(bytes) => {
                let state = bincode::deserialize(&bytes)
                    .map_err(|e| DbError::Serialization(e.to_string()))?;
                Ok(Some(state))
            }
            None => Ok(None),
        }
    }

    /// Raw bytes of the live snapshot, for fingerprinting.
    pub fn snapshot_bytes(&self) -> DbResult<Option<Vec<u8>>> {
        Ok(self.snapshots.get(SNAPSHOT_KEY)?.map(|b| b.to_vec()))
    }

    // -- Journal ------------------------------------------------------------

    /// Retrieve the journal entry with the given sequence number.
    pub fn journal_entry<E: DeserializeOwned>(&self, seq: u64) -> DbResult<Option<E>> {
        match self.journal.get(seq.to_be_bytes())? {
            Some(bytes) => {
                let entry = serde_json::from_slice(&bytes)
                    .map_err(|e| DbError::Serialization(e.to_string()))?;
                Ok(Some(entry))
            }
            None => Ok(None),
        }
    }

    /// Number of operations committed since genesis.
    pub fn operation_count(&self) -> DbResult<u64> {
        match self.metadata.get(META_OPERATION_COUNT)? {
            Some(raw) => decode_u64(&raw)
                .ok_or_else(|| DbError::Corrupt("operation_count is not an 8-byte integer".into())),
            None => Ok(0),
        }
    }

    /// Flush all pending writes to disk.
    pub fn flush(&self) -> DbResult<()> {
        self.db.flush()?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Counter {
        value: u128,
        label: String,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Entry {
        op: String,
    }

    #[test]
    fn fresh_database_is_empty() {
        let db = LedgerDb::open_temporary().unwrap();
        let snapshot: Option<Counter> = db.load_snapshot().unwrap();
        assert!(snapshot.is_none());
        assert_eq!(db.operation_count().unwrap(), 0);
        assert!(db.snapshot_bytes().unwrap().is_none());
    }

    #[test]
    fn genesis_roundtrip() {
        let db = LedgerDb::open_temporary().unwrap();
        let state = Counter {
            value: u128::MAX,
            label: "genesis".into(),
        };
        db.put_genesis(&state).unwrap();
        let loaded: Counter = db.load_snapshot().unwrap().unwrap();
        assert_eq!(loaded, state);
        assert_eq!(db.operation_count().unwrap(), 0);
    }

    #[test]
    fn commit_appends_journal_in_sequence() {
        let db = LedgerDb::open_temporary().unwrap();
        let mut state = Counter {
            value: 0,
            label: "c".into(),
        };
        db.put_genesis(&state).unwrap();

        for i in 0..3u64 {
            state.value += 1;
            let seq = db
                .commit(&state, &Entry { op: format!("inc-{}", i) })
                .unwrap();
            assert_eq!(seq, i);
        }

        assert_eq!(db.operation_count().unwrap(), 3);
        let loaded: Counter = db.load_snapshot().unwrap().unwrap();
        assert_eq!(loaded.value, 3);

        let second: Entry = db.journal_entry(1).unwrap().unwrap();
        assert_eq!(second.op, "inc-1");
        let missing: Option<Entry> = db.journal_entry(99).unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn reopen_preserves_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db");
        {
            let db = LedgerDb::open(&path).unwrap();
            db.put_genesis(&Counter {
                value: 7,
                label: "persisted".into(),
            })
            .unwrap();
            db.commit(
                &Counter {
                    value: 8,
                    label: "persisted".into(),
                },
                &Entry { op: "inc".into() },
            )
            .unwrap();
        }
        let db = LedgerDb::open(&path).unwrap();
        let loaded: Counter = db.load_snapshot().unwrap().unwrap();
        assert_eq!(loaded.value, 8);
        assert_eq!(db.operation_count().unwrap(), 1);
    }
}
