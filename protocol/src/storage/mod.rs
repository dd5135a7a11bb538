//! # Storage Module
//!
//! Persistence for a Regalium node. The ledger is an in-memory state
//! machine; this module keeps its latest committed snapshot and the journal
//! of applied operations on disk so a node survives restarts.
//!
//! ## Design Decisions
//!
//! 1. **Snapshot + journal.** The snapshot is what a restarting node loads;
//!    the journal is the audit trail of how it got there.
//!
//! 2. **Bincode for snapshots, JSON for the journal.** Snapshots are
//!    read by machines only. Journal entries are read by operators with
//!    `sled` dump tools, so they stay human-readable.

pub mod db;

pub use db::{DbError, DbResult, LedgerDb};
