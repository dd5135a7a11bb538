//! # Genesis & Data Directory
//!
//! Layout of a node data directory:
//!
//! ```text
//! <data-dir>/
//!   genesis.json   deployment parameters (TokenConfig)
//!   db/            sled database: snapshot, journal, metadata
//! ```
//!
//! `init` writes both; `run` only ever reads the database.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};

use regalium_contracts::{RegaliumToken, TokenConfig};
use regalium_protocol::config::GENESIS_FILE_NAME;
use regalium_protocol::storage::LedgerDb;
use regalium_protocol::Address;

pub fn genesis_path(data_dir: &Path) -> PathBuf {
    data_dir.join(GENESIS_FILE_NAME)
}

pub fn db_path(data_dir: &Path) -> PathBuf {
    data_dir.join("db")
}

/// Reads deployment parameters from a JSON file.
pub fn read_config(path: &Path) -> Result<TokenConfig> {
    let raw = std::fs::read(path)
        .with_context(|| format!("failed to read genesis config {}", path.display()))?;
    serde_json::from_slice(&raw)
        .with_context(|| format!("invalid genesis config {}", path.display()))
}

pub fn write_config(path: &Path, config: &TokenConfig) -> Result<()> {
    let json = serde_json::to_vec_pretty(config).context("failed to encode genesis config")?;
    std::fs::write(path, json)
        .with_context(|| format!("failed to write genesis config {}", path.display()))
}

/// Deploys a fresh ledger into `data_dir` and persists it as the genesis
/// snapshot. Refuses to touch an existing ledger unless `force` is set, in
/// which case the old database is deleted first.
pub fn initialize(
    data_dir: &Path,
    owner: Address,
    config: &TokenConfig,
    force: bool,
) -> Result<(RegaliumToken, LedgerDb)> {
    if owner.is_empty() {
        bail!("owner address must not be empty");
    }

    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

    let db_dir = db_path(data_dir);
    if db_dir.exists() {
        if !force {
            bail!(
                "a ledger already exists in {}; pass --force to replace it",
                data_dir.display()
            );
        }
        std::fs::remove_dir_all(&db_dir)
            .with_context(|| format!("failed to remove {}", db_dir.display()))?;
        tracing::warn!(path = %db_dir.display(), "existing ledger removed");
    }

    write_config(&genesis_path(data_dir), config)?;

    let db = LedgerDb::open(&db_dir)
        .with_context(|| format!("failed to open database at {}", db_dir.display()))?;
    let token = RegaliumToken::deploy(owner, config);
    db.put_genesis(&token)
        .context("failed to persist genesis snapshot")?;

    Ok((token, db))
}

/// Opens the database in `data_dir` and restores the latest snapshot.
pub fn load(data_dir: &Path) -> Result<(RegaliumToken, LedgerDb)> {
    let db_dir = db_path(data_dir);
    if !db_dir.exists() {
        bail!(
            "no ledger in {}; run `regalium-node init` first",
            data_dir.display()
        );
    }

    let db = LedgerDb::open(&db_dir)
        .with_context(|| format!("failed to open database at {}", db_dir.display()))?;
    let token: RegaliumToken = db
        .load_snapshot()
        .context("failed to decode ledger snapshot")?
        .with_context(|| format!("database at {} holds no snapshot", db_dir.display()))?;

    Ok((token, db))
}
