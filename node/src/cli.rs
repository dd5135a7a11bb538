//! # CLI Interface
//!
//! Command-line arguments for `regalium-node`, defined with `clap` derive.
//! Four subcommands: `init`, `run`, `mine` and `version`. Every flag can
//! also come from a `REGALIUM_*` environment variable.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use regalium_protocol::config::{DEFAULT_API_PORT, DEFAULT_METRICS_PORT};

use crate::logging::LogFormat;

/// Regalium token ledger node.
///
/// Holds the ledger state, applies operations submitted over HTTP, persists
/// every accepted operation and exposes Prometheus metrics.
#[derive(Parser, Debug)]
#[command(
    name = "regalium-node",
    about = "Regalium token ledger node",
    version,
    propagate_version = true
)]
pub struct RegaliumNodeCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the data directory, write `genesis.json` and deploy the ledger.
    Init(InitArgs),
    /// Serve the HTTP API and metrics for an initialized ledger.
    Run(RunArgs),
    /// Search for a valid mining nonce locally.
    Mine(MineArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `init` subcommand.
#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Address that receives the initial supply and owns the ledger.
    #[arg(long, env = "REGALIUM_OWNER")]
    pub owner: String,

    /// Data directory to initialize.
    #[arg(long, short = 'd', env = "REGALIUM_DATA_DIR", default_value = ".regalium")]
    pub data_dir: PathBuf,

    /// Genesis parameters to deploy with (JSON). Protocol defaults when omitted.
    #[arg(long, short = 'c', env = "REGALIUM_GENESIS")]
    pub config: Option<PathBuf>,

    /// Wipe an existing ledger in the data directory.
    #[arg(long)]
    pub force: bool,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Data directory created by `init`.
    #[arg(long, short = 'd', env = "REGALIUM_DATA_DIR", default_value = ".regalium")]
    pub data_dir: PathBuf,

    /// Port for the HTTP API.
    #[arg(long, env = "REGALIUM_API_PORT", default_value_t = DEFAULT_API_PORT)]
    pub api_port: u16,

    /// Port for the Prometheus metrics endpoint.
    #[arg(long, env = "REGALIUM_METRICS_PORT", default_value_t = DEFAULT_METRICS_PORT)]
    pub metrics_port: u16,

    /// Log output format.
    #[arg(long, env = "REGALIUM_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

/// Arguments for the `mine` subcommand.
#[derive(Parser, Debug)]
pub struct MineArgs {
    /// Address the proof is bound to. Only this address can redeem it.
    #[arg(long, env = "REGALIUM_MINER")]
    pub miner: String,

    /// Difficulty currently active on the ledger (see `GET /status`).
    #[arg(long)]
    pub difficulty: u64,

    /// First nonce to try.
    #[arg(long, default_value_t = 0)]
    pub start_nonce: u64,

    /// Give up after this many nonces.
    #[arg(long, default_value_t = 100_000_000)]
    pub max_attempts: u64,
}
