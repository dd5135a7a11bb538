//! # Protocol Configuration & Constants
//!
//! Every magic number in Regalium lives here. The ledger, the node and the
//! tests all read their defaults from this module.
//!
//! Rates are fixed-point integers scaled by [`RATE_SCALE`]. Nothing in the
//! protocol uses floating point.

use chrono::{DateTime, Utc};

use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Token Metadata
// ---------------------------------------------------------------------------

/// Human-readable token name.
pub const TOKEN_NAME: &str = "Regalium";

/// Ticker symbol.
pub const TOKEN_SYMBOL: &str = "RGLM";

/// Decimal places. Display only; arithmetic is always in base units.
pub const TOKEN_DECIMALS: u8 = 18;

/// One whole token in base units (10^18).
pub const UNIT: u128 = 1_000_000_000_000_000_000;

/// Supply credited to the deployer at genesis: one billion tokens.
pub const INITIAL_SUPPLY: u128 = 1_000_000_000 * UNIT;

// ---------------------------------------------------------------------------
// Presale & Buyback
// ---------------------------------------------------------------------------

/// Denominator for every rate in the protocol. A rate of 20 means 2.0.
pub const RATE_SCALE: u128 = 10;

/// Presale deadline as a Unix timestamp (2025-12-30T18:40:00Z).
pub const PRESALE_END_TIMESTAMP: i64 = 1_767_120_000;

/// Tokens minted per reserve unit during the presale, scaled by 10 (2.0).
pub const PRESALE_RATE: u64 = 20;

/// Reserve units paid per token on buyback, scaled by 10 (1.5).
pub const BUYBACK_RATE: u64 = 15;

// ---------------------------------------------------------------------------
// Staking
// ---------------------------------------------------------------------------

/// Minimum seconds between a stake and the next stake or unstake: one day.
pub const STAKE_COOLDOWN_SECS: u64 = 86_400;

// ---------------------------------------------------------------------------
// Mining
// ---------------------------------------------------------------------------

/// Difficulty active right after deployment. The owner tunes it from there.
pub const INITIAL_MINING_DIFFICULTY: u64 = 1_000;

/// Tokens minted to a miner for every accepted proof: 50 RGLM.
pub const MINING_REWARD: u128 = 50 * UNIT;

/// BLAKE3 key-derivation context for mining proofs. Changing this string
/// invalidates every nonce anyone has ever searched for.
pub const POW_DOMAIN: &str = "regalium mining proof v1";

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

/// Protocol version reported by the node.
pub const PROTOCOL_VERSION: &str = "0.1.0";

/// Default HTTP API port.
pub const DEFAULT_API_PORT: u16 = 9841;

/// Default Prometheus metrics port.
pub const DEFAULT_METRICS_PORT: u16 = 9842;

/// File name of the genesis parameters inside the node data directory.
pub const GENESIS_FILE_NAME: &str = "genesis.json";

// ---------------------------------------------------------------------------
// Utility
// ---------------------------------------------------------------------------

/// The presale deadline as a UTC timestamp.
pub fn presale_end_time() -> Timestamp {
    DateTime::from_timestamp(PRESALE_END_TIMESTAMP, 0).unwrap_or(DateTime::<Utc>::MIN_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presale_deadline_matches_constant() {
        assert_eq!(presale_end_time().timestamp(), 1_767_120_000);
    }

    #[test]
    fn rates_are_scaled_by_ten() {
        // 20 / 10 = 2 tokens per unit, 15 / 10 = 1.5 units per token.
        assert_eq!(u128::from(PRESALE_RATE) / RATE_SCALE, 2);
        assert_eq!(u128::from(BUYBACK_RATE) * 20 / RATE_SCALE, 30);
    }

    #[test]
    fn cooldown_is_one_day() {
        assert_eq!(STAKE_COOLDOWN_SECS, 24 * 60 * 60);
    }

    #[test]
    fn supply_constants_sanity() {
        assert_eq!(UNIT, 10u128.pow(TOKEN_DECIMALS as u32));
        assert!(MINING_REWARD < INITIAL_SUPPLY);
        assert!(INITIAL_MINING_DIFFICULTY > 0);
    }

    #[test]
    fn ports_are_distinct() {
        assert_ne!(DEFAULT_API_PORT, DEFAULT_METRICS_PORT);
    }
}
