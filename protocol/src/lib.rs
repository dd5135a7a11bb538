// Copyright (c) 2026 Regalium Contributors. MIT License.
// See LICENSE for details.

//! # Regalium Protocol — Core Library
//!
//! Shared building blocks for the Regalium token ledger:
//!
//! - **config** — Protocol constants: token metadata, presale and buyback
//!   rates, staking cooldown, mining parameters, node defaults.
//! - **types** — Holder identities, amounts and timestamps.
//! - **crypto** — BLAKE3 hashing with domain separation.
//! - **storage** — sled-backed snapshot and journal store for nodes.
//!
//! The ledger state machine itself lives in `regalium-contracts`; the
//! reference host lives in `regalium-node`.

pub mod config;
pub mod crypto;
pub mod storage;
pub mod types;

pub use types::{format_units, Address, Amount, Timestamp};
