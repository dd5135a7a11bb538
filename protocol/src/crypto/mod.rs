//! # Cryptographic Primitives
//!
//! Regalium needs exactly one primitive: a fast, domain-separable hash. Mining
//! proofs and snapshot fingerprints both go through [`hash`]. No signatures
//! live here; caller authentication belongs to the host.

pub mod hash;

pub use hash::{blake3_hash, domain_separated_hash, snapshot_digest};
