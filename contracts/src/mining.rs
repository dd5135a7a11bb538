//! # Mining Gate
//!
//! Mints a fixed reward to anyone who presents a nonce whose proof digest
//! falls below the current difficulty target.
//!
//! ## Proof
//!
//! ```text
//! digest = BLAKE3-derive-key(POW_DOMAIN, miner ‖ 0x00 ‖ nonce_be8 ‖ difficulty_be8)
//! value  = u128::from_be_bytes(digest[..16])
//! valid  ⇔ value < u128::MAX / max(difficulty, 1)
//! ```
//!
//! Binding the miner's address into the digest means a proof found by one
//! holder is worthless to anyone else, and binding the difficulty means a
//! proof goes stale as soon as the owner retunes it. The expected number of
//! attempts is roughly `difficulty`.
//!
//! The digest function sits behind the [`ProofOfWork`] trait so tests can
//! substitute a deterministic stub; the target arithmetic is plain functions.

use std::fmt;
use std::sync::Arc;

use regalium_protocol::config::POW_DOMAIN;
use regalium_protocol::crypto::domain_separated_hash;
use regalium_protocol::{Address, Amount};
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};
use crate::ledger::BalanceLedger;

// ---------------------------------------------------------------------------
// Proof function
// ---------------------------------------------------------------------------

/// Produces the 32-byte digest a mining proof is judged by.
pub trait ProofOfWork: fmt::Debug + Send + Sync {
    fn digest(&self, miner: &Address, nonce: u64, difficulty: u64) -> [u8; 32];
}

/// The production proof function: domain-separated BLAKE3.
#[derive(Debug, Clone, Copy, Default)]
pub struct Blake3Pow;

impl ProofOfWork for Blake3Pow {
    fn digest(&self, miner: &Address, nonce: u64, difficulty: u64) -> [u8; 32] {
        domain_separated_hash(
            POW_DOMAIN,
            &[
                miner.as_bytes(),
                &[0u8],
                &nonce.to_be_bytes(),
                &difficulty.to_be_bytes(),
            ],
        )
    }
}

/// Digests must be strictly below this value. Difficulty 0 is treated as 1.
pub fn target_for_difficulty(difficulty: u64) -> u128 {
    u128::MAX / u128::from(difficulty.max(1))
}

/// The first 16 bytes of `digest`, big-endian.
pub fn digest_value(digest: &[u8; 32]) -> u128 {
    let mut head = [0u8; 16];
    head.copy_from_slice(&digest[..16]);
    u128::from_be_bytes(head)
}

pub fn meets_difficulty(digest: &[u8; 32], difficulty: u64) -> bool {
    digest_value(digest) < target_for_difficulty(difficulty)
}

/// `true` if `nonce` is a valid proof for `miner` at `difficulty`.
pub fn verify(pow: &dyn ProofOfWork, miner: &Address, nonce: u64, difficulty: u64) -> bool {
    meets_difficulty(&pow.digest(miner, nonce, difficulty), difficulty)
}

/// Tries up to `max_attempts` consecutive nonces from `start` (wrapping) and
/// returns the first valid one.
pub fn search_nonce(
    pow: &dyn ProofOfWork,
    miner: &Address,
    difficulty: u64,
    start: u64,
    max_attempts: u64,
) -> Option<u64> {
    (0..max_attempts)
        .map(|i| start.wrapping_add(i))
        .find(|&nonce| verify(pow, miner, nonce, difficulty))
}

fn default_pow() -> Arc<dyn ProofOfWork> {
    Arc::new(Blake3Pow)
}

// ---------------------------------------------------------------------------
// MiningGate
// ---------------------------------------------------------------------------

/// Difficulty, reward and the proof function in use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MiningGate {
    difficulty: u64,
    reward: Amount,
    /// Not persisted; a restored gate always uses [`Blake3Pow`].
    #[serde(skip, default = "default_pow")]
    pow: Arc<dyn ProofOfWork>,
}

impl MiningGate {
    pub fn new(difficulty: u64, reward: Amount) -> Self {
        Self {
            difficulty,
            reward,
            pow: default_pow(),
        }
    }

    /// Replaces the proof function.
    pub fn with_proof_of_work(mut self, pow: Arc<dyn ProofOfWork>) -> Self {
        self.pow = pow;
        self
    }

    pub fn difficulty(&self) -> u64 {
        self.difficulty
    }

    pub fn reward(&self) -> Amount {
        self.reward
    }

    pub fn proof_of_work(&self) -> &dyn ProofOfWork {
        self.pow.as_ref()
    }

    pub(crate) fn set_difficulty(&mut self, difficulty: u64) {
        self.difficulty = difficulty;
    }

    /// Checks the proof and mints the reward to `miner`.
    ///
    /// # Errors
    ///
    /// [`LedgerError::DifficultyNotMet`] if `claimed_difficulty` is not the
    /// active difficulty or the digest is not below the target. Retry with
    /// another nonce.
    pub fn mine(
        &self,
        ledger: &mut BalanceLedger,
        miner: &Address,
        nonce: u64,
        claimed_difficulty: u64,
    ) -> LedgerResult<Amount> {
        let rejected = LedgerError::DifficultyNotMet {
            claimed: claimed_difficulty,
            required: self.difficulty,
        };
        if claimed_difficulty != self.difficulty {
            tracing::trace!(miner = %miner, nonce, claimed_difficulty, "stale difficulty");
            return Err(rejected);
        }
        if !verify(self.pow.as_ref(), miner, nonce, self.difficulty) {
            tracing::trace!(miner = %miner, nonce, "proof above target");
            return Err(rejected);
        }

        ledger.mint(miner, self.reward)?;
        tracing::debug!(miner = %miner, nonce, reward = self.reward, "block mined");
        Ok(self.reward)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// Returns the same digest for every input.
    #[derive(Debug)]
    struct FixedPow([u8; 32]);

    impl ProofOfWork for FixedPow {
        fn digest(&self, _: &Address, _: u64, _: u64) -> [u8; 32] {
            self.0
        }
    }

    fn gate_with(digest: [u8; 32], difficulty: u64) -> MiningGate {
        MiningGate::new(difficulty, 50).with_proof_of_work(Arc::new(FixedPow(digest)))
    }

    #[test]
    fn target_shrinks_with_difficulty() {
        assert_eq!(target_for_difficulty(1), u128::MAX);
        assert_eq!(target_for_difficulty(0), u128::MAX);
        assert_eq!(target_for_difficulty(2), u128::MAX / 2);
        assert!(target_for_difficulty(1_000) < target_for_difficulty(999));
    }

    #[test]
    fn digest_value_reads_first_sixteen_bytes_big_endian() {
        let mut digest = [0xffu8; 32];
        digest[..16].copy_from_slice(&[0u8; 16]);
        digest[15] = 7;
        assert_eq!(digest_value(&digest), 7);
    }

    #[test]
    fn threshold_is_strict() {
        let target = target_for_difficulty(4);
        let mut at_target = [0u8; 32];
        at_target[..16].copy_from_slice(&target.to_be_bytes());
        assert!(!meets_difficulty(&at_target, 4));

        let mut below = [0u8; 32];
        below[..16].copy_from_slice(&(target - 1).to_be_bytes());
        assert!(meets_difficulty(&below, 4));
    }

    #[test]
    fn valid_proof_mints_reward() {
        let gate = gate_with([0u8; 32], 10);
        let mut ledger = BalanceLedger::new();
        let miner = Address::from("miner");

        let reward = gate.mine(&mut ledger, &miner, 42, 10).unwrap();

        assert_eq!(reward, 50);
        assert_eq!(ledger.balance_of(&miner), 50);
        assert_eq!(ledger.total_supply(), 50);
    }

    #[test]
    fn stale_difficulty_rejected_even_with_good_digest() {
        let gate = gate_with([0u8; 32], 10);
        let mut ledger = BalanceLedger::new();

        let err = gate
            .mine(&mut ledger, &Address::from("miner"), 1, 9)
            .unwrap_err();

        assert_eq!(
            err,
            LedgerError::DifficultyNotMet {
                claimed: 9,
                required: 10
            }
        );
        assert!(err.is_retryable());
        assert_eq!(ledger.total_supply(), 0);
    }

    #[test]
    fn digest_above_target_rejected() {
        let gate = gate_with([0xffu8; 32], 10);
        let mut ledger = BalanceLedger::new();

        let err = gate
            .mine(&mut ledger, &Address::from("miner"), 1, 10)
            .unwrap_err();
        assert!(matches!(err, LedgerError::DifficultyNotMet { .. }));
        assert_eq!(ledger.total_supply(), 0);
    }

    #[test]
    fn blake3_search_finds_accepted_nonce() {
        let miner = Address::from("0xminer");
        let nonce = search_nonce(&Blake3Pow, &miner, 5, 0, 10_000).expect("nonce within budget");

        let gate = MiningGate::new(5, 50);
        let mut ledger = BalanceLedger::new();
        gate.mine(&mut ledger, &miner, nonce, 5).unwrap();
        assert_eq!(ledger.balance_of(&miner), 50);
    }

    #[test]
    fn proof_is_bound_to_miner() {
        let pow = Blake3Pow;
        assert_ne!(
            pow.digest(&Address::from("alice"), 1, 5),
            pow.digest(&Address::from("bob"), 1, 5)
        );
        assert_ne!(
            pow.digest(&Address::from("alice"), 1, 5),
            pow.digest(&Address::from("alice"), 1, 6)
        );
    }

    #[test]
    fn impossible_difficulty_finds_nothing_quickly() {
        let miner = Address::from("miner");
        assert_eq!(search_nonce(&Blake3Pow, &miner, u64::MAX, 0, 64), None);
        assert_eq!(search_nonce(&Blake3Pow, &miner, 1, 0, 0), None);
    }

    #[test]
    fn deserialized_gate_uses_blake3() {
        let gate = gate_with([0u8; 32], 3);
        let json = serde_json::to_string(&gate).unwrap();
        let restored: MiningGate = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.difficulty(), 3);
        assert_eq!(format!("{:?}", restored.proof_of_work()), "Blake3Pow");
    }
}
