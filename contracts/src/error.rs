//! # Ledger Errors
//!
//! Every rejection the ledger can produce. All of them are precondition
//! failures detected before any state is touched, so an `Err` always means
//! "nothing happened".

use regalium_protocol::{Address, Amount, Timestamp};
use thiserror::Error;

/// Errors returned by ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// The holder's liquid (or, for unstaking, locked) balance is too small.
    #[error("insufficient balance: available {available}, requested {requested}")]
    InsufficientBalance {
        /// Balance the operation could draw from.
        available: Amount,
        /// Amount the caller asked for.
        requested: Amount,
    },

    /// The spender's allowance does not cover the transfer.
    #[error("insufficient allowance: allowed {allowed}, requested {requested}")]
    InsufficientAllowance {
        /// Remaining allowance.
        allowed: Amount,
        /// Amount the spender tried to move.
        requested: Amount,
    },

    /// The reserve cannot cover a payout.
    #[error("insufficient reserve: available {available}, requested {requested}")]
    InsufficientReserve {
        /// Reserve currency held by the ledger.
        available: Amount,
        /// Payout that was requested.
        requested: Amount,
    },

    /// A reserve payment arrived after the presale deadline.
    #[error("presale ended at {ended_at}")]
    PresaleEnded {
        /// The configured deadline.
        ended_at: Timestamp,
    },

    /// Token buyback is switched off.
    #[error("buyback is not enabled")]
    BuybackDisabled,

    /// The holder staked too recently to stake again.
    #[error("cooldown period not met for staking: {remaining_secs}s remaining")]
    StakeCooldownActive {
        /// Seconds until the next stake is allowed.
        remaining_secs: i64,
    },

    /// The holder staked too recently to unstake.
    #[error("cooldown period not met for unstaking: {remaining_secs}s remaining")]
    UnstakeCooldownActive {
        /// Seconds until unstaking is allowed.
        remaining_secs: i64,
    },

    /// The proof was submitted against a stale difficulty or does not meet
    /// the target. Expected while searching; change the nonce and retry.
    #[error("mining difficulty not met: claimed {claimed}, required {required}")]
    DifficultyNotMet {
        /// Difficulty the caller submitted against.
        claimed: u64,
        /// Difficulty currently active on the ledger.
        required: u64,
    },

    /// An owner-only operation was called by someone else.
    #[error("caller {caller} is not the owner")]
    NotOwner {
        /// The rejected caller.
        caller: Address,
    },

    /// The player's in-game balance is too small for the withdrawal.
    #[error("insufficient in-game balance: available {available}, requested {requested}")]
    InsufficientInGameBalance {
        /// In-game balance available.
        available: Amount,
        /// Amount the player tried to withdraw.
        requested: Amount,
    },

    /// Checked arithmetic failed. Unreachable with any realistic supply.
    #[error("amount overflow")]
    AmountOverflow,
}

impl LedgerError {
    /// `true` only for [`LedgerError::DifficultyNotMet`]: the one rejection a
    /// caller is expected to retry (with a different nonce).
    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::DifficultyNotMet { .. })
    }

    /// Stable snake_case name of the error kind, for APIs and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            LedgerError::InsufficientBalance { .. } => "insufficient_balance",
            LedgerError::InsufficientAllowance { .. } => "insufficient_allowance",
            LedgerError::InsufficientReserve { .. } => "insufficient_reserve",
            LedgerError::PresaleEnded { .. } => "presale_ended",
            LedgerError::BuybackDisabled => "buyback_disabled",
            LedgerError::StakeCooldownActive { .. } => "stake_cooldown_active",
            LedgerError::UnstakeCooldownActive { .. } => "unstake_cooldown_active",
            LedgerError::DifficultyNotMet { .. } => "difficulty_not_met",
            LedgerError::NotOwner { .. } => "not_owner",
            LedgerError::InsufficientInGameBalance { .. } => "insufficient_in_game_balance",
            LedgerError::AmountOverflow => "amount_overflow",
        }
    }
}

/// Result alias used throughout the contracts crate.
pub type LedgerResult<T> = Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_difficulty_is_retryable() {
        let retryable = LedgerError::DifficultyNotMet {
            claimed: 5,
            required: 5,
        };
        assert!(retryable.is_retryable());
        assert!(!LedgerError::BuybackDisabled.is_retryable());
        assert!(!LedgerError::NotOwner {
            caller: "mallory".into()
        }
        .is_retryable());
    }

    #[test]
    fn messages_match_revert_reasons() {
        assert_eq!(
            LedgerError::BuybackDisabled.to_string(),
            "buyback is not enabled"
        );
        let msg = LedgerError::StakeCooldownActive { remaining_secs: 10 }.to_string();
        assert!(msg.starts_with("cooldown period not met for staking"));
        let msg = LedgerError::DifficultyNotMet {
            claimed: 1,
            required: 2,
        }
        .to_string();
        assert!(msg.starts_with("mining difficulty not met"));
    }

    #[test]
    fn kinds_are_snake_case() {
        assert_eq!(
            LedgerError::UnstakeCooldownActive { remaining_secs: 1 }.kind(),
            "unstake_cooldown_active"
        );
        assert_eq!(LedgerError::AmountOverflow.kind(), "amount_overflow");
    }
}
