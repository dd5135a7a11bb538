//! # Staking Vault
//!
//! Moves tokens between a holder's liquid and locked balances. A stake
//! starts a cooldown: until it elapses the same holder can neither stake
//! again nor unstake. Staking earns nothing; the lock is the whole feature.
//!
//! ```text
//!            stake (cooldown elapsed)
//!   Unstaked ─────────────────────────▶ Staked
//!      ▲                                  │
//!      └──────────────────────────────────┘
//!            unstake (cooldown elapsed)
//! ```
//!
//! Both gates are anchored on [`Account::last_stake_action`]. A holder who
//! has never staked passes either gate.

use regalium_protocol::{Address, Amount, Timestamp};
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};
use crate::ledger::{Account, BalanceLedger};

/// Cooldown parameters for staking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakingVault {
    cooldown_secs: u64,
}

impl StakingVault {
    pub fn new(cooldown_secs: u64) -> Self {
        Self { cooldown_secs }
    }

    /// Cooldown length in seconds.
    pub fn cooldown_secs(&self) -> u64 {
        self.cooldown_secs
    }

    /// Seconds left before `account` may stake or unstake again, or zero.
    pub fn remaining_cooldown(&self, account: Option<&Account>, now: Timestamp) -> i64 {
        let Some(last) = account.and_then(|a| a.last_stake_action) else {
            return 0;
        };
        let cooldown = i64::try_from(self.cooldown_secs).unwrap_or(i64::MAX);
        let elapsed = (now - last).num_seconds();
        cooldown.saturating_sub(elapsed).max(0)
    }

    /// Locks `amount` of `holder`'s liquid balance.
    ///
    /// # Errors
    ///
    /// [`LedgerError::InsufficientBalance`] if the liquid balance is short,
    /// then [`LedgerError::StakeCooldownActive`] if the holder staked less
    /// than one cooldown ago.
    pub fn stake(
        &self,
        ledger: &mut BalanceLedger,
        holder: &Address,
        amount: Amount,
        now: Timestamp,
    ) -> LedgerResult<()> {
        if amount == 0 {
            return Ok(());
        }

        let available = ledger.balance_of(holder);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                available,
                requested: amount,
            });
        }
        let remaining_secs = self.remaining_cooldown(ledger.account(holder), now);
        if remaining_secs > 0 {
            return Err(LedgerError::StakeCooldownActive { remaining_secs });
        }

        let account = ledger.lock(holder, amount)?;
        account.last_stake_action = Some(now);
        account.last_stake_change = Some(now);

        tracing::debug!(holder = %holder, amount, "staked");
        Ok(())
    }

    /// Returns `amount` of `holder`'s locked balance to liquid.
    ///
    /// # Errors
    ///
    /// [`LedgerError::InsufficientBalance`] if the locked balance is short,
    /// then [`LedgerError::UnstakeCooldownActive`] inside the cooldown.
    pub fn unstake(
        &self,
        ledger: &mut BalanceLedger,
        holder: &Address,
        amount: Amount,
        now: Timestamp,
    ) -> LedgerResult<()> {
        if amount == 0 {
            return Ok(());
        }

        let locked = ledger.stake_of(holder);
        if locked < amount {
            return Err(LedgerError::InsufficientBalance {
                available: locked,
                requested: amount,
            });
        }
        let remaining_secs = self.remaining_cooldown(ledger.account(holder), now);
        if remaining_secs > 0 {
            return Err(LedgerError::UnstakeCooldownActive { remaining_secs });
        }

        let account = ledger.unlock(holder, amount)?;
        account.last_stake_change = Some(now);

        tracing::debug!(holder = %holder, amount, "unstaked");
        Ok(())
    }
}
