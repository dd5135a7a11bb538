//! # In-Game Balance
//!
//! Players move liquid tokens into a per-account in-game counter and back.
//! Like staking, this only reshuffles a holder's own buckets, so supply is
//! untouched. In-game units cannot be transferred.

use regalium_protocol::{Address, Amount};

use crate::error::{LedgerError, LedgerResult};
use crate::ledger::BalanceLedger;

/// Moves `amount` of `player`'s liquid balance into the in-game counter.
///
/// # Errors
///
/// [`LedgerError::InsufficientBalance`] if the liquid balance is short.
pub fn purchase(ledger: &mut BalanceLedger, player: &Address, amount: Amount) -> LedgerResult<()> {
    if amount == 0 {
        return Ok(());
    }
    ledger.move_to_in_game(player, amount)?;
    tracing::debug!(player = %player, amount, "in-game purchase");
    Ok(())
}

/// Moves `amount` of `player`'s in-game balance back to liquid.
///
/// # Errors
///
/// [`LedgerError::InsufficientInGameBalance`] if the in-game balance is short.
pub fn withdraw(ledger: &mut BalanceLedger, player: &Address, amount: Amount) -> LedgerResult<()> {
    if amount == 0 {
        return Ok(());
    }
    let available = ledger.in_game_balance_of(player);
    if available < amount {
        return Err(LedgerError::InsufficientInGameBalance {
            available,
            requested: amount,
        });
    }
    ledger.move_from_in_game(player, amount)?;
    tracing::debug!(player = %player, amount, "in-game withdrawal");
    Ok(())
}
