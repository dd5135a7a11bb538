//! # Reserve
//!
//! The reserve-currency holdings of the ledger. Presale payments flow in,
//! buyback sells and owner withdrawals flow out. The ledger never moves
//! native currency itself: every outflow produces a [`Payout`] the host is
//! expected to settle.

use regalium_protocol::{Address, Amount};
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};

/// Reserve currency held by the ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reserve {
    balance: Amount,
}

impl Reserve {
    /// Current reserve balance.
    pub fn balance(&self) -> Amount {
        self.balance
    }

    /// Fails with [`LedgerError::InsufficientReserve`] unless `amount` can be
    /// paid out.
    pub fn ensure_covers(&self, amount: Amount) -> LedgerResult<()> {
        if self.balance < amount {
            return Err(LedgerError::InsufficientReserve {
                available: self.balance,
                requested: amount,
            });
        }
        Ok(())
    }

    /// Balance after depositing `amount`, without applying it.
    pub(crate) fn checked_deposit(&self, amount: Amount) -> LedgerResult<Amount> {
        self.balance
            .checked_add(amount)
            .ok_or(LedgerError::AmountOverflow)
    }

    pub(crate) fn deposit(&mut self, amount: Amount) -> LedgerResult<()> {
        self.balance = self.checked_deposit(amount)?;
        Ok(())
    }

    /// Removes `amount` and returns the payout owed to `recipient`.
    pub(crate) fn withdraw(&mut self, recipient: &Address, amount: Amount) -> LedgerResult<Payout> {
        self.ensure_covers(amount)?;
        self.balance -= amount;
        Ok(Payout {
            recipient: recipient.clone(),
            amount,
        })
    }
}

/// Instruction for the host to send reserve currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    /// Who receives the currency.
    pub recipient: Address,
    /// Reserve units owed.
    pub amount: Amount,
}
