//! # Presale Converter
//!
//! Turns inbound reserve currency into freshly minted tokens until a fixed
//! deadline. The rate is a fixed-point integer scaled by
//! [`RATE_SCALE`](regalium_protocol::config::RATE_SCALE): a rate of 20
//! credits 2 tokens per reserve unit.

use regalium_protocol::config::RATE_SCALE;
use regalium_protocol::{Address, Amount, Timestamp};
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};
use crate::ledger::BalanceLedger;
use crate::reserve::Reserve;

/// Presale parameters. Both are fixed at deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Presale {
    end_time: Timestamp,
    rate: u64,
}

impl Presale {
    pub fn new(end_time: Timestamp, rate: u64) -> Self {
        Self { end_time, rate }
    }

    pub fn end_time(&self) -> Timestamp {
        self.end_time
    }

    pub fn rate(&self) -> u64 {
        self.rate
    }

    /// The presale accepts payments strictly before its end time.
    pub fn is_open(&self, now: Timestamp) -> bool {
        now < self.end_time
    }

    /// Tokens credited for a payment of `value` reserve units, truncating.
    pub fn quote(&self, value: Amount) -> LedgerResult<Amount> {
        value
            .checked_mul(u128::from(self.rate))
            .map(|scaled| scaled / RATE_SCALE)
            .ok_or(LedgerError::AmountOverflow)
    }

    /// Accepts a reserve payment from `payer`: mints the quoted tokens to
    /// them and adds `value` to the reserve. Returns the tokens credited.
    ///
    /// # Errors
    ///
    /// [`LedgerError::PresaleEnded`] at or after the end time. Nothing is
    /// credited and the reserve is unchanged.
    pub fn purchase(
        &self,
        ledger: &mut BalanceLedger,
        reserve: &mut Reserve,
        payer: &Address,
        value: Amount,
        now: Timestamp,
    ) -> LedgerResult<Amount> {
        if !self.is_open(now) {
            return Err(LedgerError::PresaleEnded {
                ended_at: self.end_time,
            });
        }
        if value == 0 {
            return Ok(0);
        }

        let tokens = self.quote(value)?;
        // Validate the reserve side up front; `mint` is the last fallible step.
        reserve.checked_deposit(value)?;
        ledger.mint(payer, tokens)?;
        reserve.deposit(value)?;

        tracing::debug!(payer = %payer, value, tokens, "presale purchase");
        Ok(tokens)
    }
}
