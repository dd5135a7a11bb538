//! # Buyback Market
//!
//! Lets holders sell tokens back for reserve currency. Sold tokens are
//! burned, so supply shrinks by exactly the amount sold. The market is off
//! until the owner switches it on, and it can never promise more than the
//! reserve holds.

use regalium_protocol::config::RATE_SCALE;
use regalium_protocol::{Address, Amount};
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};
use crate::ledger::BalanceLedger;
use crate::reserve::{Payout, Reserve};

/// Buyback parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuybackMarket {
    /// Reserve units paid per token, scaled by `RATE_SCALE`.
    rate: u64,
    enabled: bool,
}

impl BuybackMarket {
    /// A disabled market paying `rate / RATE_SCALE` reserve units per token.
    pub fn new(rate: u64) -> Self {
        Self {
            rate,
            enabled: false,
        }
    }

    pub fn rate(&self) -> u64 {
        self.rate
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Owner checks happen in the token facade.
    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Reserve units owed for selling `amount` tokens, truncating.
    pub fn quote(&self, amount: Amount) -> LedgerResult<Amount> {
        amount
            .checked_mul(u128::from(self.rate))
            .map(|scaled| scaled / RATE_SCALE)
            .ok_or(LedgerError::AmountOverflow)
    }

    /// Burns `amount` of `holder`'s liquid tokens and pays out of the reserve.
    ///
    /// # Errors
    ///
    /// In order of precedence: [`LedgerError::BuybackDisabled`],
    /// [`LedgerError::InsufficientBalance`], [`LedgerError::InsufficientReserve`].
    /// All are checked before anything is written.
    pub fn sell(
        &self,
        ledger: &mut BalanceLedger,
        reserve: &mut Reserve,
        holder: &Address,
        amount: Amount,
    ) -> LedgerResult<Payout> {
        if !self.enabled {
            return Err(LedgerError::BuybackDisabled);
        }

        let available = ledger.balance_of(holder);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                available,
                requested: amount,
            });
        }

        let owed = self.quote(amount)?;
        reserve.ensure_covers(owed)?;

        ledger.burn(holder, amount)?;
        let payout = reserve.withdraw(holder, owed)?;

        tracing::debug!(holder = %holder, amount, payout = owed, "tokens sold back");
        Ok(payout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn funded(reserve_units: Amount) -> (BuybackMarket, BalanceLedger, Reserve, Address) {
        let seller = Address::from("seller");
        let ledger = BalanceLedger::with_genesis(&seller, 100);
        let mut reserve = Reserve::default();
        reserve.deposit(reserve_units).unwrap();
        let mut market = BuybackMarket::new(15);
        market.set_enabled(true);
        (market, ledger, reserve, seller)
    }

    #[test]
    fn selling_twenty_pays_thirty_tenths() {
        let (market, mut ledger, mut reserve, seller) = funded(1_000);

        let payout = market.sell(&mut ledger, &mut reserve, &seller, 20).unwrap();

        assert_eq!(payout.amount, 30);
        assert_eq!(payout.recipient, seller);
        assert_eq!(ledger.balance_of(&seller), 80);
        assert_eq!(ledger.total_supply(), 80);
        assert_eq!(reserve.balance(), 970);
        assert!(ledger.is_conserved());
    }

    #[test]
    fn disabled_market_rejects_and_changes_nothing() {
        let (mut market, mut ledger, mut reserve, seller) = funded(1_000);
        market.set_enabled(false);

        let err = market
            .sell(&mut ledger, &mut reserve, &seller, 20)
            .unwrap_err();

        assert_eq!(err, LedgerError::BuybackDisabled);
        assert_eq!(ledger.balance_of(&seller), 100);
        assert_eq!(reserve.balance(), 1_000);
    }

    #[test]
    fn disabled_takes_precedence_over_balance() {
        let market = BuybackMarket::new(15);
        let mut ledger = BalanceLedger::new();
        let mut reserve = Reserve::default();
        let err = market
            .sell(&mut ledger, &mut reserve, &Address::from("nobody"), 5)
            .unwrap_err();
        assert_eq!(err, LedgerError::BuybackDisabled);
    }

    #[test]
    fn insolvent_reserve_rejects_sale() {
        let (market, mut ledger, mut reserve, seller) = funded(29);

        let err = market
            .sell(&mut ledger, &mut reserve, &seller, 20)
            .unwrap_err();

        assert_eq!(
            err,
            LedgerError::InsufficientReserve {
                available: 29,
                requested: 30
            }
        );
        assert_eq!(ledger.balance_of(&seller), 100);
        assert_eq!(ledger.total_supply(), 100);
    }

    #[test]
    fn overselling_reports_balance_before_reserve() {
        let (market, mut ledger, mut reserve, seller) = funded(0);
        let err = market
            .sell(&mut ledger, &mut reserve, &seller, 101)
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientBalance { .. }));
    }
}
