//! # Balance Ledger
//!
//! Per-holder balances, allowances and the total supply. Every other
//! component of the token is built on the primitives here, and this is the
//! only place that writes a balance.
//!
//! Each account is split into three buckets:
//!
//! - **liquid**: spendable and transferable,
//! - **locked**: staked through the [staking vault](crate::staking),
//! - **in_game**: moved into the [in-game counter](crate::in_game).
//!
//! The invariant `total_supply == Σ (liquid + locked + in_game)` holds after
//! every successful operation. Only `mint` and `burn` change the supply, and
//! both are crate-private: the presale, mining gate and buyback market are
//! the only callers.
//!
//! Maps are `BTreeMap`s so a serialized ledger is byte-for-byte deterministic
//! and two nodes with the same state report the same snapshot digest.

use std::collections::BTreeMap;

use regalium_protocol::{Address, Amount, Timestamp};
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};

// ---------------------------------------------------------------------------
// Account
// ---------------------------------------------------------------------------

/// The ledger entry for a single holder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Spendable, transferable units.
    pub liquid: Amount,
    /// Staked units.
    pub locked: Amount,
    /// Units moved into the in-game counter.
    pub in_game: Amount,
    /// When this holder last staked. `None` until the first stake.
    pub last_stake_action: Option<Timestamp>,
    /// When this holder's stake last changed, by staking or unstaking.
    pub last_stake_change: Option<Timestamp>,
}

impl Account {
    /// `liquid + locked + in_game`, or `None` on overflow.
    pub fn holdings(&self) -> Option<Amount> {
        self.liquid
            .checked_add(self.locked)?
            .checked_add(self.in_game)
    }
}

/// One of the three balance buckets of an [`Account`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bucket {
    Liquid,
    Locked,
    InGame,
}

impl Bucket {
    fn get(self, account: &Account) -> Amount {
        match self {
            Bucket::Liquid => account.liquid,
            Bucket::Locked => account.locked,
            Bucket::InGame => account.in_game,
        }
    }

    fn get_mut(self, account: &mut Account) -> &mut Amount {
        match self {
            Bucket::Liquid => &mut account.liquid,
            Bucket::Locked => &mut account.locked,
            Bucket::InGame => &mut account.in_game,
        }
    }
}

// ---------------------------------------------------------------------------
// BalanceLedger
// ---------------------------------------------------------------------------

/// Balances, allowances and total supply of the token.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BalanceLedger {
    accounts: BTreeMap<Address, Account>,
    /// `owner -> spender -> remaining allowance`.
    allowances: BTreeMap<Address, BTreeMap<Address, Amount>>,
    total_supply: Amount,
}

impl BalanceLedger {
    /// Creates an empty ledger with zero supply.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a ledger whose entire `supply` sits in `holder`'s liquid balance.
    pub fn with_genesis(holder: &Address, supply: Amount) -> Self {
        let mut ledger = Self::new();
        if supply > 0 {
            ledger.accounts.insert(
                holder.clone(),
                Account {
                    liquid: supply,
                    ..Account::default()
                },
            );
        }
        ledger.total_supply = supply;
        ledger
    }

    // -- Reads --------------------------------------------------------------

    /// Total units in existence across all buckets of all accounts.
    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    /// Liquid balance of `holder`; zero for unknown holders.
    pub fn balance_of(&self, holder: &Address) -> Amount {
        self.accounts.get(holder).map(|a| a.liquid).unwrap_or(0)
    }

    /// Locked (staked) balance of `holder`.
    pub fn stake_of(&self, holder: &Address) -> Amount {
        self.accounts.get(holder).map(|a| a.locked).unwrap_or(0)
    }

    /// In-game balance of `holder`.
    pub fn in_game_balance_of(&self, holder: &Address) -> Amount {
        self.accounts.get(holder).map(|a| a.in_game).unwrap_or(0)
    }

    /// The full account record, if `holder` has ever held anything.
    pub fn account(&self, holder: &Address) -> Option<&Account> {
        self.accounts.get(holder)
    }

    /// Number of known accounts, including zeroed ones.
    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    /// Remaining amount `spender` may move out of `owner`'s liquid balance.
    pub fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.allowances
            .get(owner)
            .and_then(|spenders| spenders.get(spender))
            .copied()
            .unwrap_or(0)
    }

    /// Sum of every account's holdings, or `None` on overflow.
    pub fn holdings_sum(&self) -> Option<Amount> {
        self.accounts
            .values()
            .try_fold(0u128, |acc, account| acc.checked_add(account.holdings()?))
    }

    /// `true` if the total supply equals the sum of all holdings.
    pub fn is_conserved(&self) -> bool {
        self.holdings_sum() == Some(self.total_supply)
    }

    // -- Transfers ----------------------------------------------------------

    /// Moves `amount` liquid units from `from` to `to`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InsufficientBalance`] if `from` holds less than
    /// `amount`; neither balance changes.
    pub fn transfer(&mut self, from: &Address, to: &Address, amount: Amount) -> LedgerResult<()> {
        if amount == 0 {
            return Ok(());
        }

        let available = self.balance_of(from);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                available,
                requested: amount,
            });
        }
        if from == to {
            return Ok(());
        }

        let credited = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(LedgerError::AmountOverflow)?;

        self.account_mut(from).liquid = available - amount;
        self.account_mut(to).liquid = credited;
        Ok(())
    }

    /// Sets the allowance of `spender` over `owner`'s liquid balance,
    /// replacing any previous value.
    pub fn approve(&mut self, owner: &Address, spender: &Address, amount: Amount) {
        if amount == 0 {
            if let Some(spenders) = self.allowances.get_mut(owner) {
                spenders.remove(spender);
                if spenders.is_empty() {
                    self.allowances.remove(owner);
                }
            }
            return;
        }
        self.allowances
            .entry(owner.clone())
            .or_default()
            .insert(spender.clone(), amount);
    }

    /// Moves `amount` from `from` to `to` on behalf of `spender`, consuming
    /// allowance.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InsufficientAllowance`] if the allowance is
    /// short, then [`LedgerError::InsufficientBalance`] if `from` is.
    pub fn transfer_from(
        &mut self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> LedgerResult<()> {
        let allowed = self.allowance(from, spender);
        if allowed < amount {
            return Err(LedgerError::InsufficientAllowance {
                allowed,
                requested: amount,
            });
        }

        // `transfer` validates before it writes, so a failure here leaves the
        // allowance untouched as well.
        self.transfer(from, to, amount)?;
        self.approve(from, spender, allowed - amount);
        Ok(())
    }

    // -- Supply primitives --------------------------------------------------

    /// Creates `amount` new units in `to`'s liquid balance.
    pub(crate) fn mint(&mut self, to: &Address, amount: Amount) -> LedgerResult<()> {
        let supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(LedgerError::AmountOverflow)?;
        let credited = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(LedgerError::AmountOverflow)?;

        if amount > 0 {
            self.account_mut(to).liquid = credited;
        }
        self.total_supply = supply;
        Ok(())
    }

    /// Destroys `amount` units from `from`'s liquid balance.
    pub(crate) fn burn(&mut self, from: &Address, amount: Amount) -> LedgerResult<()> {
        let available = self.balance_of(from);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                available,
                requested: amount,
            });
        }
        let supply = self
            .total_supply
            .checked_sub(amount)
            .ok_or(LedgerError::AmountOverflow)?;

        if amount > 0 {
            self.account_mut(from).liquid = available - amount;
        }
        self.total_supply = supply;
        Ok(())
    }

    // -- Bucket moves -------------------------------------------------------

    /// Moves `amount` between two buckets of the same account and returns
    /// the updated account so the caller can stamp timers on it.
    fn shift(
        &mut self,
        holder: &Address,
        from: Bucket,
        to: Bucket,
        amount: Amount,
    ) -> LedgerResult<&mut Account> {
        let current = self.accounts.get(holder).cloned().unwrap_or_default();
        let available = from.get(&current);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                available,
                requested: amount,
            });
        }
        let credited = to
            .get(&current)
            .checked_add(amount)
            .ok_or(LedgerError::AmountOverflow)?;

        let account = self.account_mut(holder);
        *from.get_mut(account) = available - amount;
        *to.get_mut(account) = credited;
        Ok(account)
    }

    /// liquid -> locked.
    pub(crate) fn lock(&mut self, holder: &Address, amount: Amount) -> LedgerResult<&mut Account> {
        self.shift(holder, Bucket::Liquid, Bucket::Locked, amount)
    }

    /// locked -> liquid.
    pub(crate) fn unlock(&mut self, holder: &Address, amount: Amount) -> LedgerResult<&mut Account> {
        self.shift(holder, Bucket::Locked, Bucket::Liquid, amount)
    }

    /// liquid -> in_game.
    pub(crate) fn move_to_in_game(&mut self, holder: &Address, amount: Amount) -> LedgerResult<()> {
        self.shift(holder, Bucket::Liquid, Bucket::InGame, amount)
            .map(|_| ())
    }

    /// in_game -> liquid.
    pub(crate) fn move_from_in_game(
        &mut self,
        holder: &Address,
        amount: Amount,
    ) -> LedgerResult<()> {
        self.shift(holder, Bucket::InGame, Bucket::Liquid, amount)
            .map(|_| ())
    }

    fn account_mut(&mut self, holder: &Address) -> &mut Account {
        self.accounts.entry(holder.clone()).or_default()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
