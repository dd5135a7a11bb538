//! # Regalium Token
//!
//! The facade a host talks to. [`RegaliumToken`] owns the balance ledger,
//! the reserve and every component built on them, remembers who the owner
//! is, and exposes each operation with an explicit caller.
//!
//! ## Atomicity
//!
//! Every operation checks all of its preconditions before writing anything,
//! so an `Err` leaves the whole token exactly as it was. Hosts that persist
//! state can still apply to a clone and swap on success; the token is a
//! plain value and cheap enough to clone for that.
//!
//! ## Owner
//!
//! Fixed at deployment. Owner-only operations are
//! [`set_buyback_enabled`](RegaliumToken::set_buyback_enabled),
//! [`set_difficulty`](RegaliumToken::set_difficulty) and
//! [`withdraw_reserve`](RegaliumToken::withdraw_reserve).

use std::sync::Arc;

use regalium_protocol::config::{self, presale_end_time};
use regalium_protocol::{Address, Amount, Timestamp};
use serde::{Deserialize, Serialize};

use crate::buyback::BuybackMarket;
use crate::error::{LedgerError, LedgerResult};
use crate::in_game;
use crate::ledger::{Account, BalanceLedger};
use crate::mining::{MiningGate, ProofOfWork};
use crate::operation::{Operation, Outcome};
use crate::presale::Presale;
use crate::reserve::{Payout, Reserve};
use crate::staking::StakingVault;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Deployment parameters. Defaults are the protocol constants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenConfig {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    /// Credited to the owner at deployment, in base units.
    pub initial_supply: Amount,
    pub presale_end_time: Timestamp,
    /// Tokens per reserve unit, scaled by 10.
    pub presale_rate: u64,
    /// Reserve units per token, scaled by 10.
    pub buyback_rate: u64,
    pub buyback_enabled: bool,
    pub stake_cooldown_secs: u64,
    pub mining_difficulty: u64,
    pub mining_reward: Amount,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            name: config::TOKEN_NAME.to_string(),
            symbol: config::TOKEN_SYMBOL.to_string(),
            decimals: config::TOKEN_DECIMALS,
            initial_supply: config::INITIAL_SUPPLY,
            presale_end_time: presale_end_time(),
            presale_rate: config::PRESALE_RATE,
            buyback_rate: config::BUYBACK_RATE,
            buyback_enabled: false,
            stake_cooldown_secs: config::STAKE_COOLDOWN_SECS,
            mining_difficulty: config::INITIAL_MINING_DIFFICULTY,
            mining_reward: config::MINING_REWARD,
        }
    }
}

// ---------------------------------------------------------------------------
// RegaliumToken
// ---------------------------------------------------------------------------

/// The complete token state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegaliumToken {
    name: String,
    symbol: String,
    decimals: u8,
    owner: Address,
    ledger: BalanceLedger,
    reserve: Reserve,
    presale: Presale,
    buyback: BuybackMarket,
    staking: StakingVault,
    mining: MiningGate,
}

impl RegaliumToken {
    /// Creates the token with the initial supply credited to `owner`.
    pub fn deploy(owner: Address, config: &TokenConfig) -> Self {
        let mut buyback = BuybackMarket::new(config.buyback_rate);
        buyback.set_enabled(config.buyback_enabled);

        tracing::info!(
            owner = %owner,
            symbol = %config.symbol,
            initial_supply = config.initial_supply,
            "token deployed"
        );

        Self {
            name: config.name.clone(),
            symbol: config.symbol.clone(),
            decimals: config.decimals,
            ledger: BalanceLedger::with_genesis(&owner, config.initial_supply),
            owner,
            reserve: Reserve::default(),
            presale: Presale::new(config.presale_end_time, config.presale_rate),
            buyback,
            staking: StakingVault::new(config.stake_cooldown_secs),
            mining: MiningGate::new(config.mining_difficulty, config.mining_reward),
        }
    }

    /// Replaces the mining proof function.
    pub fn with_proof_of_work(mut self, pow: Arc<dyn ProofOfWork>) -> Self {
        self.mining = self.mining.with_proof_of_work(pow);
        self
    }

    fn ensure_owner(&self, caller: &Address) -> LedgerResult<()> {
        if caller != &self.owner {
            return Err(LedgerError::NotOwner {
                caller: caller.clone(),
            });
        }
        Ok(())
    }

    // -- Balance ledger -----------------------------------------------------

    pub fn transfer(&mut self, caller: &Address, to: &Address, amount: Amount) -> LedgerResult<()> {
        self.ledger.transfer(caller, to, amount)
    }

    pub fn approve(&mut self, caller: &Address, spender: &Address, amount: Amount) {
        self.ledger.approve(caller, spender, amount);
    }

    /// `caller` spends `from`'s allowance.
    pub fn transfer_from(
        &mut self,
        caller: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> LedgerResult<()> {
        self.ledger.transfer_from(caller, from, to, amount)
    }

    // -- Presale & buyback --------------------------------------------------

    /// Inbound reserve payment of `value` from `payer`. Returns tokens minted.
    pub fn receive_payment(
        &mut self,
        payer: &Address,
        value: Amount,
        now: Timestamp,
    ) -> LedgerResult<Amount> {
        self.presale
            .purchase(&mut self.ledger, &mut self.reserve, payer, value, now)
    }

    pub fn sell_tokens(&mut self, caller: &Address, amount: Amount) -> LedgerResult<Payout> {
        self.buyback
            .sell(&mut self.ledger, &mut self.reserve, caller, amount)
    }

    pub fn set_buyback_enabled(&mut self, caller: &Address, enabled: bool) -> LedgerResult<()> {
        self.ensure_owner(caller)?;
        self.buyback.set_enabled(enabled);
        tracing::info!(enabled, "buyback toggled");
        Ok(())
    }

    /// Owner withdrawal from the reserve.
    pub fn withdraw_reserve(&mut self, caller: &Address, amount: Amount) -> LedgerResult<Payout> {
        self.ensure_owner(caller)?;
        let payout = self.reserve.withdraw(caller, amount)?;
        tracing::info!(amount, remaining = self.reserve.balance(), "reserve withdrawn");
        Ok(payout)
    }

    // -- Staking ------------------------------------------------------------

    pub fn stake(&mut self, caller: &Address, amount: Amount, now: Timestamp) -> LedgerResult<()> {
        self.staking.stake(&mut self.ledger, caller, amount, now)
    }

    pub fn unstake(&mut self, caller: &Address, amount: Amount, now: Timestamp) -> LedgerResult<()> {
        self.staking.unstake(&mut self.ledger, caller, amount, now)
    }

    // -- Mining -------------------------------------------------------------

    pub fn set_difficulty(&mut self, caller: &Address, difficulty: u64) -> LedgerResult<()> {
        self.ensure_owner(caller)?;
        self.mining.set_difficulty(difficulty);
        tracing::info!(difficulty, "mining difficulty updated");
        Ok(())
    }

    /// Returns the reward minted to `caller`.
    pub fn mine(&mut self, caller: &Address, nonce: u64, difficulty: u64) -> LedgerResult<Amount> {
        self.mining.mine(&mut self.ledger, caller, nonce, difficulty)
    }

    // -- In-game ------------------------------------------------------------

    pub fn in_game_purchase(&mut self, caller: &Address, amount: Amount) -> LedgerResult<()> {
        in_game::purchase(&mut self.ledger, caller, amount)
    }

    pub fn withdraw_tokens(&mut self, caller: &Address, amount: Amount) -> LedgerResult<()> {
        in_game::withdraw(&mut self.ledger, caller, amount)
    }

    // -- Dispatch -----------------------------------------------------------

    /// Applies `operation` on behalf of `caller` at time `now`.
    pub fn apply(
        &mut self,
        caller: &Address,
        operation: &Operation,
        now: Timestamp,
    ) -> LedgerResult<Outcome> {
        let outcome = match operation {
            Operation::Transfer { to, amount } => {
                self.transfer(caller, to, *amount)?;
                Outcome::Applied
            }
            Operation::Approve { spender, amount } => {
                self.approve(caller, spender, *amount);
                Outcome::Applied
            }
            Operation::TransferFrom { from, to, amount } => {
                self.transfer_from(caller, from, to, *amount)?;
                Outcome::Applied
            }
            Operation::ReceivePayment { value } => Outcome::Minted {
                amount: self.receive_payment(caller, *value, now)?,
            },
            Operation::SellTokens { amount } => Outcome::Paid(self.sell_tokens(caller, *amount)?),
            Operation::SetBuybackEnabled { enabled } => {
                self.set_buyback_enabled(caller, *enabled)?;
                Outcome::Applied
            }
            Operation::Stake { amount } => {
                self.stake(caller, *amount, now)?;
                Outcome::Applied
            }
            Operation::Unstake { amount } => {
                self.unstake(caller, *amount, now)?;
                Outcome::Applied
            }
            Operation::SetDifficulty { difficulty } => {
                self.set_difficulty(caller, *difficulty)?;
                Outcome::Applied
            }
            Operation::Mine { nonce, difficulty } => Outcome::Minted {
                amount: self.mine(caller, *nonce, *difficulty)?,
            },
            Operation::InGamePurchase { amount } => {
                self.in_game_purchase(caller, *amount)?;
                Outcome::Applied
            }
            Operation::WithdrawTokens { amount } => {
                self.withdraw_tokens(caller, *amount)?;
                Outcome::Applied
            }
            Operation::WithdrawReserve { amount } => {
                Outcome::Paid(self.withdraw_reserve(caller, *amount)?)
            }
        };

        tracing::debug!(caller = %caller, operation = operation.name(), "operation applied");
        Ok(outcome)
    }

    // -- Reads --------------------------------------------------------------

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    pub fn owner(&self) -> &Address {
        &self.owner
    }

    pub fn total_supply(&self) -> Amount {
        self.ledger.total_supply()
    }

    pub fn balance_of(&self, holder: &Address) -> Amount {
        self.ledger.balance_of(holder)
    }

    pub fn stake_of(&self, holder: &Address) -> Amount {
        self.ledger.stake_of(holder)
    }

    pub fn in_game_balance(&self, holder: &Address) -> Amount {
        self.ledger.in_game_balance_of(holder)
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.ledger.allowance(owner, spender)
    }

    pub fn account(&self, holder: &Address) -> Option<&Account> {
        self.ledger.account(holder)
    }

    pub fn ledger(&self) -> &BalanceLedger {
        &self.ledger
    }

    pub fn presale_end_time(&self) -> Timestamp {
        self.presale.end_time()
    }

    pub fn presale_rate(&self) -> u64 {
        self.presale.rate()
    }

    pub fn is_presale_open(&self, now: Timestamp) -> bool {
        self.presale.is_open(now)
    }

    pub fn buyback_rate(&self) -> u64 {
        self.buyback.rate()
    }

    pub fn buyback_enabled(&self) -> bool {
        self.buyback.is_enabled()
    }

    pub fn reserve_balance(&self) -> Amount {
        self.reserve.balance()
    }

    pub fn stake_cooldown_secs(&self) -> u64 {
        self.staking.cooldown_secs()
    }

    /// Seconds before `holder` may stake or unstake again.
    pub fn remaining_cooldown(&self, holder: &Address, now: Timestamp) -> i64 {
        self.staking
            .remaining_cooldown(self.ledger.account(holder), now)
    }

    pub fn mining_difficulty(&self) -> u64 {
        self.mining.difficulty()
    }

    pub fn mining_reward(&self) -> Amount {
        self.mining.reward()
    }

    pub fn proof_of_work(&self) -> &dyn ProofOfWork {
        self.mining.proof_of_work()
    }

    /// `total_supply == Σ holdings`.
    pub fn is_conserved(&self) -> bool {
        self.ledger.is_conserved()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
