//! # Regalium Token Ledger
//!
//! The economic state machine behind the Regalium (`RGLM`) token:
//!
//! - **ledger** — liquid, locked and in-game balances, allowances, supply.
//! - **reserve** — reserve currency held by the token, and payouts.
//! - **presale** — reserve currency in, freshly minted tokens out, until a
//!   deadline.
//! - **buyback** — tokens in (burned), reserve currency out, when enabled.
//! - **staking** — liquid ⇄ locked with a cooldown.
//! - **mining** — proof-of-work gated minting.
//! - **in_game** — liquid ⇄ in-game counter.
//! - **token** — [`RegaliumToken`], the owner-aware facade over all of it.
//!
//! ## Design Principles
//!
//! 1. Checked arithmetic on every monetary path. Overflow is an error, never
//!    a wrap.
//! 2. Validate everything, then mutate. A rejected operation changes nothing.
//! 3. No clocks, no I/O. Time is an argument and native-currency transfers
//!    are returned as [`Payout`]s for the host to settle.
//! 4. Every state type is serde-serializable for snapshots and the wire.

pub mod buyback;
pub mod error;
pub mod in_game;
pub mod ledger;
pub mod mining;
pub mod operation;
pub mod presale;
pub mod reserve;
pub mod staking;
pub mod token;

pub use error::{LedgerError, LedgerResult};
pub use ledger::{Account, BalanceLedger};
pub use mining::{search_nonce, Blake3Pow, ProofOfWork};
pub use operation::{Operation, Outcome};
pub use reserve::Payout;
pub use token::{RegaliumToken, TokenConfig};
