//! # Operation Envelope
//!
//! Every state-changing call on the token as a plain value, so hosts can
//! accept operations over the wire, journal them and replay them through
//! [`RegaliumToken::apply`](crate::token::RegaliumToken::apply).
//!
//! JSON shape is externally tagged with snake_case names:
//!
//! ```json
//! { "transfer": { "to": "0xbob", "amount": 5000 } }
//! { "set_buyback_enabled": { "enabled": true } }
//! ```

use regalium_protocol::{Address, Amount};
use serde::{Deserialize, Serialize};

use crate::reserve::Payout;

/// A state-changing call. The caller travels alongside, never inside.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Transfer { to: Address, amount: Amount },
    Approve { spender: Address, amount: Amount },
    TransferFrom { from: Address, to: Address, amount: Amount },
    /// Inbound reserve-currency payment; routed to the presale.
    ReceivePayment { value: Amount },
    SellTokens { amount: Amount },
    SetBuybackEnabled { enabled: bool },
    Stake { amount: Amount },
    Unstake { amount: Amount },
    SetDifficulty { difficulty: u64 },
    Mine { nonce: u64, difficulty: u64 },
    InGamePurchase { amount: Amount },
    WithdrawTokens { amount: Amount },
    WithdrawReserve { amount: Amount },
}

impl Operation {
    /// Stable snake_case name, matching the serialized tag.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Transfer { .. } => "transfer",
            Operation::Approve { .. } => "approve",
            Operation::TransferFrom { .. } => "transfer_from",
            Operation::ReceivePayment { .. } => "receive_payment",
            Operation::SellTokens { .. } => "sell_tokens",
            Operation::SetBuybackEnabled { .. } => "set_buyback_enabled",
            Operation::Stake { .. } => "stake",
            Operation::Unstake { .. } => "unstake",
            Operation::SetDifficulty { .. } => "set_difficulty",
            Operation::Mine { .. } => "mine",
            Operation::InGamePurchase { .. } => "in_game_purchase",
            Operation::WithdrawTokens { .. } => "withdraw_tokens",
            Operation::WithdrawReserve { .. } => "withdraw_reserve",
        }
    }

    pub fn is_owner_only(&self) -> bool {
        matches!(
            self,
            Operation::SetBuybackEnabled { .. }
                | Operation::SetDifficulty { .. }
                | Operation::WithdrawReserve { .. }
        )
    }
}

/// What an applied operation did beyond moving balances around.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Applied,
    /// New supply was created for the caller.
    Minted { amount: Amount },
    /// Reserve currency the host must send.
    Paid(Payout),
}
