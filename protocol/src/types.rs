//! # Core Types
//!
//! The handful of types every other crate in the workspace speaks:
//! holder identities, token amounts and timestamps.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Token and reserve amounts in base units.
///
/// `u128`: with 18 decimals a `u64` tops out at ~18.4 whole tokens.
pub type Amount = u128;

/// Block timestamp supplied by the host for every time-gated operation.
pub type Timestamp = DateTime<Utc>;

/// Opaque identity of a token holder.
///
/// The ledger never interprets the contents; hosts usually put a hex public
/// key or a `0x`-prefixed address in here. Comparison is byte-exact.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    /// Wraps a raw identity string.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the identity as raw bytes, as fed into hashes.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// `true` if the identity string is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl From<String> for Address {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Renders a base-unit amount as a decimal string with `decimals` places,
/// trimming trailing zeros: `format_units(2_500_000_000_000_000_000, 18)`
/// is `"2.5"`.
pub fn format_units(amount: Amount, decimals: u8) -> String {
    let Some(scale) = 10u128.checked_pow(u32::from(decimals)) else {
        return amount.to_string();
    };
    let whole = amount / scale;
    let frac = amount % scale;
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{:0width$}", frac, width = usize::from(decimals));
    format!("{}.{}", whole, frac.trim_end_matches('0'))
}
