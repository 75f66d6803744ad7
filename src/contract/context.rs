//! Per-call execution context

use crate::core::{Address, Amount};
use serde::{Deserialize, Serialize};

/// Payment attached to a call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deposit {
    pub currency: Address,
    pub amount: Amount,
}

impl Deposit {
    pub fn new(currency: Address, amount: Amount) -> Self {
        Self { currency, amount }
    }

    /// Deposit in the native currency
    pub fn native(amount: Amount) -> Self {
        Self::new(Address::NATIVE, amount)
    }
}

/// Immutable view of one call frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionContext {
    /// Caller: an account for top-level calls, the calling contract for nested ones
    pub user: Address,
    /// Address of the contract being executed
    pub contract: Address,
    /// Current height
    pub height: u64,
    /// Payment attached by the caller, already credited to `contract`
    pub deposit: Option<Deposit>,
}
