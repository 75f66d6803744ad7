//! Core value types shared by the host and every contract
//!
//! This module contains:
//! - Addresses (bech32m, native-currency sentinel)
//! - Dynamic storage values
//! - Deep equality, ordering, sort and reverse
//! - The contract failure type

pub mod address;
pub mod error;
pub mod ordering;
pub mod value;

pub use address::{Address, AddressError, ADDRESS_HRP, ADDRESS_LEN};
pub use error::{ensure, fail, ExecResult, Failure};
pub use ordering::{compare, compare_label, equals, reverse, sort};
pub use value::Value;

/// Ledger amount
pub type Amount = u128;
