//! Contract execution host
//!
//! Provides the environment contracts run in: storage, a balance ledger,
//! per-call context and atomic nested calls.
//!
//! # Overview
//!
//! This module implements:
//! - A journaled world state with checkpoint/revert per call frame
//! - A registry of contract types and their method tables
//! - The [`Runtime`] surface contract methods program against
//! - Deployment, dispatch, call-depth and reentrancy limits in [`Engine`]
//!
//! # Example
//!
//! ```rust
//! use contract_ledger::contract::{Call, Deposit, Engine};
//! use contract_ledger::core::{Address, Value};
//! use std::collections::BTreeMap;
//!
//! let mut engine = Engine::new();
//! let owner = Address::hash_of(b"owner");
//! engine.credit(&owner, &Address::NATIVE, 100).unwrap();
//!
//! // Lock funds until height 10
//! let lock = engine
//!     .deploy("time_lock", &owner, &[Value::from(10u64)], BTreeMap::new())
//!     .unwrap();
//! engine
//!     .call(Call::new(owner, lock, "deposit", vec![]).with_deposit(Deposit::native(60)))
//!     .unwrap();
//!
//! // Too early
//! let withdraw = Call::new(owner, lock, "withdraw", vec![Value::from(60u64)]);
//! assert_eq!(engine.call(withdraw.clone()).unwrap_err().code, Some(2));
//!
//! engine.set_height(10).unwrap();
//! engine.call(withdraw).unwrap();
//! assert_eq!(engine.balance(&owner, &Address::NATIVE), 100);
//! ```

pub mod builtins;
pub mod context;
pub mod engine;
pub mod registry;
pub mod runtime;
pub mod state;

pub use context::{Deposit, ExecutionContext};
pub use engine::{Call, Engine, EngineConfig, EngineSnapshot, Instance, MAX_CALL_DEPTH};
pub use registry::{Args, Contract, ContractRegistry, Method, MethodFlags, RegistryError};
pub use runtime::Runtime;
pub use state::{Checkpoint, EventKind, LedgerEvent, WorldState};
