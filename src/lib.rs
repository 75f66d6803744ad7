//! Contract-Ledger: a deterministic contract execution host in Rust
//!
//! This crate provides an execution environment for state-persisting
//! contracts and the protocols built on it, featuring:
//! - Atomic call frames: every failure rolls back storage, transfers and mints
//! - Synchronous nested calls (`rcall`) with per-frame rollback
//! - Const methods that cannot mutate, payable methods that accept deposits
//! - Per-contract, per-currency balance ledger with issuance tracking
//! - ECDSA signatures (secp256k1) and bech32m addresses
//! - Escrow, time-lock, relay, smart wallet, fixed-price sale and NFT protocols
//! - JSON persistence with backups
//!
//! # Example
//!
//! ```rust
//! use contract_ledger::contract::{Call, Engine};
//! use contract_ledger::core::{Address, Value};
//! use std::collections::BTreeMap;
//!
//! let mut engine = Engine::new();
//! let artist = Address::hash_of(b"artist");
//! let collector = Address::hash_of(b"collector");
//!
//! // Deploy a single-unit NFT
//! let nft = engine.deploy("nft", &artist, &[], BTreeMap::new()).unwrap();
//!
//! // Only the creator may mint, exactly once
//! engine
//!     .call(Call::new(artist, nft, "mint_to", vec![Value::Address(collector)]))
//!     .unwrap();
//! assert!(engine
//!     .call(Call::new(artist, nft, "mint_to", vec![Value::Address(artist)]))
//!     .is_err());
//!
//! assert_eq!(engine.balance(&collector, &nft), 1);
//! ```

pub mod cli;
pub mod contract;
pub mod core;
pub mod crypto;
pub mod protocols;
pub mod storage;

// Re-export commonly used types
pub use contract::{Call, Contract, ContractRegistry, Deposit, Engine, EngineConfig, Runtime};
pub use core::{Address, Amount, ExecResult, Failure, Value};
pub use crypto::KeyPair;
pub use storage::{Storage, StorageConfig};
