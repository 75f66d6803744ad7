//! Cryptographic utilities
//!
//! This module provides:
//! - SHA-256 hashing
//! - ECDSA key management and verification (secp256k1)

pub mod hash;
pub mod keys;

pub use hash::{sha256, sha256_hex};
pub use keys::{ecdsa_verify, sign_address, KeyError, KeyPair};
