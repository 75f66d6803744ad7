//! Account and contract addresses
//!
//! An address is 32 bytes rendered as bech32m with the `ledger` prefix.
//! Currencies share the same type; the all-zero address is the native
//! currency.

use crate::crypto::hash::sha256;
use bech32::{FromBase32, ToBase32, Variant};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Human-readable prefix of every encoded address
pub const ADDRESS_HRP: &str = "ledger";

/// Length of the raw address payload
pub const ADDRESS_LEN: usize = 32;

/// Address parsing errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("invalid bech32 encoding: {0}")]
    Encoding(String),
    #[error("invalid address prefix: {0}")]
    Prefix(String),
    #[error("invalid bech32 variant")]
    Variant,
    #[error("invalid address length: {0}")]
    Length(usize),
}

/// A normalized 32-byte address
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address([u8; ADDRESS_LEN]);

impl Address {
    /// The native currency (and "no address") sentinel
    pub const NATIVE: Address = Address([0u8; ADDRESS_LEN]);

    pub fn from_bytes(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    /// Build from a slice, which must be exactly 32 bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self, AddressError> {
        let array: [u8; ADDRESS_LEN] = bytes
            .try_into()
            .map_err(|_| AddressError::Length(bytes.len()))?;
        Ok(Self(array))
    }

    /// Address of an account controlled by a compressed secp256k1 public key
    pub fn from_public_key(public_key: &[u8]) -> Self {
        Self::hash_of(public_key)
    }

    /// SHA-256 of arbitrary data, taken as an address
    pub fn hash_of(data: &[u8]) -> Self {
        let hash = sha256(data);
        let mut bytes = [0u8; ADDRESS_LEN];
        bytes.copy_from_slice(&hash);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    pub fn is_native(&self) -> bool {
        self.0 == [0u8; ADDRESS_LEN]
    }

    /// Parse and validate a bech32m address
    pub fn parse(s: &str) -> Result<Self, AddressError> {
        let (hrp, data, variant) =
            bech32::decode(s).map_err(|e| AddressError::Encoding(e.to_string()))?;
        if hrp != ADDRESS_HRP {
            return Err(AddressError::Prefix(hrp));
        }
        if variant != Variant::Bech32m {
            return Err(AddressError::Variant);
        }
        let bytes =
            Vec::<u8>::from_base32(&data).map_err(|e| AddressError::Encoding(e.to_string()))?;
        Self::from_slice(&bytes)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let encoded = bech32::encode(ADDRESS_HRP, self.0.to_base32(), Variant::Bech32m)
            .map_err(|_| fmt::Error)?;
        f.write_str(&encoded)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Address::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_display_parse() {
        let address = Address::hash_of(b"alice");
        let encoded = address.to_string();
        assert!(encoded.starts_with("ledger1"));
        assert_eq!(Address::parse(&encoded).unwrap(), address);
    }

    #[test]
    fn test_native_sentinel() {
        assert!(Address::NATIVE.is_native());
        assert!(!Address::hash_of(b"x").is_native());
        assert_eq!(Address::default(), Address::NATIVE);
    }

    #[test]
    fn test_rejects_bad_checksum() {
        let mut encoded = Address::hash_of(b"bob").to_string();
        let last = encoded.pop().unwrap();
        encoded.push(if last == 'q' { 'p' } else { 'q' });
        assert!(matches!(
            Address::parse(&encoded),
            Err(AddressError::Encoding(_))
        ));
    }

    #[test]
    fn test_rejects_foreign_prefix() {
        let foreign = bech32::encode("other", [1u8; 32].to_base32(), Variant::Bech32m).unwrap();
        assert!(matches!(
            Address::parse(&foreign),
            Err(AddressError::Prefix(_))
        ));
    }

    #[test]
    fn test_rejects_wrong_length() {
        let short = bech32::encode(ADDRESS_HRP, [1u8; 20].to_base32(), Variant::Bech32m).unwrap();
        assert_eq!(Address::parse(&short), Err(AddressError::Length(20)));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(Address::parse("not an address").is_err());
        assert!(Address::parse("").is_err());
    }

    #[test]
    fn test_serde_as_string() {
        let address = Address::hash_of(b"carol");
        let json = serde_json::to_string(&address).unwrap();
        assert_eq!(json, format!("\"{}\"", address));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, address);
    }
}
