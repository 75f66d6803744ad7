//! ECDSA key management
//!
//! Key pairs live on the secp256k1 curve. An account address is the SHA-256
//! of the compressed public key. Contracts verify signatures made over a
//! 32-byte address, which is how the template protocol proves that a caller
//! was handed a signature by the committed key holder.

use rand::rngs::OsRng;
use secp256k1::{ecdsa::Signature, Message, PublicKey, Secp256k1, SecretKey};
use thiserror::Error;

use crate::core::Address;

/// Errors that can occur during key operations
#[derive(Error, Debug)]
pub enum KeyError {
    #[error("Invalid private key")]
    InvalidPrivateKey,
    #[error("Secp256k1 error: {0}")]
    Secp256k1Error(#[from] secp256k1::Error),
}

/// A key pair consisting of a private key and its corresponding public key
#[derive(Clone)]
pub struct KeyPair {
    pub secret_key: SecretKey,
    pub public_key: PublicKey,
}

impl KeyPair {
    /// Generate a new random key pair
    pub fn generate() -> Self {
        let secp = Secp256k1::new();
        let (secret_key, public_key) = secp.generate_keypair(&mut OsRng);
        Self {
            secret_key,
            public_key,
        }
    }

    /// Create a key pair from an existing secret key
    pub fn from_secret_key(secret_key: SecretKey) -> Self {
        let secp = Secp256k1::new();
        let public_key = PublicKey::from_secret_key(&secp, &secret_key);
        Self {
            secret_key,
            public_key,
        }
    }

    /// Create a key pair from a hex-encoded private key
    pub fn from_private_key_hex(hex_key: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_key).map_err(|_| KeyError::InvalidPrivateKey)?;
        let secret_key =
            SecretKey::from_slice(&bytes).map_err(|_| KeyError::InvalidPrivateKey)?;
        Ok(Self::from_secret_key(secret_key))
    }

    /// Get the private key as a hex string
    pub fn private_key_hex(&self) -> String {
        hex::encode(self.secret_key.secret_bytes())
    }

    /// Compressed public key bytes
    pub fn public_key_bytes(&self) -> Vec<u8> {
        self.public_key.serialize().to_vec()
    }

    /// Get the public key as a hex string (compressed format)
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key.serialize())
    }

    /// Account address controlled by this key
    pub fn address(&self) -> Address {
        Address::from_public_key(&self.public_key.serialize())
    }

    /// Sign an address (compact 64-byte signature)
    pub fn sign_address(&self, address: &Address) -> Vec<u8> {
        sign_address(&self.secret_key, address)
    }
}

/// Sign a 32-byte address with a secret key
pub fn sign_address(secret_key: &SecretKey, address: &Address) -> Vec<u8> {
    let secp = Secp256k1::new();
    let message = Message::from_digest(*address.as_bytes());
    let signature = secp.sign_ecdsa(&message, secret_key);
    signature.serialize_compact().to_vec()
}

/// Verify `signature` over `signer` under `public_key`
///
/// Accepts compact or DER signatures. Malformed keys or signatures verify as
/// false; this never fails.
pub fn ecdsa_verify(signer: &Address, public_key: &[u8], signature: &[u8]) -> bool {
    let Ok(public_key) = PublicKey::from_slice(public_key) else {
        return false;
    };
    let signature = match Signature::from_compact(signature) {
        Ok(sig) => sig,
        Err(_) => match Signature::from_der(signature) {
            Ok(sig) => sig,
            Err(_) => return false,
        },
    };
    let secp = Secp256k1::verification_only();
    let message = Message::from_digest(*signer.as_bytes());
    secp.verify_ecdsa(&message, &signature, &public_key).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_pair_generation() {
        let kp = KeyPair::generate();
        assert!(!kp.private_key_hex().is_empty());
        assert_eq!(kp.public_key_bytes().len(), 33);
        assert!(!kp.address().is_native());
    }

    #[test]
    fn test_sign_and_verify_address() {
        let kp = KeyPair::generate();
        let user = Address::hash_of(b"user");

        let signature = kp.sign_address(&user);
        assert!(ecdsa_verify(&user, &kp.public_key_bytes(), &signature));

        let other = Address::hash_of(b"someone else");
        assert!(!ecdsa_verify(&other, &kp.public_key_bytes(), &signature));
    }

    #[test]
    fn test_verify_wrong_key() {
        let signer = KeyPair::generate();
        let impostor = KeyPair::generate();
        let user = Address::hash_of(b"user");

        let signature = signer.sign_address(&user);
        assert!(!ecdsa_verify(&user, &impostor.public_key_bytes(), &signature));
    }

    #[test]
    fn test_malformed_inputs_are_false() {
        let kp = KeyPair::generate();
        let user = Address::hash_of(b"user");
        let signature = kp.sign_address(&user);

        assert!(!ecdsa_verify(&user, b"not a key", &signature));
        assert!(!ecdsa_verify(&user, &kp.public_key_bytes(), b"short"));
        assert!(!ecdsa_verify(&user, &[], &[]));
    }

    #[test]
    fn test_key_pair_from_hex() {
        let kp1 = KeyPair::generate();
        let private_hex = kp1.private_key_hex();

        let kp2 = KeyPair::from_private_key_hex(&private_hex).unwrap();
        assert_eq!(kp1.public_key_hex(), kp2.public_key_hex());
        assert_eq!(kp1.address(), kp2.address());
        assert!(KeyPair::from_private_key_hex("zz").is_err());
    }
}
