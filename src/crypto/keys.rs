//! ECDSA key management for the ledger
//!
//! Provides key pair generation, signing, and verification using
//! the secp256k1 elliptic curve. Public keys travel as compressed
//! 33-byte points in lowercase hex; signatures as 64-byte compact
//! encodings in lowercase hex.

use rand::rngs::OsRng;
use secp256k1::ecdsa::Signature;
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use thiserror::Error;

use super::hash::{is_lower_hex, sha256};

/// Hex length of a compressed public key
pub const PUBLIC_KEY_HEX_LEN: usize = 66;

/// Hex length of a compact ECDSA signature
pub const SIGNATURE_HEX_LEN: usize = 128;

/// Errors that can occur during key operations
#[derive(Error, Debug)]
pub enum KeyError {
    #[error("Invalid private key")]
    InvalidPrivateKey,
    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),
    #[error("Invalid signature encoding")]
    InvalidSignature,
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

    /// Get the public key as a hex string (compressed format)
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key.serialize())
    }

    /// Sign a message, returning the hex-encoded compact signature
    pub fn sign(&self, message: &[u8]) -> Result<String, KeyError> {
        sign_message(&self.secret_key, message)
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key_hex())
            .finish_non_exhaustive()
    }
}

/// Parse a compressed public key from its hex form
pub fn public_key_from_hex(hex_key: &str) -> Result<PublicKey, KeyError> {
    if !is_lower_hex(hex_key, PUBLIC_KEY_HEX_LEN) {
        return Err(KeyError::InvalidPublicKey(hex_key.to_string()));
    }
    let bytes = hex::decode(hex_key).map_err(|_| KeyError::InvalidPublicKey(hex_key.to_string()))?;
    PublicKey::from_slice(&bytes).map_err(|_| KeyError::InvalidPublicKey(hex_key.to_string()))
}

/// Sign the SHA-256 digest of `message` with a secret key
pub fn sign_message(secret_key: &SecretKey, message: &[u8]) -> Result<String, KeyError> {
    let secp = Secp256k1::new();
    let digest = Message::from_digest_slice(&sha256(message))?;
    let signature = secp.sign_ecdsa(&digest, secret_key);
    Ok(hex::encode(signature.serialize_compact()))
}

/// Verify a hex-encoded compact signature over the SHA-256 digest of `message`
pub fn verify_signature(
    public_key: &PublicKey,
    message: &[u8],
    signature_hex: &str,
) -> Result<bool, KeyError> {
    let secp = Secp256k1::new();
    let digest = Message::from_digest_slice(&sha256(message))?;

    let bytes = hex::decode(signature_hex).map_err(|_| KeyError::InvalidSignature)?;
    let signature = Signature::from_compact(&bytes).map_err(|_| KeyError::InvalidSignature)?;

    Ok(secp.verify_ecdsa(&digest, &signature, public_key).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_pair_generation() {
        let kp = KeyPair::generate();
        assert_eq!(kp.private_key_hex().len(), 64);
        assert_eq!(kp.public_key_hex().len(), PUBLIC_KEY_HEX_LEN);
    }

    #[test]
    fn test_sign_and_verify() {
        let kp = KeyPair::generate();
        let message = b"Hello, ledger!";

        let signature = kp.sign(message).unwrap();
        assert_eq!(signature.len(), SIGNATURE_HEX_LEN);
        assert!(verify_signature(&kp.public_key, message, &signature).unwrap());
        assert!(!verify_signature(&kp.public_key, b"other message", &signature).unwrap());
    }

    #[test]
    fn test_verify_with_wrong_key() {
        let signer = KeyPair::generate();
        let other = KeyPair::generate();
        let signature = signer.sign(b"payload").unwrap();

        assert!(!verify_signature(&other.public_key, b"payload", &signature).unwrap());
    }

    #[test]
    fn test_key_pair_from_hex() {
        let kp1 = KeyPair::generate();
        let kp2 = KeyPair::from_private_key_hex(&kp1.private_key_hex()).unwrap();
        assert_eq!(kp1.public_key_hex(), kp2.public_key_hex());
    }

    #[test]
    fn test_public_key_round_trip() {
        let kp = KeyPair::generate();
        let parsed = public_key_from_hex(&kp.public_key_hex()).unwrap();
        assert_eq!(parsed, kp.public_key);

        assert!(public_key_from_hex("02abcd").is_err());
        assert!(public_key_from_hex(&"z".repeat(PUBLIC_KEY_HEX_LEN)).is_err());
    }

    #[test]
    fn test_malformed_signature_is_an_error() {
        let kp = KeyPair::generate();
        assert!(verify_signature(&kp.public_key, b"m", "not-hex").is_err());
    }
}
