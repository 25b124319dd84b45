//! Cryptographic utilities for the ledger
//!
//! This module provides:
//! - SHA-256 hashing and proof-of-work difficulty
//! - ECDSA key management (secp256k1)
//! - Merkle root calculation

pub mod hash;
pub mod keys;
pub mod merkle;

pub use hash::{
    difficulty_of, is_digest_hex, is_lower_hex, meets_difficulty, sha256, sha256_hex,
    DIGEST_HEX_LEN, MAX_DIFFICULTY,
};
pub use keys::{
    public_key_from_hex, sign_message, verify_signature, KeyError, KeyPair, PUBLIC_KEY_HEX_LEN,
    SIGNATURE_HEX_LEN,
};
pub use merkle::{calculate_merkle_root, calculate_merkle_root_hex};
