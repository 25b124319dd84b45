//! Cryptographic hashing utilities for the ledger
//!
//! Provides the SHA-256 primitives used for block hashes, Merkle nodes and
//! signing digests, plus the proof-of-work difficulty reading of a hash.

use sha2::{Digest, Sha256};

/// Length of a hex-encoded 256-bit digest
pub const DIGEST_HEX_LEN: usize = 64;

/// Difficulty target that accepts every well-formed hash
pub const MAX_DIFFICULTY: u32 = u32::MAX;

/// Computes SHA-256 hash of the input data
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Computes SHA-256 hash and returns it as a lowercase hex string
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256(data))
}

/// Checks that `value` is a lowercase hex string of exactly `len` characters
pub fn is_lower_hex(value: &str, len: usize) -> bool {
    value.len() == len
        && value
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

/// Checks that `value` is a well-formed 256-bit digest
pub fn is_digest_hex(value: &str) -> bool {
    is_lower_hex(value, DIGEST_HEX_LEN)
}

/// Reads the proof-of-work value of a hash.
///
/// The first 4 bytes (8 hex characters) are interpreted as a big-endian
/// unsigned integer. Lower means more work; a block is accepted when this
/// value does not exceed the difficulty target. Returns `None` when the
/// prefix is not valid hex.
pub fn difficulty_of(hash: &str) -> Option<u32> {
    let prefix = hash.get(..8)?;
    let mut bytes = [0u8; 4];
    hex::decode_to_slice(prefix, &mut bytes).ok()?;
    Some(u32::from_be_bytes(bytes))
}

/// Checks if a hash meets the difficulty target
pub fn meets_difficulty(hash: &str, target: u32) -> bool {
    difficulty_of(hash).map_or(false, |value| value <= target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256() {
        let data = b"hello world";
        assert_eq!(sha256(data).len(), 32);
        assert_eq!(
            sha256_hex(data),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_sha256_empty() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_difficulty_of_reads_prefix() {
        let hash = format!("0000ffff{}", "0".repeat(56));
        assert_eq!(difficulty_of(&hash), Some(0x0000ffff));

        let hash = format!("ffffffff{}", "a".repeat(56));
        assert_eq!(difficulty_of(&hash), Some(u32::MAX));
    }

    #[test]
    fn test_difficulty_is_monotonic() {
        let low = format!("00000001{}", "f".repeat(56));
        let high = format!("00000002{}", "0".repeat(56));
        assert!(difficulty_of(&low).unwrap() < difficulty_of(&high).unwrap());

        let same_prefix = format!("00000002{}", "f".repeat(56));
        assert_eq!(difficulty_of(&high), difficulty_of(&same_prefix));
    }

    #[test]
    fn test_difficulty_of_rejects_garbage() {
        assert_eq!(difficulty_of("xyz"), None);
        assert_eq!(difficulty_of("zzzzzzzz"), None);
    }

    #[test]
    fn test_meets_difficulty() {
        let hash = format!("00000fff{}", "0".repeat(56));
        assert!(meets_difficulty(&hash, 0x00000fff));
        assert!(meets_difficulty(&hash, MAX_DIFFICULTY));
        assert!(!meets_difficulty(&hash, 0x00000ffe));
    }

    #[test]
    fn test_digest_hex_validation() {
        assert!(is_digest_hex(&"0".repeat(64)));
        assert!(is_digest_hex(&sha256_hex(b"x")));
        assert!(!is_digest_hex(&"A".repeat(64)));
        assert!(!is_digest_hex("0"));
        assert!(!is_digest_hex("invalid hash"));
    }
}
