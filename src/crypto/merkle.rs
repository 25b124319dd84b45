//! Merkle tree over transaction hashes
//!
//! Leaves are SHA-256 digests. Each parent is `sha256(left || right)` over
//! the raw 32-byte children. A level with an odd count pairs its last node
//! with itself. A single leaf is its own root, and an empty list has the
//! root `sha256("")`.

use super::hash::sha256;

/// Calculate the merkle root from a list of leaf hashes
pub fn calculate_merkle_root(leaves: &[[u8; 32]]) -> [u8; 32] {
    if leaves.is_empty() {
        return sha256(b"");
    }

    let mut current_level: Vec<[u8; 32]> = leaves.to_vec();

    while current_level.len() > 1 {
        current_level = current_level
            .chunks(2)
            .map(|chunk| {
                let right = chunk.get(1).unwrap_or(&chunk[0]);
                hash_pair(&chunk[0], right)
            })
            .collect();
    }

    current_level[0]
}

/// Calculate the merkle root and return it as lowercase hex
pub fn calculate_merkle_root_hex(leaves: &[[u8; 32]]) -> String {
    hex::encode(calculate_merkle_root(leaves))
}

fn hash_pair(left: &[u8; 32], right: &[u8; 32]) -> [u8; 32] {
    let mut data = [0u8; 64];
    data[..32].copy_from_slice(left);
    data[32..].copy_from_slice(right);
    sha256(&data)
}
