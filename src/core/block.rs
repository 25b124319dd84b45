//! Block implementation for the ledger
//!
//! A block commits to its transactions twice: through the content hash,
//! which covers every field except the Merkle root and the hash itself,
//! and through the Merkle root over the transaction hashes.

use crate::config::BLOCK_REWARD;
use crate::core::encoding::Encoder;
use crate::core::transaction::Transaction;
use crate::crypto::{calculate_merkle_root_hex, sha256_hex, KeyPair};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// `prev_hash` of the genesis block; a sentinel, not a real digest
pub const GENESIS_PREV_HASH: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";

/// Fixed timestamp of the genesis block
pub const GENESIS_TIME: u64 = 1_505_759_228;

/// A block in the chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    /// Block index/height
    pub index: u64,
    /// Hash of the previous block
    pub prev_hash: String,
    /// Creation time in unix seconds
    pub time: u64,
    /// Transactions in the block, reward included
    pub transactions: Vec<Transaction>,
    /// Proof-of-work nonce
    pub nonce: u64,
    /// Merkle root of the transaction hashes
    pub merkle_root: String,
    /// Content hash stamped by the producer
    pub hash: String,
}

/// SHA-256 over the canonical encoding of the hashed block fields, in order
pub fn content_hash(
    index: u64,
    prev_hash: &str,
    time: u64,
    transactions: &[Transaction],
    nonce: u64,
) -> String {
    let mut encoder = Encoder::new();
    encoder
        .put_u64(index)
        .put_str(prev_hash)
        .put_u64(time)
        .put_seq(transactions)
        .put_u64(nonce);
    sha256_hex(&encoder.finish())
}

/// Merkle root over the transactions' hashes, as hex
pub fn merkle_root(transactions: &[Transaction]) -> String {
    let leaves: Vec<[u8; 32]> = transactions.iter().map(Transaction::hash).collect();
    calculate_merkle_root_hex(&leaves)
}

impl Block {
    /// Assemble an unmined block (`nonce = 0`) with its commitments computed
    pub fn new(index: u64, prev_hash: String, time: u64, transactions: Vec<Transaction>) -> Self {
        let merkle_root = merkle_root(&transactions);
        let mut block = Self {
            index,
            prev_hash,
            time,
            transactions,
            nonce: 0,
            merkle_root,
            hash: String::new(),
        };
        block.hash = block.calculate_hash();
        block
    }

    /// The canonical height-0 block
    pub fn genesis() -> Self {
        Self::new(0, GENESIS_PREV_HASH.to_string(), GENESIS_TIME, Vec::new())
    }

    /// Recompute the content hash from the current fields
    pub fn calculate_hash(&self) -> String {
        content_hash(
            self.index,
            &self.prev_hash,
            self.time,
            &self.transactions,
            self.nonce,
        )
    }

    /// Recompute the Merkle root from the current transactions
    pub fn calculate_merkle_root(&self) -> String {
        merkle_root(&self.transactions)
    }

    /// Set the nonce and restamp the hash
    pub fn set_nonce(&mut self, nonce: u64) {
        self.nonce = nonce;
        self.hash = self.calculate_hash();
    }

    /// The block's reward transaction, if it has exactly one
    pub fn reward_tx(&self) -> Option<&Transaction> {
        let mut rewards = self.transactions.iter().filter(|tx| tx.is_reward());
        match (rewards.next(), rewards.next()) {
            (Some(reward), None) => Some(reward),
            _ => None,
        }
    }

    /// Get number of transactions in this block
    pub fn tx_count(&self) -> usize {
        self.transactions.len()
    }
}

/// Create the canonical genesis block
pub fn make_genesis_block() -> Block {
    Block::genesis()
}

/// Create an unmined candidate on top of `last_block`, paying the standard
/// issuance to `producer`
pub fn create_block(transactions: Vec<Transaction>, last_block: &Block, producer: &KeyPair) -> Block {
    create_block_with_reward(transactions, last_block, producer, BLOCK_REWARD)
}

/// Like [`create_block`] with an explicit reward amount
pub fn create_block_with_reward(
    mut transactions: Vec<Transaction>,
    last_block: &Block,
    producer: &KeyPair,
    reward: u64,
) -> Block {
    transactions.push(Transaction::reward(&producer.public_key_hex(), reward));

    let time = u64::try_from(Utc::now().timestamp()).unwrap_or_default();
    // Saturates at u64::MAX; the validator rejects such a successor.
    Block::new(
        last_block.index.saturating_add(1),
        last_block.hash.clone(),
        time,
        transactions,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_genesis_block() {
        let genesis = make_genesis_block();
        assert_eq!(genesis.index, 0);
        assert_eq!(genesis.prev_hash, "0".repeat(64));
        assert_eq!(genesis.time, GENESIS_TIME);
        assert_eq!(genesis.nonce, 0);
        assert!(genesis.transactions.is_empty());
        assert_eq!(genesis.merkle_root, sha256_hex(b""));
        assert_eq!(genesis.hash, genesis.calculate_hash());
    }

    #[test]
    fn test_genesis_is_deterministic() {
        assert_eq!(make_genesis_block(), make_genesis_block());
    }

    #[test]
    fn test_create_block_links_to_parent() {
        let genesis = make_genesis_block();
        let producer = KeyPair::generate();
        let block = create_block(vec![], &genesis, &producer);

        assert_eq!(block.index, 1);
        assert_eq!(block.prev_hash, genesis.hash);
        assert_eq!(block.nonce, 0);
        assert_eq!(block.tx_count(), 1);
        assert_eq!(block.hash, block.calculate_hash());
        assert_eq!(block.merkle_root, block.calculate_merkle_root());

        let reward = block.reward_tx().unwrap();
        assert_eq!(reward.outputs[0].owner, producer.public_key_hex());
        assert_eq!(reward.outputs[0].amount, BLOCK_REWARD);
    }

    #[test]
    fn test_create_block_on_max_height_does_not_overflow() {
        let mut last = make_genesis_block();
        last.index = u64::MAX;
        let block = create_block(vec![], &last, &KeyPair::generate());
        assert_eq!(block.index, u64::MAX);
    }

    #[test]
    fn test_reward_is_appended_last() {
        let genesis = make_genesis_block();
        let producer = KeyPair::generate();
        let other = Transaction::reward(&producer.public_key_hex(), 1);
        let block = create_block(vec![other.clone()], &genesis, &producer);

        assert_eq!(block.transactions[0], other);
        assert!(block.reward_tx().is_none());
    }

    #[test]
    fn test_hash_covers_every_field() {
        let genesis = make_genesis_block();
        let block = create_block(vec![], &genesis, &KeyPair::generate());
        let original = block.calculate_hash();

        let mut b = block.clone();
        b.index += 1;
        assert_ne!(b.calculate_hash(), original);

        let mut b = block.clone();
        b.prev_hash = "1".repeat(64);
        assert_ne!(b.calculate_hash(), original);

        let mut b = block.clone();
        b.time += 1;
        assert_ne!(b.calculate_hash(), original);

        let mut b = block.clone();
        b.nonce += 1;
        assert_ne!(b.calculate_hash(), original);

        let mut b = block.clone();
        b.transactions[0].outputs[0].amount += 1;
        assert_ne!(b.calculate_hash(), original);

        let mut b = block;
        b.merkle_root = "f".repeat(64);
        assert_eq!(b.calculate_hash(), original);
    }

    #[test]
    fn test_set_nonce_restamps_hash() {
        let mut block = create_block(vec![], &make_genesis_block(), &KeyPair::generate());
        let before = block.hash.clone();
        block.set_nonce(7);
        assert_eq!(block.nonce, 7);
        assert_ne!(block.hash, before);
        assert_eq!(block.hash, block.calculate_hash());
    }

    #[test]
    fn test_merkle_root_is_order_sensitive() {
        let a = Transaction::reward("a", 1);
        let b = Transaction::reward("b", 2);
        assert_eq!(
            merkle_root(&[a.clone(), b.clone()]),
            merkle_root(&[a.clone(), b.clone()])
        );
        assert_ne!(merkle_root(&[a.clone(), b.clone()]), merkle_root(&[b, a]));
    }

    #[test]
    fn test_json_field_names() {
        let json = serde_json::to_value(make_genesis_block()).unwrap();
        for field in ["index", "prevHash", "time", "transactions", "nonce", "merkleRoot", "hash"] {
            assert!(json.get(field).is_some(), "missing {}", field);
        }
    }
}
