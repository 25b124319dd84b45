//! Mini-Ledger: a proof-of-work ledger validation engine in Rust
//!
//! This crate provides:
//! - SHA-256 content hashing over a canonical binary encoding
//! - Merkle roots over transaction hashes
//! - A 32-bit difficulty target checked against the hash prefix
//! - ECDSA signatures (secp256k1) over transaction bodies
//! - UTXO ledger validation with all-or-nothing application
//! - Block validation, mining and a genesis-rooted chain driver
//!
//! # Example
//!
//! ```rust
//! use mini_ledger::config::ChainConfig;
//! use mini_ledger::core::Chain;
//! use mini_ledger::wallet::Wallet;
//!
//! let mut chain = Chain::new(ChainConfig::permissive());
//! let alice = Wallet::new();
//! let bob = Wallet::new();
//!
//! // Mine a block paying the reward to alice
//! chain.mine_block(vec![], alice.key_pair()).unwrap();
//!
//! // Spend it
//! let tx = alice
//!     .create_transaction(&bob.public_key(), 20, chain.unspent())
//!     .unwrap();
//! chain.mine_block(vec![tx], bob.key_pair()).unwrap();
//!
//! assert_eq!(bob.utxos(chain.unspent()).len(), 2);
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod crypto;
pub mod mining;
pub mod wallet;

// Re-export commonly used types
pub use crate::config::{ChainConfig, SurplusPolicy, BLOCK_REWARD};
pub use crate::core::{
    check_block, check_transactions, make_genesis_block, Block, BlockError, BlockValidator,
    Chain, LedgerError, Transaction, UnspentOutputSet,
};
pub use crate::crypto::KeyPair;
pub use crate::mining::Miner;
pub use crate::wallet::Wallet;
