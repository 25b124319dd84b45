//! Mining module for proof-of-work nonce search

pub mod miner;

pub use miner::{Miner, MiningError, MiningStats};
