//! Nonce search for candidate blocks
//!
//! Mining sits outside validation: it only iterates the nonce and
//! restamps the hash until the block's difficulty value is within the
//! target. Validation re-derives everything independently.

use crate::core::Block;
use crate::crypto::meets_difficulty;
use log::{debug, info};
use std::time::Instant;
use thiserror::Error;

/// Mining errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MiningError {
    #[error("No nonce met target {target:#010x} after {attempts} attempts")]
    Exhausted { target: u32, attempts: u64 },
}

/// Mining statistics
#[derive(Debug, Clone)]
pub struct MiningStats {
    /// Number of hash attempts
    pub hash_attempts: u64,
    /// Time taken in milliseconds
    pub time_ms: u128,
    /// Hash rate (hashes per second)
    pub hash_rate: f64,
}

/// Proof-of-work nonce searcher
#[derive(Debug, Clone)]
pub struct Miner {
    /// Highest accepted difficulty value
    pub target: u32,
    /// Attempts before giving up
    pub max_attempts: u64,
}

impl Miner {
    pub fn new(target: u32, max_attempts: u64) -> Self {
        Self {
            target,
            max_attempts,
        }
    }

    /// Search nonces from 0 until the block's hash meets the target.
    ///
    /// On failure the block keeps the last nonce tried.
    pub fn mine(&self, block: &mut Block) -> Result<MiningStats, MiningError> {
        let start = Instant::now();
        debug!(
            "Mining block {} with target {:#010x}...",
            block.index, self.target
        );

        for attempt in 0..self.max_attempts {
            block.set_nonce(attempt);

            if meets_difficulty(&block.hash, self.target) {
                let stats = Self::stats(attempt + 1, start);
                info!(
                    "Block {} mined in {}ms ({} attempts, {:.2} H/s)",
                    block.index, stats.time_ms, stats.hash_attempts, stats.hash_rate
                );
                return Ok(stats);
            }
        }

        Err(MiningError::Exhausted {
            target: self.target,
            attempts: self.max_attempts,
        })
    }

    fn stats(hash_attempts: u64, start: Instant) -> MiningStats {
        let elapsed = start.elapsed();
        let secs = elapsed.as_secs_f64();
        let hash_rate = if secs > 0.0 {
            hash_attempts as f64 / secs
        } else {
            0.0
        };

        MiningStats {
            hash_attempts,
            time_ms: elapsed.as_millis(),
            hash_rate,
        }
    }
}
