//! Block validation and chain rule
//!
//! `check_block` runs an ordered pipeline; the first failing rule decides
//! the error and nothing is written to the unspent output set unless every
//! rule passes.

use crate::config::ChainConfig;
use crate::core::block::{merkle_root, Block};
use crate::core::encoding::fits_length;
use crate::core::ledger::{stage_transactions, LedgerError, LedgerSummary};
use crate::core::transaction::Transaction;
use crate::core::utxo::UnspentOutputSet;
use crate::crypto::{difficulty_of, is_digest_hex};
use log::{debug, info};
use thiserror::Error;

/// Block validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BlockError {
    #[error("Malformed block {index}: {reason}")]
    MalformedBlock { index: u64, reason: String },
    #[error("Block difficulty {difficulty:#010x} exceeds target {target:#010x}")]
    DifficultyExceeded { difficulty: u32, target: u32 },
    #[error("Invalid block index: expected {expected}, got {actual}")]
    InvalidIndex { expected: u64, actual: u64 },
    #[error("Invalid prevHash: expected {expected}, got {actual}")]
    InvalidPrevHash { expected: String, actual: String },
    #[error("Invalid block hash: computed {computed}, stamped {stamped}")]
    InvalidHash { computed: String, stamped: String },
    #[error("Invalid merkle root: computed {computed}, stamped {stamped}")]
    InvalidMerkleRoot { computed: String, stamped: String },
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Validation outcome of a candidate block
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockStatus {
    Valid(LedgerSummary),
    Rejected(BlockError),
}

impl From<Result<LedgerSummary, BlockError>> for BlockStatus {
    fn from(result: Result<LedgerSummary, BlockError>) -> Self {
        match result {
            Ok(summary) => BlockStatus::Valid(summary),
            Err(err) => BlockStatus::Rejected(err),
        }
    }
}

/// Validates candidate blocks under a fixed [`ChainConfig`]
#[derive(Debug, Clone, Default)]
pub struct BlockValidator {
    config: ChainConfig,
}

impl BlockValidator {
    pub fn new(config: ChainConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    /// Check `block` as the successor of `previous_block` and, on success,
    /// apply its transactions to `unspent`
    pub fn check_block(
        &self,
        previous_block: &Block,
        block: &Block,
        difficulty_target: u32,
        unspent: &mut UnspentOutputSet,
    ) -> Result<LedgerSummary, BlockError> {
        let result = self.check_block_inner(previous_block, block, difficulty_target, unspent);
        match &result {
            Ok(_) => info!("Block {} ({}) accepted", block.index, block.hash),
            Err(e) => debug!("Block {} rejected: {}", block.index, e),
        }
        result
    }

    fn check_block_inner(
        &self,
        previous_block: &Block,
        block: &Block,
        difficulty_target: u32,
        unspent: &mut UnspentOutputSet,
    ) -> Result<LedgerSummary, BlockError> {
        check_block_data(block)?;

        // Structural check guarantees a readable prefix.
        let difficulty = difficulty_of(&block.hash).unwrap_or(u32::MAX);
        if difficulty > difficulty_target {
            return Err(BlockError::DifficultyExceeded {
                difficulty,
                target: difficulty_target,
            });
        }

        // Height u64::MAX has no successor.
        let Some(expected_index) = previous_block.index.checked_add(1) else {
            return Err(BlockError::InvalidIndex {
                expected: previous_block.index,
                actual: block.index,
            });
        };
        if block.index != expected_index {
            return Err(BlockError::InvalidIndex {
                expected: expected_index,
                actual: block.index,
            });
        }

        if block.prev_hash != previous_block.hash {
            return Err(BlockError::InvalidPrevHash {
                expected: previous_block.hash.clone(),
                actual: block.prev_hash.clone(),
            });
        }

        let computed = block.calculate_hash();
        if computed != block.hash {
            return Err(BlockError::InvalidHash {
                computed,
                stamped: block.hash.clone(),
            });
        }

        let batch = stage_transactions(&block.transactions, unspent, &self.config)?;

        let computed = merkle_root(&block.transactions);
        if computed != block.merkle_root {
            return Err(BlockError::InvalidMerkleRoot {
                computed,
                stamped: block.merkle_root.clone(),
            });
        }

        Ok(batch.commit(unspent))
    }

    /// Run [`BlockValidator::check_block`] and report the terminal state
    pub fn evaluate(
        &self,
        previous_block: &Block,
        block: &Block,
        difficulty_target: u32,
        unspent: &mut UnspentOutputSet,
    ) -> BlockStatus {
        self.check_block(previous_block, block, difficulty_target, unspent)
            .into()
    }
}

/// Structural validation of the block's own fields
pub fn check_block_data(block: &Block) -> Result<(), BlockError> {
    let malformed = |reason: &str| BlockError::MalformedBlock {
        index: block.index,
        reason: reason.to_string(),
    };

    if !is_digest_hex(&block.prev_hash) {
        return Err(malformed("prevHash is not a 64 character hex digest"));
    }
    if !is_digest_hex(&block.hash) {
        return Err(malformed("hash is not a 64 character hex digest"));
    }
    if !is_digest_hex(&block.merkle_root) {
        return Err(malformed("merkleRoot is not a 64 character hex digest"));
    }
    if !fits_length(block.transactions.len())
        || !block.transactions.iter().all(Transaction::fits_encoding)
    {
        return Err(malformed("field length exceeds the encodable limit"));
    }
    Ok(())
}

/// [`BlockValidator::check_block`] under the default configuration
pub fn check_block(
    previous_block: &Block,
    block: &Block,
    difficulty_target: u32,
    unspent: &mut UnspentOutputSet,
) -> Result<LedgerSummary, BlockError> {
    BlockValidator::default().check_block(previous_block, block, difficulty_target, unspent)
}
