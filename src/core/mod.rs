//! Core ledger components
//!
//! This module contains the validation and chaining engine:
//! - Canonical encoding of hashed data
//! - Transactions (UTXO model with secp256k1 signatures)
//! - Unspent output set with staged, all-or-nothing updates
//! - Ledger validation of transaction batches
//! - Blocks, block validation and the chain driver

pub mod block;
pub mod chain;
pub mod encoding;
pub mod ledger;
pub mod transaction;
pub mod utxo;
pub mod validator;

pub use block::{
    content_hash, create_block, create_block_with_reward, make_genesis_block, merkle_root, Block,
    GENESIS_PREV_HASH, GENESIS_TIME,
};
pub use chain::{Chain, ChainError};
pub use encoding::{fits_length, Canonical, Encoder};
pub use ledger::{
    check_transaction_data, check_transactions, stage_transactions, LedgerError, LedgerSummary,
    StagedBatch,
};
pub use transaction::{
    OutPoint, Transaction, TransactionBuilder, TransactionError, TransactionInput,
    TransactionOutput,
};
pub use utxo::{StagedUtxos, UnspentOutputSet, Utxo, UtxoDelta};
pub use validator::{check_block, check_block_data, BlockError, BlockStatus, BlockValidator};
