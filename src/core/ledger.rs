//! Transaction ledger validation
//!
//! Checks a block's transaction list against the unspent output set:
//! every spend must reference a live output exactly once, carry a valid
//! signature from each owner it spends from, and not create more value
//! than it consumes. Exactly one reward transaction pays the producer.

use crate::config::{ChainConfig, SurplusPolicy};
use crate::core::transaction::{OutPoint, Transaction};
use crate::core::utxo::{StagedUtxos, UnspentOutputSet, UtxoDelta};
use crate::crypto::{is_digest_hex, is_lower_hex, public_key_from_hex, SIGNATURE_HEX_LEN};
use log::debug;
use std::collections::{BTreeSet, HashSet};
use thiserror::Error;

/// Ledger validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Malformed transaction {tx_id}: {reason}")]
    MalformedTransaction { tx_id: String, reason: String },
    #[error("Transaction {tx_id} spends unknown output {outpoint}")]
    UnknownOutput { tx_id: String, outpoint: OutPoint },
    #[error("Transaction {tx_id} double-spends output {outpoint}")]
    DoubleSpend { tx_id: String, outpoint: OutPoint },
    #[error("Transaction {tx_id} is not signed by owner {owner}")]
    InvalidSignature { tx_id: String, owner: String },
    #[error("Transaction {tx_id} creates {output_total} from inputs worth {input_total}")]
    Overspend {
        tx_id: String,
        input_total: u128,
        output_total: u128,
    },
    #[error("Expected exactly one reward transaction, found {0}")]
    InvalidRewardCount(usize),
    #[error("Reward transaction {tx_id} pays {actual}, expected {expected}")]
    InvalidRewardAmount {
        tx_id: String,
        expected: u128,
        actual: u128,
    },
}

/// Result of staging a transaction list without committing it
#[derive(Debug, Clone)]
pub struct StagedBatch {
    /// Changes to apply to the unspent output set
    pub delta: UtxoDelta,
    /// Input value not assigned to outputs, summed over the batch
    pub surplus: u128,
    /// Id of the batch's reward transaction
    pub reward_tx_id: String,
}

impl StagedBatch {
    /// Apply the staged changes to `unspent`
    pub fn commit(self, unspent: &mut UnspentOutputSet) -> LedgerSummary {
        let summary = LedgerSummary {
            reward_tx_id: self.reward_tx_id,
            surplus: self.surplus,
            spent: self.delta.spent().count(),
            created: self.delta.created().count(),
        };
        self.delta.apply(unspent);
        summary
    }
}

/// Outcome of a committed batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerSummary {
    pub reward_tx_id: String,
    pub surplus: u128,
    pub spent: usize,
    pub created: usize,
}

/// Structural sanity of a single transaction
pub fn check_transaction_data(tx: &Transaction) -> Result<(), LedgerError> {
    let malformed = |reason: String| LedgerError::MalformedTransaction {
        tx_id: tx.id.clone(),
        reason,
    };

    if !tx.fits_encoding() {
        return Err(malformed("field length exceeds the encodable limit".into()));
    }

    if !is_digest_hex(&tx.id) {
        return Err(malformed("id is not a 64 character hex digest".into()));
    }

    for (index, input) in tx.inputs.iter().enumerate() {
        if !is_digest_hex(&input.tx_id) {
            return Err(malformed(format!("input {} has malformed txId", index)));
        }
    }

    if tx.outputs.is_empty() {
        return Err(malformed("no outputs".into()));
    }

    for (index, output) in tx.outputs.iter().enumerate() {
        if public_key_from_hex(&output.owner).is_err() {
            return Err(malformed(format!("output {} has invalid owner key", index)));
        }
    }

    if let Some(signature) = &tx.signature {
        if !is_lower_hex(signature, SIGNATURE_HEX_LEN) {
            return Err(malformed("signature is not 128 hex characters".into()));
        }
    }

    if tx.is_reward() {
        if tx.signature.is_some() {
            return Err(malformed("reward transaction carries a signature".into()));
        }
        if tx.outputs.len() != 1 {
            return Err(malformed(format!(
                "reward transaction has {} outputs",
                tx.outputs.len()
            )));
        }
    }

    Ok(())
}

/// Validate `transactions` against `unspent` and stage, but do not apply, the result
pub fn stage_transactions(
    transactions: &[Transaction],
    unspent: &UnspentOutputSet,
    config: &ChainConfig,
) -> Result<StagedBatch, LedgerError> {
    let rewards: Vec<&Transaction> = transactions.iter().filter(|tx| tx.is_reward()).collect();
    let &[reward] = rewards.as_slice() else {
        return Err(LedgerError::InvalidRewardCount(rewards.len()));
    };

    let mut staged = StagedUtxos::new(unspent);
    let mut seen_ids = HashSet::new();
    let mut surplus: u128 = 0;

    for tx in transactions {
        check_transaction_data(tx)?;

        let id_taken = !seen_ids.insert(tx.id.as_str())
            || tx.outpoints().any(|(outpoint, _)| staged.get(&outpoint).is_some());
        if id_taken {
            return Err(LedgerError::MalformedTransaction {
                tx_id: tx.id.clone(),
                reason: "duplicate transaction id".into(),
            });
        }

        if !tx.is_reward() {
            surplus += stage_spend(tx, &mut staged)?;
        }

        for (outpoint, output) in tx.outpoints() {
            staged.create(outpoint, output.clone());
        }
    }

    let expected = u128::from(config.block_reward)
        + match config.surplus_policy {
            SurplusPolicy::Forfeit => 0,
            SurplusPolicy::RewardProducer => surplus,
        };
    let actual = reward.total_output();
    if actual != expected {
        return Err(LedgerError::InvalidRewardAmount {
            tx_id: reward.id.clone(),
            expected,
            actual,
        });
    }

    Ok(StagedBatch {
        delta: staged.into_delta(),
        surplus,
        reward_tx_id: reward.id.clone(),
    })
}

/// Validate `transactions` and, only if all of them pass, apply them to `unspent`
pub fn check_transactions(
    transactions: &[Transaction],
    unspent: &mut UnspentOutputSet,
    config: &ChainConfig,
) -> Result<LedgerSummary, LedgerError> {
    let batch = stage_transactions(transactions, unspent, config).map_err(|e| {
        debug!("Rejected transaction batch: {}", e);
        e
    })?;
    Ok(batch.commit(unspent))
}

/// Check one ordinary transaction against the staged view and stage its spends.
/// Returns the value it leaves unassigned.
fn stage_spend(tx: &Transaction, staged: &mut StagedUtxos<'_>) -> Result<u128, LedgerError> {
    let mut consumed = HashSet::new();
    let mut owners = BTreeSet::new();
    let mut input_total: u128 = 0;

    for input in &tx.inputs {
        let outpoint = input.outpoint();

        if staged.is_spent(&outpoint) || consumed.contains(&outpoint) {
            return Err(LedgerError::DoubleSpend {
                tx_id: tx.id.clone(),
                outpoint,
            });
        }

        let output = staged
            .get(&outpoint)
            .ok_or_else(|| LedgerError::UnknownOutput {
                tx_id: tx.id.clone(),
                outpoint: outpoint.clone(),
            })?;

        input_total += u128::from(output.amount);
        owners.insert(output.owner.clone());
        consumed.insert(outpoint);
    }

    for owner in owners {
        let signed = public_key_from_hex(&owner).map_or(false, |key| tx.is_signed_by(&key));
        if !signed {
            return Err(LedgerError::InvalidSignature {
                tx_id: tx.id.clone(),
                owner,
            });
        }
    }

    let output_total = tx.total_output();
    if output_total > input_total {
        return Err(LedgerError::Overspend {
            tx_id: tx.id.clone(),
            input_total,
            output_total,
        });
    }

    for outpoint in &consumed {
        staged.spend(outpoint);
    }

    Ok(input_total - output_total)
}
