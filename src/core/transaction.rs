//! Transaction handling for the ledger
//!
//! Implements a UTXO-based transaction model with secp256k1 signatures.
//! A transaction spends outputs by reference and creates new ones; the
//! reward transaction is the single input-less, unsigned transaction each
//! block uses to pay its producer.

use crate::core::encoding::{fits_length, Canonical, Encoder};
use crate::crypto::{sha256, verify_signature, KeyError, KeyPair};
use secp256k1::PublicKey;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// Error Types
// =============================================================================

/// Errors raised while building or signing a transaction
#[derive(Error, Debug)]
pub enum TransactionError {
    #[error("Reward transaction {0} must stay unsigned")]
    RewardCannotBeSigned(String),
    #[error("Crypto error: {0}")]
    CryptoError(#[from] KeyError),
}

// =============================================================================
// Outputs and references
// =============================================================================

/// Reference to one output of a previous transaction
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutPoint {
    pub tx_id: String,
    pub output_index: u32,
}

impl OutPoint {
    pub fn new(tx_id: impl Into<String>, output_index: u32) -> Self {
        Self {
            tx_id: tx_id.into(),
            output_index,
        }
    }
}

impl fmt::Display for OutPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.tx_id, self.output_index)
    }
}

/// Transaction input (reference to a previous output)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionInput {
    /// Transaction ID of the previous transaction
    pub tx_id: String,
    /// Index of the output in the previous transaction
    pub output_index: u32,
}

impl TransactionInput {
    pub fn outpoint(&self) -> OutPoint {
        OutPoint::new(self.tx_id.clone(), self.output_index)
    }
}

impl From<&OutPoint> for TransactionInput {
    fn from(outpoint: &OutPoint) -> Self {
        Self {
            tx_id: outpoint.tx_id.clone(),
            output_index: outpoint.output_index,
        }
    }
}

/// Transaction output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionOutput {
    /// Amount of coins
    pub amount: u64,
    /// Owner's compressed public key (hex)
    pub owner: String,
}

impl TransactionOutput {
    pub fn new(owner: impl Into<String>, amount: u64) -> Self {
        Self {
            amount,
            owner: owner.into(),
        }
    }

    /// Check if this output belongs to the given public key
    pub fn is_owned_by(&self, owner: &str) -> bool {
        self.owner == owner
    }
}

impl Canonical for TransactionInput {
    fn encode(&self, out: &mut Encoder) {
        out.put_str(&self.tx_id).put_u32(self.output_index);
    }
}

impl Canonical for TransactionOutput {
    fn encode(&self, out: &mut Encoder) {
        out.put_u64(self.amount).put_str(&self.owner);
    }
}

// =============================================================================
// Transaction
// =============================================================================

/// A value-transfer transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique transaction ID (random 256-bit value, hex)
    pub id: String,
    /// Outputs being spent
    pub inputs: Vec<TransactionInput>,
    /// Outputs being created
    pub outputs: Vec<TransactionOutput>,
    /// Compact ECDSA signature over the body; absent on reward transactions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl Transaction {
    /// Create a new unsigned transaction with a fresh id
    pub fn new(inputs: Vec<TransactionInput>, outputs: Vec<TransactionOutput>) -> Self {
        Self {
            id: random_id(),
            inputs,
            outputs,
            signature: None,
        }
    }

    /// Create a reward transaction paying `amount` to `owner`
    pub fn reward(owner: &str, amount: u64) -> Self {
        Self::new(Vec::new(), vec![TransactionOutput::new(owner, amount)])
    }

    /// Reward transactions are the ones without inputs
    pub fn is_reward(&self) -> bool {
        self.inputs.is_empty()
    }

    /// Canonical encoding of everything but the signature; this is what gets signed
    pub fn body_bytes(&self) -> Vec<u8> {
        let mut encoder = Encoder::new();
        self.encode_body(&mut encoder);
        encoder.finish()
    }

    /// Merkle leaf hash: SHA-256 over the full canonical encoding
    pub fn hash(&self) -> [u8; 32] {
        sha256(&self.canonical_bytes())
    }

    /// Sign the transaction body with the provided key pair
    pub fn sign(&mut self, key_pair: &KeyPair) -> Result<(), TransactionError> {
        if self.is_reward() {
            return Err(TransactionError::RewardCannotBeSigned(self.id.clone()));
        }
        self.signature = Some(key_pair.sign(&self.body_bytes())?);
        Ok(())
    }

    /// Check the signature against one owner's public key.
    ///
    /// A missing or undecodable signature never verifies.
    pub fn is_signed_by(&self, owner: &PublicKey) -> bool {
        match &self.signature {
            Some(signature) => {
                verify_signature(owner, &self.body_bytes(), signature).unwrap_or(false)
            }
            None => false,
        }
    }

    /// Get total output amount
    pub fn total_output(&self) -> u128 {
        self.outputs.iter().map(|o| u128::from(o.amount)).sum()
    }

    /// Outpoints created by this transaction
    pub fn outpoints(&self) -> impl Iterator<Item = (OutPoint, &TransactionOutput)> + '_ {
        self.outputs
            .iter()
            .enumerate()
            .map(move |(index, output)| (OutPoint::new(self.id.clone(), index as u32), output))
    }

    /// Every string and list in the transaction has a canonical length prefix
    pub fn fits_encoding(&self) -> bool {
        fits_length(self.id.len())
            && fits_length(self.inputs.len())
            && fits_length(self.outputs.len())
            && self.inputs.iter().all(|i| fits_length(i.tx_id.len()))
            && self.outputs.iter().all(|o| fits_length(o.owner.len()))
            && self.signature.as_ref().map_or(true, |s| fits_length(s.len()))
    }

    fn encode_body(&self, out: &mut Encoder) {
        out.put_str(&self.id)
            .put_seq(&self.inputs)
            .put_seq(&self.outputs);
    }
}

impl Canonical for Transaction {
    fn encode(&self, out: &mut Encoder) {
        self.encode_body(out);
        out.put_option_str(self.signature.as_deref());
    }
}

fn random_id() -> String {
    let bytes: [u8; 32] = rand::random();
    hex::encode(bytes)
}

// =============================================================================
// Transaction Builder
// =============================================================================

/// Builder for ordinary (input-spending) transactions
#[derive(Debug, Default)]
pub struct TransactionBuilder {
    inputs: Vec<TransactionInput>,
    outputs: Vec<TransactionOutput>,
}

impl TransactionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spend a previous output
    pub fn add_input(mut self, outpoint: &OutPoint) -> Self {
        self.inputs.push(TransactionInput::from(outpoint));
        self
    }

    /// Add an output
    pub fn add_output(mut self, owner: &str, amount: u64) -> Self {
        self.outputs.push(TransactionOutput::new(owner, amount));
        self
    }

    /// Build and sign the transaction
    pub fn build_and_sign(self, key_pair: &KeyPair) -> Result<Transaction, TransactionError> {
        let mut tx = self.build();
        tx.sign(key_pair)?;
        Ok(tx)
    }

    /// Build without signing
    pub fn build(self) -> Transaction {
        Transaction::new(self.inputs, self.outputs)
    }
}

// =============================================================================
// Tests
// =============================================================================
