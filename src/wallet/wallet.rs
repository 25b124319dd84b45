//! Wallet implementation for the ledger
//!
//! Holds a key pair, persists it as a JSON key file and builds signed
//! transfers by selecting owned unspent outputs.

use crate::core::{Transaction, TransactionBuilder, TransactionError, UnspentOutputSet, Utxo};
use crate::crypto::KeyPair;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Wallet-related errors
#[derive(Error, Debug)]
pub enum WalletError {
    #[error("Transfer amount must be positive")]
    ZeroAmount,
    #[error("Insufficient funds: have {have}, need {need}")]
    InsufficientFunds { have: u64, need: u64 },
    #[error("Transaction error: {0}")]
    TransactionError(#[from] TransactionError),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Crypto error: {0}")]
    CryptoError(#[from] crate::crypto::KeyError),
}

/// Serializable wallet data for persistence
#[derive(Debug, Serialize, Deserialize)]
struct WalletData {
    private_key_hex: String,
    public_key: String,
    label: Option<String>,
}

/// A ledger wallet for managing keys and creating transactions
#[derive(Debug, Clone)]
pub struct Wallet {
    /// The key pair for signing transactions
    key_pair: KeyPair,
    /// Optional label for the wallet
    pub label: Option<String>,
}

impl Wallet {
    /// Create a new wallet with a fresh key pair
    pub fn new() -> Self {
        Self {
            key_pair: KeyPair::generate(),
            label: None,
        }
    }

    /// Create a wallet with a label
    pub fn with_label(label: &str) -> Self {
        Self {
            key_pair: KeyPair::generate(),
            label: Some(label.to_string()),
        }
    }

    /// Import a wallet from a private key
    pub fn from_private_key(private_key_hex: &str) -> Result<Self, WalletError> {
        let key_pair = KeyPair::from_private_key_hex(private_key_hex)?;
        Ok(Self {
            key_pair,
            label: None,
        })
    }

    /// Get the wallet's public key (hex); this is what outputs are paid to
    pub fn public_key(&self) -> String {
        self.key_pair.public_key_hex()
    }

    /// Get the wallet's private key (hex)
    /// WARNING: Keep this secret!
    pub fn private_key(&self) -> String {
        self.key_pair.private_key_hex()
    }

    pub fn key_pair(&self) -> &KeyPair {
        &self.key_pair
    }

    /// Unspent outputs owned by this wallet
    pub fn utxos(&self, unspent: &UnspentOutputSet) -> Vec<Utxo> {
        unspent.owned_by(&self.public_key())
    }

    /// Create a signed transaction paying `amount` to `recipient`.
    ///
    /// Owned outputs are taken in outpoint order until the amount is
    /// covered; any excess comes back to this wallet as change.
    pub fn create_transaction(
        &self,
        recipient: &str,
        amount: u64,
        unspent: &UnspentOutputSet,
    ) -> Result<Transaction, WalletError> {
        if amount == 0 {
            return Err(WalletError::ZeroAmount);
        }

        let mut builder = TransactionBuilder::new();
        let mut selected: u64 = 0;

        for utxo in self.utxos(unspent) {
            if selected >= amount {
                break;
            }
            builder = builder.add_input(&utxo.outpoint);
            selected = selected.saturating_add(utxo.output.amount);
        }

        if selected < amount {
            return Err(WalletError::InsufficientFunds {
                have: selected,
                need: amount,
            });
        }

        builder = builder.add_output(recipient, amount);

        let change = selected - amount;
        if change > 0 {
            builder = builder.add_output(&self.public_key(), change);
        }

        Ok(builder.build_and_sign(&self.key_pair)?)
    }

    /// Save wallet to file
    pub fn save(&self, path: &Path) -> Result<(), WalletError> {
        let data = WalletData {
            private_key_hex: self.private_key(),
            public_key: self.public_key(),
            label: self.label.clone(),
        };

        let json = serde_json::to_string_pretty(&data)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load wallet from file
    pub fn load(path: &Path) -> Result<Self, WalletError> {
        let json = fs::read_to_string(path)?;
        let data: WalletData = serde_json::from_str(&json)?;

        let mut wallet = Self::from_private_key(&data.private_key_hex)?;
        wallet.label = data.label;
        Ok(wallet)
    }
}

impl Default for Wallet {
    fn default() -> Self {
        Self::new()
    }
}
