//! Chain driver
//!
//! Owns the accepted blocks and the unspent output set that results from
//! them. Every mutation goes through `&mut self`, so one writer applies
//! blocks at a time; embedders sharing a chain across threads wrap it in
//! a lock.

use crate::config::{ChainConfig, SurplusPolicy};
use crate::core::block::{create_block_with_reward, make_genesis_block, Block};
use crate::core::ledger::stage_transactions;
use crate::core::transaction::Transaction;
use crate::core::utxo::{UnspentOutputSet, Utxo};
use crate::core::validator::{BlockError, BlockValidator};
use crate::crypto::KeyPair;
use crate::mining::{Miner, MiningError};
use log::info;
use thiserror::Error;

/// Chain-level errors
#[derive(Error, Debug)]
pub enum ChainError {
    #[error("Invalid block: {0}")]
    InvalidBlock(#[from] BlockError),
    #[error("Mining failed: {0}")]
    Mining(#[from] MiningError),
    #[error("First block is not the canonical genesis block")]
    InvalidGenesis,
    #[error("Reward plus fees overflows: {0}")]
    RewardOverflow(u128),
}

/// A genesis-rooted chain of validated blocks
#[derive(Debug, Clone)]
pub struct Chain {
    blocks: Vec<Block>,
    unspent: UnspentOutputSet,
    validator: BlockValidator,
}

impl Chain {
    /// Create a chain holding only the genesis block
    pub fn new(config: ChainConfig) -> Self {
        Self {
            blocks: vec![make_genesis_block()],
            unspent: UnspentOutputSet::new(),
            validator: BlockValidator::new(config),
        }
    }

    /// Rebuild a chain from stored blocks, revalidating each one
    pub fn from_blocks(blocks: Vec<Block>, config: ChainConfig) -> Result<Self, ChainError> {
        let mut chain = Self::new(config);
        let mut blocks = blocks.into_iter();

        if blocks.next().as_ref() != Some(chain.tip()) {
            return Err(ChainError::InvalidGenesis);
        }
        for block in blocks {
            chain.submit(block)?;
        }
        Ok(chain)
    }

    pub fn config(&self) -> &ChainConfig {
        self.validator.config()
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn unspent(&self) -> &UnspentOutputSet {
        &self.unspent
    }

    /// Get the latest block
    pub fn tip(&self) -> &Block {
        self.blocks
            .last()
            .expect("Chain should have at least genesis block")
    }

    /// Get chain height
    pub fn height(&self) -> u64 {
        self.tip().index
    }

    /// Get a block by index
    pub fn get_block(&self, index: u64) -> Option<&Block> {
        usize::try_from(index).ok().and_then(|i| self.blocks.get(i))
    }

    /// Get a block by hash
    pub fn get_block_by_hash(&self, hash: &str) -> Option<&Block> {
        self.blocks.iter().find(|b| b.hash == hash)
    }

    /// Validate `block` against the tip and append it
    pub fn submit(&mut self, block: Block) -> Result<(), ChainError> {
        let target = self.config().difficulty_target;
        let tip = self.blocks.last().ok_or(ChainError::InvalidGenesis)?;
        let summary = self
            .validator
            .check_block(tip, &block, target, &mut self.unspent)?;

        info!(
            "Appended block {} ({} txs, {} outputs spent, {} created)",
            block.index,
            block.tx_count(),
            summary.spent,
            summary.created
        );
        self.blocks.push(block);
        Ok(())
    }

    /// Build a candidate on the tip, mine it and append it
    pub fn mine_block(
        &mut self,
        transactions: Vec<Transaction>,
        producer: &KeyPair,
    ) -> Result<Block, ChainError> {
        let mut block = self.candidate(transactions, producer)?;

        let config = self.config();
        Miner::new(config.difficulty_target, config.max_mining_attempts).mine(&mut block)?;

        self.submit(block.clone())?;
        Ok(block)
    }

    /// Unmined candidate on the tip whose reward follows the surplus policy
    pub fn candidate(
        &self,
        transactions: Vec<Transaction>,
        producer: &KeyPair,
    ) -> Result<Block, ChainError> {
        let config = self.config();
        let base = config.block_reward;
        let probe = create_block_with_reward(transactions, self.tip(), producer, base);

        let forfeit = ChainConfig {
            surplus_policy: SurplusPolicy::Forfeit,
            ..config.clone()
        };
        let batch = stage_transactions(&probe.transactions, &self.unspent, &forfeit)
            .map_err(BlockError::from)?;

        match config.surplus_policy {
            SurplusPolicy::Forfeit => Ok(probe),
            SurplusPolicy::RewardProducer => {
                let total = u128::from(base) + batch.surplus;
                let reward = u64::try_from(total).map_err(|_| ChainError::RewardOverflow(total))?;

                let mut transactions = probe.transactions;
                transactions.pop();
                Ok(create_block_with_reward(transactions, self.tip(), producer, reward))
            }
        }
    }

    /// Unspent outputs owned by `owner`, ordered by outpoint
    pub fn outputs_owned_by(&self, owner: &str) -> Vec<Utxo> {
        self.unspent.owned_by(owner)
    }

    /// Replay every block from genesis into a fresh unspent set
    pub fn rebuild_unspent(&mut self) -> Result<(), ChainError> {
        let rebuilt = Self::from_blocks(self.blocks.clone(), self.config().clone())?;
        self.unspent = rebuilt.unspent;
        Ok(())
    }
}

impl Default for Chain {
    fn default() -> Self {
        Self::new(ChainConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ledger::LedgerError;
    use crate::core::transaction::{OutPoint, TransactionBuilder};
    use std::sync::{Arc, Mutex};
    use std::thread;

    fn test_chain() -> Chain {
        Chain::new(ChainConfig::permissive())
    }

    #[test]
    fn test_new_chain() {
        let chain = test_chain();
        assert_eq!(chain.blocks().len(), 1);
        assert_eq!(chain.height(), 0);
        assert!(chain.unspent().is_empty());
    }

    #[test]
    fn test_mine_block() {
        let mut chain = test_chain();
        let producer = KeyPair::generate();

        let block = chain.mine_block(vec![], &producer).unwrap();

        assert_eq!(block.index, 1);
        assert_eq!(chain.height(), 1);
        assert_eq!(chain.get_block(1), Some(&block));
        assert_eq!(chain.get_block_by_hash(&block.hash), Some(&block));
        assert_eq!(chain.outputs_owned_by(&producer.public_key_hex()).len(), 1);
    }

    #[test]
    fn test_mine_block_with_real_target() {
        let mut chain = Chain::new(ChainConfig {
            difficulty_target: 0x00ff_ffff,
            ..ChainConfig::default()
        });
        let block = chain.mine_block(vec![], &KeyPair::generate()).unwrap();
        assert!(crate::crypto::difficulty_of(&block.hash).unwrap() <= 0x00ff_ffff);
    }

    #[test]
    fn test_spend_across_blocks() {
        let mut chain = test_chain();
        let alice = KeyPair::generate();
        let bob = KeyPair::generate();

        let b1 = chain.mine_block(vec![], &alice).unwrap();
        let reward = OutPoint::new(b1.reward_tx().unwrap().id.clone(), 0);

        let tx = TransactionBuilder::new()
            .add_input(&reward)
            .add_output(&bob.public_key_hex(), 30)
            .add_output(&alice.public_key_hex(), 20)
            .build_and_sign(&alice)
            .unwrap();
        chain.mine_block(vec![tx], &bob).unwrap();

        let bob_outputs = chain.outputs_owned_by(&bob.public_key_hex());
        assert_eq!(bob_outputs.len(), 2);
        let alice_outputs = chain.outputs_owned_by(&alice.public_key_hex());
        assert_eq!(alice_outputs.len(), 1);
        assert_eq!(alice_outputs[0].output.amount, 20);
    }

    #[test]
    fn test_reward_producer_candidate_claims_fee() {
        let mut chain = Chain::new(ChainConfig {
            surplus_policy: SurplusPolicy::RewardProducer,
            ..ChainConfig::permissive()
        });
        let alice = KeyPair::generate();
        let bob = KeyPair::generate();

        let b1 = chain.mine_block(vec![], &alice).unwrap();
        let reward = OutPoint::new(b1.reward_tx().unwrap().id.clone(), 0);
        let tx = TransactionBuilder::new()
            .add_input(&reward)
            .add_output(&bob.public_key_hex(), 45)
            .build_and_sign(&alice)
            .unwrap();

        let b2 = chain.mine_block(vec![tx], &bob).unwrap();
        let fee_reward = b2.reward_tx().unwrap();
        assert_eq!(fee_reward.outputs[0].amount, chain.config().block_reward + 5);
    }

    #[test]
    fn test_invalid_candidate_is_rejected_before_mining() {
        let mut chain = test_chain();
        let alice = KeyPair::generate();
        let ghost = OutPoint::new("cd".repeat(32), 0);
        let tx = TransactionBuilder::new()
            .add_input(&ghost)
            .add_output(&alice.public_key_hex(), 1)
            .build_and_sign(&alice)
            .unwrap();

        let err = chain.mine_block(vec![tx], &alice).unwrap_err();
        assert!(matches!(
            err,
            ChainError::InvalidBlock(BlockError::Ledger(LedgerError::UnknownOutput { .. }))
        ));
        assert_eq!(chain.height(), 0);
    }

    #[test]
    fn test_from_blocks_revalidates() {
        let mut chain = test_chain();
        let producer = KeyPair::generate();
        chain.mine_block(vec![], &producer).unwrap();
        chain.mine_block(vec![], &producer).unwrap();

        let restored = Chain::from_blocks(chain.blocks().to_vec(), ChainConfig::permissive())
            .unwrap();
        assert_eq!(restored.height(), 2);
        assert_eq!(restored.unspent(), chain.unspent());

        let mut tampered = chain.blocks().to_vec();
        tampered[2].nonce += 1;
        assert!(matches!(
            Chain::from_blocks(tampered, ChainConfig::permissive()),
            Err(ChainError::InvalidBlock(BlockError::InvalidHash { .. }))
        ));

        let mut no_genesis = chain.blocks().to_vec();
        no_genesis.remove(0);
        assert!(matches!(
            Chain::from_blocks(no_genesis, ChainConfig::permissive()),
            Err(ChainError::InvalidGenesis)
        ));
    }

    #[test]
    fn test_rebuild_unspent() {
        let mut chain = test_chain();
        chain.mine_block(vec![], &KeyPair::generate()).unwrap();
        let before = chain.unspent().clone();

        chain.rebuild_unspent().unwrap();
        assert_eq!(chain.unspent(), &before);
    }

    #[test]
    fn test_competing_blocks_apply_once() {
        let chain = test_chain();
        let a = chain.candidate(vec![], &KeyPair::generate()).unwrap();
        let b = chain.candidate(vec![], &KeyPair::generate()).unwrap();
        let shared = Arc::new(Mutex::new(chain));

        let handles: Vec<_> = [a, b]
            .into_iter()
            .map(|block| {
                let shared = Arc::clone(&shared);
                thread::spawn(move || shared.lock().unwrap().submit(block).is_ok())
            })
            .collect();
        let accepted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();

        assert_eq!(accepted, 1);
        let chain = shared.lock().unwrap();
        assert_eq!(chain.height(), 1);
        assert_eq!(chain.unspent().len(), 1);
    }
}
