//! CLI commands for the ledger
//!
//! Every command works on JSON files: blocks, transaction lists, unspent
//! output sets and wallet key files.

use crate::config::ChainConfig;
use crate::core::{
    create_block_with_reward, make_genesis_block, Block, BlockValidator, Transaction,
    UnspentOutputSet, Utxo,
};
use crate::mining::Miner;
use crate::wallet::Wallet;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

fn read_json<T: DeserializeOwned>(path: &Path) -> CliResult<T> {
    let json = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> CliResult<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    Ok(())
}

/// Missing unspent-output files are treated as an empty set
fn read_unspent(path: &Path) -> CliResult<UnspentOutputSet> {
    if !path.exists() {
        return Ok(UnspentOutputSet::new());
    }
    let utxos: Vec<Utxo> = read_json(path)?;
    Ok(UnspentOutputSet::from(utxos))
}

/// Generate a new wallet key file
pub fn cmd_keygen(out: &Path, label: Option<&str>) -> CliResult<()> {
    let wallet = match label {
        Some(label) => Wallet::with_label(label),
        None => Wallet::new(),
    };
    wallet.save(out)?;

    println!("✅ Wallet created!");
    println!("   🔑 Public key: {}", wallet.public_key());
    println!("   📁 Key file: {:?}", out);
    Ok(())
}

/// Write the canonical genesis block
pub fn cmd_genesis(out: &Path) -> CliResult<()> {
    let genesis = make_genesis_block();
    write_json(out, &genesis)?;

    println!("🧱 Genesis block written to {:?}", out);
    println!("   Hash: {}", genesis.hash);
    Ok(())
}

/// Build an unmined candidate on top of `prev`
pub fn cmd_create_block(
    config: &ChainConfig,
    prev: &Path,
    wallet: &Path,
    transactions: Option<&Path>,
    out: &Path,
) -> CliResult<()> {
    let last_block: Block = read_json(prev)?;
    let producer = Wallet::load(wallet)?;
    let transactions: Vec<Transaction> = match transactions {
        Some(path) => read_json(path)?,
        None => Vec::new(),
    };

    let block = create_block_with_reward(
        transactions,
        &last_block,
        producer.key_pair(),
        config.block_reward,
    );
    write_json(out, &block)?;

    println!("📦 Candidate block {} written to {:?}", block.index, out);
    println!("   ├─ Transactions: {}", block.tx_count());
    println!("   └─ Merkle root: {}", &block.merkle_root[..16]);
    Ok(())
}

/// Mine a block file in place
pub fn cmd_mine(config: &ChainConfig, block_path: &Path) -> CliResult<()> {
    let mut block: Block = read_json(block_path)?;
    let miner = Miner::new(config.difficulty_target, config.max_mining_attempts);

    println!(
        "⛏️  Mining block {} (target {:#010x})",
        block.index, config.difficulty_target
    );
    let stats = miner.mine(&mut block)?;
    write_json(block_path, &block)?;

    println!("\n   Block {} mined!", block.index);
    println!("   ├─ Hash: {}", &block.hash[..16]);
    println!("   ├─ Nonce: {}", block.nonce);
    println!("   ├─ Time: {}ms", stats.time_ms);
    println!("   ├─ Attempts: {}", stats.hash_attempts);
    println!("   └─ Hash rate: {:.2} H/s", stats.hash_rate);
    Ok(())
}

/// Validate `block` against `prev` and the unspent outputs file.
///
/// With `commit`, the updated unspent outputs are written back.
pub fn cmd_check_block(
    config: &ChainConfig,
    prev: &Path,
    block: &Path,
    utxos: &Path,
    commit: bool,
) -> CliResult<()> {
    let prev_block: Block = read_json(prev)?;
    let block: Block = read_json(block)?;
    let mut unspent = read_unspent(utxos)?;

    let validator = BlockValidator::new(config.clone());
    let summary =
        validator.check_block(&prev_block, &block, config.difficulty_target, &mut unspent)?;

    println!("✅ Block {} is valid", block.index);
    println!("   ├─ Outputs spent: {}", summary.spent);
    println!("   ├─ Outputs created: {}", summary.created);
    println!("   └─ Surplus: {}", summary.surplus);

    if commit {
        write_json(utxos, &Vec::<Utxo>::from(unspent))?;
        println!("   💾 Unspent outputs updated in {:?}", utxos);
    }
    Ok(())
}

/// Build a signed transfer from the wallet's unspent outputs
pub fn cmd_transfer(
    wallet: &Path,
    to: &str,
    amount: u64,
    utxos: &Path,
    out: &Path,
) -> CliResult<()> {
    let sender = Wallet::load(wallet)?;
    let unspent = read_unspent(utxos)?;

    let tx = sender.create_transaction(to, amount, &unspent)?;

    // Append so several transfers can go into one block
    let mut pending: Vec<Transaction> = if out.exists() {
        read_json(out)?
    } else {
        Vec::new()
    };
    pending.push(tx.clone());
    write_json(out, &pending)?;

    println!("💸 Transaction created!");
    println!("   ├─ ID: {}", tx.id);
    println!("   ├─ Inputs: {}", tx.inputs.len());
    println!("   ├─ Amount: {} to {}", amount, to);
    println!("   └─ Pending transactions: {}", pending.len());
    Ok(())
}
