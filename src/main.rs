//! Mini-Ledger CLI Application
//!
//! A command-line interface for producing and validating blocks.

use clap::{Parser, Subcommand};
use mini_ledger::cli;
use mini_ledger::config::ChainConfig;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ledger")]
#[command(author = "Darshan")]
#[command(version = "0.1.0")]
#[command(about = "A proof-of-work ledger validation engine in Rust", long_about = None)]
struct Cli {
    /// Chain configuration file (JSON); defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new wallet key file
    Keygen {
        /// Output key file
        #[arg(short, long)]
        out: PathBuf,

        /// Optional label for the wallet
        #[arg(short, long)]
        label: Option<String>,
    },

    /// Write the genesis block
    Genesis {
        /// Output block file
        #[arg(short, long)]
        out: PathBuf,
    },

    /// Build an unmined candidate block
    CreateBlock {
        /// Previous block file
        #[arg(short, long)]
        prev: PathBuf,

        /// Producer's wallet key file
        #[arg(short, long)]
        wallet: PathBuf,

        /// Transactions to include (JSON list)
        #[arg(short, long)]
        transactions: Option<PathBuf>,

        /// Output block file
        #[arg(short, long)]
        out: PathBuf,
    },

    /// Mine a block file in place
    Mine {
        /// Block file
        #[arg(short, long)]
        block: PathBuf,
    },

    /// Validate a block against its predecessor
    CheckBlock {
        /// Previous block file
        #[arg(short, long)]
        prev: PathBuf,

        /// Block file to check
        #[arg(short, long)]
        block: PathBuf,

        /// Unspent outputs file
        #[arg(short, long, default_value = "utxos.json")]
        utxos: PathBuf,

        /// Write the updated unspent outputs on success
        #[arg(long)]
        commit: bool,
    },

    /// Create a signed transfer
    Transfer {
        /// Sender's wallet key file
        #[arg(short, long)]
        wallet: PathBuf,

        /// Recipient's public key
        #[arg(short, long)]
        to: String,

        /// Amount to send
        #[arg(short, long)]
        amount: u64,

        /// Unspent outputs file
        #[arg(short, long, default_value = "utxos.json")]
        utxos: PathBuf,

        /// Pending transactions file to append to
        #[arg(short, long, default_value = "pending.json")]
        out: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ChainConfig::load(path)?,
        None => ChainConfig::default(),
    };

    match cli.command {
        Commands::Keygen { out, label } => cli::cmd_keygen(&out, label.as_deref())?,
        Commands::Genesis { out } => cli::cmd_genesis(&out)?,
        Commands::CreateBlock {
            prev,
            wallet,
            transactions,
            out,
        } => cli::cmd_create_block(&config, &prev, &wallet, transactions.as_deref(), &out)?,
        Commands::Mine { block } => cli::cmd_mine(&config, &block)?,
        Commands::CheckBlock {
            prev,
            block,
            utxos,
            commit,
        } => cli::cmd_check_block(&config, &prev, &block, &utxos, commit)?,
        Commands::Transfer {
            wallet,
            to,
            amount,
            utxos,
            out,
        } => cli::cmd_transfer(&wallet, &to, amount, &utxos, &out)?,
    }

    Ok(())
}
