//! CLI module for the ledger

pub mod commands;

pub use commands::*;
