//! CLI commands module.

use anyhow::Result;
use authledger_core::Block;
use clap::Subcommand;
use colored::Colorize;

mod chain;
mod poa;
mod proof;

#[derive(Subcommand)]
pub enum Commands {
    /// Build a chain from transfers and validate it
    Chain(chain::ChainArgs),
    /// Sign and verify a block with a set of authorities
    Poa(poa::PoaArgs),
    /// Build a Merkle tree and prove one leaf
    Proof(proof::ProofArgs),
}

pub fn run(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Chain(args) => chain::run(args),
        Commands::Poa(args) => poa::run(args),
        Commands::Proof(args) => proof::run(args),
    }
}

/// Print one block and its transactions.
pub(crate) fn print_block(index: usize, block: &Block) -> Result<()> {
    println!(
        "{} {} {}",
        "=".repeat(20).bright_black(),
        format!("Block {}", index).bold().cyan(),
        "=".repeat(20).bright_black()
    );
    println!("  Hash:          {}", block.hash()?.to_hex().bright_yellow());
    println!("  Previous Hash: {}", block.prev_hash.to_hex().bright_black());
    println!("  Merkle Root:   {}", block.merkle_root.to_hex().bright_black());
    println!("  Timestamp:     {}", block.timestamp.to_string().bright_black());
    match &block.signature {
        Some(sig) => println!("  Signature:     {}", sig.green()),
        None => println!("  Signature:     {}", "(unsigned)".bright_black()),
    }

    for (i, tx) in block.transactions.iter().enumerate() {
        println!(
            "  {} {} -> {}  {}",
            format!("{}.", i + 1).bright_black(),
            tx.sender,
            tx.recipient,
            format!("{:.1}", tx.value).bright_cyan()
        );
    }
    println!();
    Ok(())
}
