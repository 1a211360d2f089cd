//! Merkle proof inspection command.

use anyhow::{bail, Result};
use authledger_core::{MerkleTree, Side, Transaction};
use clap::Args;
use colored::Colorize;

#[derive(Args)]
pub struct ProofArgs {
    /// Number of synthetic transactions in the batch
    #[arg(short, long, default_value = "5")]
    count: usize,

    /// Index of the transaction to prove
    #[arg(short, long, default_value = "0")]
    index: usize,
}

pub fn run(args: ProofArgs) -> Result<()> {
    if args.index >= args.count {
        bail!("index {} is outside a batch of {}", args.index, args.count);
    }

    let leaves = (0..args.count)
        .map(|i| Transaction::new(format!("sender{i}"), format!("recipient{i}"), i as f64).hash())
        .collect::<authledger_core::Result<Vec<_>>>()?;
    let tree = MerkleTree::build(&leaves);
    let leaf = leaves[args.index];
    let proof = tree.generate_proof(&leaf)?;

    println!("{}", "Merkle Proof:".bold().cyan());
    println!();
    println!("  Leaves: {}", tree.leaf_count().to_string().bright_cyan());
    println!("  Nodes:  {}", tree.node_count().to_string().bright_cyan());
    println!("  Root:   {}", tree.root().to_hex().bright_yellow());
    println!("  Leaf:   {}", leaf.to_hex().bright_yellow());
    println!();

    for (level, step) in proof.steps.iter().enumerate() {
        let side = match step.side {
            Side::Left => "left ",
            Side::Right => "right",
        };
        println!(
            "  {} {} {}",
            format!("level {}", level).bright_black(),
            side.bright_cyan(),
            step.sibling.to_hex()
        );
    }
    println!();

    if proof.verify(&tree.root()) {
        println!("{}  Proof verifies against the root", "✓".green().bold());
    } else {
        println!("{}  Proof does not verify", "✗".red().bold());
    }
    Ok(())
}
