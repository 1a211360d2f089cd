//! Chain building command.

use super::print_block;
use anyhow::{bail, Context, Result};
use authledger_chain::{Chain, ChainConfig, ChainError};
use clap::Args;
use colored::Colorize;
use std::num::NonZeroUsize;

#[derive(Args)]
pub struct ChainArgs {
    /// One block's transfers as `sender:recipient:value`, comma separated.
    /// Repeat for more blocks.
    #[arg(short, long, default_values = ["A:B:1.0,C:D:2.0", "C:D:2.0"])]
    batch: Vec<String>,

    /// Cap on transactions per block (at least 1). Transfers over the cap
    /// stay pending and show up in the statistics.
    #[arg(long)]
    max_block_transactions: Option<NonZeroUsize>,

    /// Alter the first transfer of block 1 after the fact, then validate
    #[arg(long)]
    tamper: bool,
}

fn parse_transfer(s: &str) -> Result<(String, String, f64)> {
    let parts: Vec<&str> = s.trim().split(':').collect();
    let [sender, recipient, value] = parts.as_slice() else {
        bail!("expected sender:recipient:value, got {:?}", s);
    };
    let value = value
        .parse::<f64>()
        .with_context(|| format!("invalid value in {:?}", s))?;
    Ok((sender.to_string(), recipient.to_string(), value))
}

pub fn run(args: ChainArgs) -> Result<()> {
    let mut chain = Chain::new(ChainConfig {
        max_block_transactions: args.max_block_transactions,
    })?;

    for batch in &args.batch {
        for transfer in batch.split(',').filter(|t| !t.trim().is_empty()) {
            let (sender, recipient, value) = parse_transfer(transfer)?;
            chain.add_transaction(sender, recipient, value);
        }
        chain.create_block()?;
    }

    if args.tamper {
        let block = chain
            .block_mut(1)
            .context("tampering needs at least one block after genesis")?;
        let tx = block
            .transactions
            .first_mut()
            .context("block 1 has no transactions to alter")?;
        tx.value += 100.0;
    }

    for (i, block) in chain.blocks().iter().enumerate() {
        print_block(i, block)?;
    }

    let stats = chain.stats()?;
    println!("{}", "Chain Statistics:".bold().cyan());
    println!();
    println!("  Height:         {}", stats.height.to_string().bright_cyan());
    println!("  Latest Hash:    {}", stats.latest_block_hash.to_hex().bright_yellow());
    println!("  Pending:        {}", stats.pool.total_transactions);
    println!("  Unique Senders: {}", stats.pool.unique_senders);
    println!("  Pending Value:  {}", stats.pool.total_value);
    println!();

    match chain.validate() {
        Ok(()) => println!("{}  Chain is intact", "✓".green().bold()),
        Err(ChainError::IntegrityViolation(violations)) => {
            println!("{}  Chain integrity violated:", "✗".red().bold());
            for violation in &violations {
                println!("    {}", violation.to_string().red());
            }
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: ChainArgs,
    }

    #[test]
    fn test_parse_transfer() {
        let (s, r, v) = parse_transfer(" A:B:1.5").unwrap();
        assert_eq!((s.as_str(), r.as_str(), v), ("A", "B", 1.5));
        assert!(parse_transfer("A:B").is_err());
        assert!(parse_transfer("A:B:x").is_err());
    }

    #[test]
    fn test_zero_block_cap_rejected() {
        assert!(TestCli::try_parse_from(["chain", "--max-block-transactions", "0"]).is_err());

        let cli = TestCli::try_parse_from(["chain", "--max-block-transactions", "1"]).unwrap();
        assert_eq!(cli.args.max_block_transactions, NonZeroUsize::new(1));
    }

    #[test]
    fn test_run_with_smallest_cap() {
        let cli = TestCli::try_parse_from([
            "chain",
            "--max-block-transactions",
            "1",
            "--batch",
            "A:B:1.0,C:D:2.0,E:F:3.0",
        ])
        .unwrap();
        assert!(run(cli.args).is_ok());
    }
}
