//! Proof of Authority signing command.

use super::print_block;
use anyhow::Result;
use authledger_chain::{Chain, ChainConfig};
use authledger_consensus::{AuthorityRegistry, PoaConfig, SignatureScope};
use clap::Args;
use colored::Colorize;

#[derive(Args)]
pub struct PoaArgs {
    /// Authority addresses, in registration order
    #[arg(short, long, value_delimiter = ',', default_value = "authority1,authority2,authority3")]
    authorities: Vec<String>,

    /// Address that signs the new block
    #[arg(short, long, default_value = "authority1")]
    signer: String,

    /// Addresses to verify the signature against (defaults to the signer)
    #[arg(short, long, value_delimiter = ',')]
    verify: Vec<String>,

    /// Revoke these addresses after signing, before verifying
    #[arg(short, long, value_delimiter = ',')]
    revoke: Vec<String>,

    /// Bind the Merkle root into the signature as well
    #[arg(long)]
    sign_merkle_root: bool,
}

pub fn run(args: PoaArgs) -> Result<()> {
    let config = PoaConfig {
        signature_scope: if args.sign_merkle_root {
            SignatureScope::HeaderAndMerkleRoot
        } else {
            SignatureScope::Header
        },
    };
    let mut registry = AuthorityRegistry::with_authorities(args.authorities.iter().cloned(), config);

    let mut chain = Chain::new(ChainConfig::default())?;
    chain.add_transaction("A", "B", 1.0);
    chain.create_block()?;

    match registry.sign_block(&args.signer, chain.last_block_mut()) {
        Ok(()) => println!("{}  Block signed by {}", "✓".green().bold(), args.signer.bright_yellow()),
        Err(e) => println!("{}  {}", "✗".red().bold(), e.to_string().red()),
    }

    for address in &args.revoke {
        match registry.revoke_authority(address) {
            Some(id) => println!("  Revoked {} (entry {})", address.bright_yellow(), id.0),
            None => println!("  {} is unknown or already revoked", address.bright_black()),
        }
    }
    println!();

    print_block(chain.len() - 1, chain.last_block())?;

    let verifiers = if args.verify.is_empty() {
        vec![args.signer.clone()]
    } else {
        args.verify
    };
    for address in &verifiers {
        if registry.verify_block(chain.last_block(), address) {
            println!("{}  Verified against {}", "✓".green().bold(), address.bright_yellow());
        } else {
            println!("{}  Verification failed for {}", "✗".red().bold(), address.bright_yellow());
        }
    }
    Ok(())
}
