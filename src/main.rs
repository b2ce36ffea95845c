use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{info, warn};

use hashledger::{create_transaction, Blockchain, KeyPair, LedgerConfig};

/// Runs a two-party transfer through a fresh in-memory ledger
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Leading zero hex characters required of mined blocks; overrides --config
    #[arg(short, long, env = "LEDGER_DIFFICULTY")]
    difficulty: Option<usize>,

    /// TOML file with ledger settings, used when no difficulty is given
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn load_config(args: &Args) -> Result<LedgerConfig> {
    if let Some(difficulty) = args.difficulty {
        return LedgerConfig::with_difficulty(difficulty).context("invalid difficulty");
    }
    match &args.config {
        Some(path) => LedgerConfig::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => Ok(LedgerConfig::default()),
    }
}

fn print_chain(blockchain: &Blockchain) {
    println!("\n--- Blockchain ---");
    for block in blockchain.chain() {
        println!(
            "Index: {}, Timestamp: {}, Nonce: {}, Transactions: {}",
            block.index,
            block.timestamp,
            block.nonce,
            block.transactions.len()
        );
        println!("  Previous hash: {}", block.previous_hash);
        println!("  Hash:          {}", block.hash);
        for tx in &block.transactions {
            let sender = tx.sender.get(..8).unwrap_or(&tx.sender);
            println!("    {}... -> {}: {}", sender, tx.receiver, tx.amount);
        }
    }
}

fn main() -> Result<()> {
    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let args = Args::parse();
    let config = load_config(&args)?;
    info!("Starting ledger with difficulty {}", config.difficulty);

    let mut blockchain = Blockchain::with_config(config);

    let alice = KeyPair::generate();
    let bob = KeyPair::generate();
    info!("Alice: {}", alice.public_key_hex());
    info!("Bob:   {}", bob.public_key_hex());

    let to_bob = create_transaction(
        alice.secret_key(),
        alice.public_key(),
        bob.public_key_hex(),
        100,
    );
    let to_alice =
        create_transaction(bob.secret_key(), bob.public_key(), alice.public_key_hex(), 50);

    if !blockchain.add_transaction(to_bob.clone()) || !blockchain.add_transaction(to_alice) {
        bail!("a correctly signed transaction was rejected");
    }

    info!("Mining block...");
    match blockchain.mine_pending_transactions() {
        Some(index) => info!("Block {} mined", index),
        None => warn!("Nothing was mined"),
    }

    let mut tampered = to_bob;
    tampered.amount = 99999;
    if blockchain.add_transaction(tampered) {
        bail!("a tampered transaction was accepted");
    }
    info!("Tampered transaction rejected");

    print_chain(&blockchain);
    println!("\nBlockchain valid: {}", blockchain.is_chain_valid());

    Ok(())
}
