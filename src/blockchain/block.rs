use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::crypto::sha256_hex;
use super::transaction::Transaction;

/// Previous hash recorded by the genesis block
pub const GENESIS_PREVIOUS_HASH: &str = "0";

/// Represents a block in the blockchain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Index of the block in the chain
    pub index: u64,

    /// Timestamp when the block was created
    pub timestamp: DateTime<Utc>,

    /// List of transactions included in this block, in submission order
    pub transactions: Vec<Transaction>,

    /// Hash of the previous block
    pub previous_hash: String,

    /// Proof of work nonce
    pub nonce: u64,

    /// Hash of the current block
    pub hash: String,
}

impl Block {
    /// Creates a new block
    ///
    /// # Arguments
    ///
    /// * `index` - The index of the block in the chain
    /// * `transactions` - The list of transactions to include in the block
    /// * `previous_hash` - The hash of the previous block
    ///
    /// # Returns
    ///
    /// A new Block instance with nonce 0 and its hash already computed
    pub fn new(index: u64, transactions: Vec<Transaction>, previous_hash: String) -> Self {
        let block = Block {
            index,
            timestamp: Utc::now(),
            transactions,
            previous_hash,
            nonce: 0,
            hash: String::new(),
        };

        let hash = block.calculate_hash();

        Block { hash, ..block }
    }

    /// Creates the predecessor-less first block
    pub fn genesis() -> Self {
        Block::new(0, Vec::new(), GENESIS_PREVIOUS_HASH.to_string())
    }

    pub fn is_genesis(&self) -> bool {
        self.index == 0 && self.previous_hash == GENESIS_PREVIOUS_HASH
    }

    /// Calculates the hash of the block from its current fields
    ///
    /// Does not update `hash`; callers that change a field assign the result back.
    ///
    /// # Returns
    ///
    /// The SHA-256 hash of the block as a hexadecimal string
    pub fn calculate_hash(&self) -> String {
        let preimage = format!(
            "{}{}{}{}{}",
            self.index,
            self.timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true),
            canonical_transactions(&self.transactions),
            self.previous_hash,
            self.nonce,
        );

        sha256_hex(preimage.as_bytes())
    }

    /// True if the stored hash matches the block's contents
    pub fn has_valid_hash(&self) -> bool {
        self.hash == self.calculate_hash()
    }
}

/// Serializes a transaction batch with sorted object keys
fn canonical_transactions(transactions: &[Transaction]) -> String {
    // Value maps are ordered by key, so field declaration order does not leak into the hash
    serde_json::to_value(transactions)
        .expect("transactions have only string and integer fields")
        .to_string()
}
