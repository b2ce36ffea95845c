use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{info, warn};
use thiserror::Error;

use super::block::Block;
use super::pow::{self, meets_difficulty, MiningError, MiningLimits};
use super::transaction::{short, Transaction};
use crate::config::LedgerConfig;

/// Errors that can occur while sealing and appending a block
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BlockchainError {
    #[error("Mining error: {0}")]
    Mining(#[from] MiningError),

    #[error("Stale candidate: built on {found}, chain tip is {expected}")]
    StaleCandidate { expected: String, found: String },

    #[error("Invalid block: {0}")]
    InvalidBlock(String),

    #[error("Block transactions are not the head of the pending pool")]
    PoolMismatch,
}

/// First structural violation found by [`Blockchain::validate_chain`]
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChainValidationError {
    #[error("Block 0 is not a genesis block")]
    InvalidGenesis,

    #[error("Block {index}: stored hash does not match contents")]
    HashMismatch { index: usize },

    #[error("Block {index}: previous hash does not match predecessor")]
    BrokenLink { index: usize },

    #[error("Block {index}: index does not follow predecessor")]
    IndexGap { index: usize },

    #[error("Block {index}: hash does not meet difficulty")]
    InsufficientWork { index: usize },
}

/// Represents the blockchain: the sealed blocks plus the pending pool
#[derive(Debug, Clone)]
pub struct Blockchain {
    /// The chain of blocks, never empty
    chain: Vec<Block>,

    /// Verified transactions waiting to be included in the next block
    pending_transactions: Vec<Transaction>,

    /// Mining difficulty (number of leading zeros required in hash)
    difficulty: usize,
}

impl Default for Blockchain {
    fn default() -> Self {
        Self::new()
    }
}

impl Blockchain {
    /// Creates a new blockchain with a genesis block and the default difficulty
    pub fn new() -> Self {
        Self::with_config(LedgerConfig::default())
    }

    /// Creates a new blockchain with a genesis block
    ///
    /// # Arguments
    ///
    /// * `config` - Ledger settings, currently the mining difficulty
    ///
    /// # Returns
    ///
    /// A new Blockchain instance with a chain of length 1
    pub fn with_config(config: LedgerConfig) -> Self {
        let mut blockchain = Blockchain {
            chain: Vec::new(),
            pending_transactions: Vec::new(),
            difficulty: config.difficulty,
        };

        blockchain.create_genesis_block();

        blockchain
    }

    /// Creates the genesis block (first block in the chain)
    fn create_genesis_block(&mut self) {
        let genesis_block = Block::genesis();
        info!("Created genesis block {}", short(&genesis_block.hash));
        self.chain.push(genesis_block);
    }

    pub fn last_block(&self) -> &Block {
        // Genesis is pushed on construction and blocks are never removed
        &self.chain[self.chain.len() - 1]
    }

    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    pub fn pending_transactions(&self) -> &[Transaction] {
        &self.pending_transactions
    }

    pub fn difficulty(&self) -> usize {
        self.difficulty
    }

    /// Number of blocks in the chain, genesis included
    pub fn len(&self) -> usize {
        self.chain.len()
    }

    /// Always false: the genesis block is present from construction
    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// Adds a transaction to the pending pool if its signature verifies
    ///
    /// # Returns
    ///
    /// true if the transaction was accepted, false if it was rejected (pool unchanged)
    pub fn add_transaction(&mut self, transaction: Transaction) -> bool {
        if let Err(err) = transaction.verify() {
            warn!(
                "Rejected transaction from {} to {}: {}",
                short(&transaction.sender),
                transaction.receiver,
                err
            );
            return false;
        }

        self.pending_transactions.push(transaction);
        true
    }

    /// Mines a new block with the pending transactions
    ///
    /// # Returns
    ///
    /// The index of the new block, or `None` if there was nothing to mine
    pub fn mine_pending_transactions(&mut self) -> Option<u64> {
        let mut block = self.prepare_candidate()?;
        block.hash = pow::mine(&mut block, self.difficulty);

        // The candidate was built from the current tip and pool under `&mut self`
        let index = self
            .commit_block(block)
            .expect("freshly mined candidate extends the current tip");
        Some(index)
    }

    /// Mines a new block like [`Blockchain::mine_pending_transactions`] within the given limits
    ///
    /// If the search stops early, the chain and the pending pool are left untouched.
    pub fn mine_pending_transactions_with(
        &mut self,
        limits: &MiningLimits,
    ) -> Result<Option<u64>, BlockchainError> {
        let mut block = match self.prepare_candidate() {
            Some(block) => block,
            None => return Ok(None),
        };

        block.hash = pow::mine_with(&mut block, self.difficulty, limits)?;
        self.commit_block(block).map(Some)
    }

    /// Builds an unsealed block from a snapshot of the pending pool
    ///
    /// # Returns
    ///
    /// The next block with nonce 0, or `None` if the pool is empty
    pub fn prepare_candidate(&self) -> Option<Block> {
        if self.pending_transactions.is_empty() {
            info!("No pending transactions, nothing to mine");
            return None;
        }

        let last_block = self.last_block();
        Some(Block::new(
            last_block.index + 1,
            self.pending_transactions.clone(),
            last_block.hash.clone(),
        ))
    }

    /// Appends a sealed block and removes its transactions from the pending pool
    ///
    /// The block's transactions must be the first entries of the pool. Transactions added
    /// after the candidate was prepared stay pending.
    ///
    /// # Returns
    ///
    /// The index of the appended block
    pub fn commit_block(&mut self, block: Block) -> Result<u64, BlockchainError> {
        let last_block = self.last_block();

        if block.previous_hash != last_block.hash {
            return Err(BlockchainError::StaleCandidate {
                expected: last_block.hash.clone(),
                found: block.previous_hash,
            });
        }
        if block.index != last_block.index + 1 {
            return Err(BlockchainError::InvalidBlock(format!(
                "expected index {}, got {}",
                last_block.index + 1,
                block.index
            )));
        }
        if block.transactions.is_empty() {
            return Err(BlockchainError::InvalidBlock(
                "only the genesis block may be empty".to_string(),
            ));
        }
        if !block.has_valid_hash() {
            return Err(BlockchainError::InvalidBlock(
                "hash does not match contents".to_string(),
            ));
        }
        if !meets_difficulty(&block.hash, self.difficulty) {
            return Err(BlockchainError::InvalidBlock(format!(
                "hash does not meet difficulty {}",
                self.difficulty
            )));
        }
        if !self.pending_transactions.starts_with(&block.transactions) {
            return Err(BlockchainError::PoolMismatch);
        }

        let included = block.transactions.len();
        let index = block.index;
        info!(
            "Mined block {} with {} transactions (nonce {}, hash {})",
            index,
            included,
            block.nonce,
            short(&block.hash)
        );

        self.chain.push(block);
        self.pending_transactions.drain(..included);

        Ok(index)
    }

    /// Validates the blockchain
    ///
    /// Requires block 0 to be a genesis block, which is exempt from the remaining checks.
    /// Recomputes every later block's hash and checks it against the stored hash,
    /// the predecessor link, the index sequence and the difficulty. Transaction
    /// signatures are not re-checked.
    ///
    /// # Returns
    ///
    /// The first violation found, if any
    pub fn validate_chain(&self) -> Result<(), ChainValidationError> {
        if !self.chain.first().is_some_and(Block::is_genesis) {
            return Err(ChainValidationError::InvalidGenesis);
        }

        for (i, pair) in self.chain.windows(2).enumerate() {
            let (previous_block, current_block) = (&pair[0], &pair[1]);
            let index = i + 1;

            if !current_block.has_valid_hash() {
                return Err(ChainValidationError::HashMismatch { index });
            }
            if current_block.previous_hash != previous_block.hash {
                return Err(ChainValidationError::BrokenLink { index });
            }
            if current_block.index != previous_block.index + 1 {
                return Err(ChainValidationError::IndexGap { index });
            }
            if !meets_difficulty(&current_block.hash, self.difficulty) {
                return Err(ChainValidationError::InsufficientWork { index });
            }
        }

        Ok(())
    }

    /// true if the blockchain is valid, false otherwise
    pub fn is_chain_valid(&self) -> bool {
        match self.validate_chain() {
            Ok(()) => true,
            Err(err) => {
                warn!("Chain validation failed: {}", err);
                false
            }
        }
    }
}

/// A blockchain shared between threads
///
/// Pool and chain updates happen under one lock. Mining takes a snapshot under the
/// lock, searches for a nonce without holding it, and commits under the lock again,
/// so transactions submitted during the search remain pending.
#[derive(Debug, Clone)]
pub struct SharedBlockchain {
    inner: Arc<Mutex<Blockchain>>,
}

impl SharedBlockchain {
    pub fn new(blockchain: Blockchain) -> Self {
        SharedBlockchain {
            inner: Arc::new(Mutex::new(blockchain)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Blockchain> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_transaction(&self, transaction: Transaction) -> bool {
        self.lock().add_transaction(transaction)
    }

    pub fn mine_pending_transactions(&self) -> Result<Option<u64>, BlockchainError> {
        self.mine_pending_transactions_with(&MiningLimits::unbounded())
    }

    pub fn mine_pending_transactions_with(
        &self,
        limits: &MiningLimits,
    ) -> Result<Option<u64>, BlockchainError> {
        let (candidate, difficulty) = {
            let blockchain = self.lock();
            (blockchain.prepare_candidate(), blockchain.difficulty())
        };

        let mut block = match candidate {
            Some(block) => block,
            None => return Ok(None),
        };

        block.hash = pow::mine_with(&mut block, difficulty, limits)?;
        self.lock().commit_block(block).map(Some)
    }

    pub fn is_chain_valid(&self) -> bool {
        self.lock().is_chain_valid()
    }

    /// Gets a copy of the entire blockchain
    pub fn get_chain(&self) -> Vec<Block> {
        self.lock().chain().to_vec()
    }

    /// Gets a copy of all pending transactions
    pub fn get_pending_transactions(&self) -> Vec<Transaction> {
        self.lock().pending_transactions().to_vec()
    }
}
