// Blockchain module
//
// This module contains the ledger implementation including:
// - Block structure and hashing
// - Blockchain structure and pending pool
// - Signed transactions
// - Cryptography utilities
// - Proof of work algorithm

pub mod block;
pub mod chain;
pub mod crypto;
pub mod pow;
pub mod transaction;

// Re-export main components for easier access
pub use block::Block;
pub use chain::{Blockchain, BlockchainError, ChainValidationError, SharedBlockchain};
pub use crypto::{CryptoError, KeyError, KeyPair};
pub use pow::{MiningError, MiningLimits};
pub use transaction::{create_transaction, verify_transaction, Transaction, TransactionError};
