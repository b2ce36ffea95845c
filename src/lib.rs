//! A minimal append-only ledger: hash-linked blocks of ECDSA-signed transactions,
//! sealed by a leading-zero proof of work.

pub mod blockchain;
pub mod config;

pub use blockchain::{
    create_transaction, verify_transaction, Block, Blockchain, BlockchainError,
    ChainValidationError, CryptoError, KeyError, KeyPair, MiningError, MiningLimits,
    SharedBlockchain, Transaction, TransactionError,
};
pub use config::{ConfigError, LedgerConfig};
