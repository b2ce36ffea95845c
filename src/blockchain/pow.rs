//! Proof of work: brute-force nonce search over a block's hash.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::debug;
use thiserror::Error;

use super::block::Block;

/// Attempts between checks of the cancellation flag and progress log lines
const CHECK_INTERVAL: u64 = 100_000;

/// Errors that end a bounded search early
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MiningError {
    #[error("Mining cancelled after {attempts} attempts")]
    Cancelled { attempts: u64 },

    #[error("No valid nonce found within {attempts} attempts")]
    AttemptLimitReached { attempts: u64 },
}

/// Optional bounds on a proof of work search
///
/// The default has neither a cap nor a cancellation flag and searches until it succeeds.
#[derive(Debug, Clone, Default)]
pub struct MiningLimits {
    /// Maximum number of hashes to try
    pub max_attempts: Option<u64>,

    /// Set to true from another thread to stop the search
    pub cancel: Option<Arc<AtomicBool>>,
}

impl MiningLimits {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn with_max_attempts(mut self, max_attempts: u64) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    pub fn with_cancel(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .map(|flag| flag.load(Ordering::Relaxed))
            .unwrap_or(false)
    }
}

/// Checks whether a hex digest starts with `difficulty` zero characters
pub fn meets_difficulty(hash: &str, difficulty: usize) -> bool {
    hash.len() >= difficulty && hash.bytes().take(difficulty).all(|b| b == b'0')
}

/// Searches for a nonce whose hash meets the difficulty, with no upper bound
///
/// # Arguments
///
/// * `block` - The block to seal; its nonce is left at the winning value
/// * `difficulty` - Number of leading zero hex characters required
///
/// # Returns
///
/// The winning hash. The caller assigns it to `block.hash`.
pub fn mine(block: &mut Block, difficulty: usize) -> String {
    let mut attempts: u64 = 0;
    block.nonce = 0;

    loop {
        let hash = block.calculate_hash();
        attempts += 1;

        if meets_difficulty(&hash, difficulty) {
            debug!(
                "Found nonce {} for block {} after {} attempts",
                block.nonce, block.index, attempts
            );
            return hash;
        }

        if attempts % CHECK_INTERVAL == 0 {
            debug!("Block {}: {} attempts so far", block.index, attempts);
        }

        block.nonce += 1;
    }
}

/// Searches for a nonce like [`mine`], stopping early if the limits say so
///
/// # Returns
///
/// The winning hash, or the reason the search stopped. On error the block's nonce
/// is left at the last value tried.
pub fn mine_with(
    block: &mut Block,
    difficulty: usize,
    limits: &MiningLimits,
) -> Result<String, MiningError> {
    let mut attempts: u64 = 0;
    block.nonce = 0;

    loop {
        if limits.max_attempts.is_some_and(|max| attempts >= max) {
            return Err(MiningError::AttemptLimitReached { attempts });
        }

        if attempts % CHECK_INTERVAL == 0 && limits.is_cancelled() {
            return Err(MiningError::Cancelled { attempts });
        }

        if attempts > 0 {
            block.nonce += 1;
        }

        let hash = block.calculate_hash();
        attempts += 1;

        if meets_difficulty(&hash, difficulty) {
            debug!(
                "Found nonce {} for block {} after {} attempts",
                block.nonce, block.index, attempts
            );
            return Ok(hash);
        }
    }
}
