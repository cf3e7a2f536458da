use log::debug;
use thiserror::Error;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::block::Block;
use super::crypto::BlockHash;
use super::encoding::EncodingError;
use super::transaction::Transaction;

/// Length of a block hash rendered as hex
const HASH_HEX_LEN: usize = 64;

/// Errors that can occur while searching for a nonce
#[derive(Debug, Error)]
pub enum MiningError {
    #[error("Mining cancelled after {attempts} attempts")]
    Cancelled { attempts: u64 },

    #[error("No valid nonce found within {attempts} attempts")]
    TimedOut { attempts: u64 },

    #[error("Difficulty {0} exceeds the hash length")]
    UnreachableDifficulty(usize),

    #[error("Encoding error: {0}")]
    Encoding(#[from] EncodingError),
}

/// Shared flag used to stop a running nonce search
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        CancellationToken(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Checks if a hash starts with `difficulty` zero hex digits
pub fn meets_difficulty(hash: &BlockHash, difficulty: usize) -> bool {
    if difficulty > HASH_HEX_LEN {
        return false;
    }
    let target = "0".repeat(difficulty);
    hash.to_hex().starts_with(&target)
}

/// Checks if a nonce solves the puzzle for the given candidate block
///
/// Deterministic: the same inputs always give the same answer.
pub fn valid_proof(
    nonce: u64,
    previous_hash: &BlockHash,
    transactions: &[Transaction],
    timestamp: i64,
    difficulty: usize,
) -> Result<bool, EncodingError> {
    let guess = Block::hash_parts(timestamp, nonce, previous_hash, transactions)?;
    Ok(meets_difficulty(&guess, difficulty))
}

/// Brute-force nonce search over a fixed difficulty
///
/// Without an attempt cap and without cancellation the search only ends when a
/// nonce is found. Each extra hex digit of difficulty multiplies the expected
/// work by 16.
#[derive(Debug, Clone)]
pub struct ProofOfWork {
    difficulty: usize,
    max_attempts: Option<u64>,
}

impl ProofOfWork {
    pub fn new(difficulty: usize) -> Self {
        ProofOfWork {
            difficulty,
            max_attempts: None,
        }
    }

    /// Gives up with `MiningError::TimedOut` after `max_attempts` nonces
    pub fn with_max_attempts(mut self, max_attempts: Option<u64>) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn difficulty(&self) -> usize {
        self.difficulty
    }

    /// Searches for a nonce starting at zero
    ///
    /// # Arguments
    ///
    /// * `transactions` - The transactions of the candidate block
    /// * `previous_hash` - The hash of the block the candidate extends
    /// * `timestamp` - The timestamp the candidate block will carry
    /// * `cancel` - Checked before every attempt
    ///
    /// # Returns
    ///
    /// The first nonce that satisfies the difficulty
    pub fn search(
        &self,
        transactions: &[Transaction],
        previous_hash: &BlockHash,
        timestamp: i64,
        cancel: &CancellationToken,
    ) -> Result<u64, MiningError> {
        if self.difficulty > HASH_HEX_LEN {
            return Err(MiningError::UnreachableDifficulty(self.difficulty));
        }

        let mut nonce: u64 = 0;
        loop {
            if cancel.is_cancelled() {
                return Err(MiningError::Cancelled { attempts: nonce });
            }
            if let Some(max) = self.max_attempts {
                if nonce >= max {
                    return Err(MiningError::TimedOut { attempts: nonce });
                }
            }

            if valid_proof(nonce, previous_hash, transactions, timestamp, self.difficulty)? {
                debug!("action=proof_of_work, status=found, nonce={}", nonce);
                return Ok(nonce);
            }

            nonce += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::crypto::Address;

    fn transactions() -> Vec<Transaction> {
        vec![Transaction::new(Address::from("A"), Address::from("B"), 1.0)]
    }

    #[test]
    fn test_meets_difficulty() {
        let mut bytes = [0xffu8; 32];
        bytes[0] = 0x00;
        bytes[1] = 0x0f;
        let hash = BlockHash::from(bytes);

        assert!(meets_difficulty(&hash, 0));
        assert!(meets_difficulty(&hash, 2));
        assert!(meets_difficulty(&hash, 3));
        assert!(!meets_difficulty(&hash, 4));
        assert!(meets_difficulty(&BlockHash::default(), 64));
        assert!(!meets_difficulty(&BlockHash::default(), 65));
    }

    #[test]
    fn test_valid_proof_is_deterministic() {
        let previous_hash = BlockHash::from([9u8; 32]);

        for nonce in 0..50 {
            let first = valid_proof(nonce, &previous_hash, &transactions(), 0, 1).unwrap();
            let second = valid_proof(nonce, &previous_hash, &transactions(), 0, 1).unwrap();
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_search_finds_first_valid_nonce() {
        let previous_hash = BlockHash::from([1u8; 32]);
        let pow = ProofOfWork::new(2);

        let nonce = pow
            .search(&transactions(), &previous_hash, 1234, &CancellationToken::new())
            .unwrap();

        assert!(valid_proof(nonce, &previous_hash, &transactions(), 1234, 2).unwrap());
        for earlier in 0..nonce {
            assert!(!valid_proof(earlier, &previous_hash, &transactions(), 1234, 2).unwrap());
        }

        let hash = Block::hash_parts(1234, nonce, &previous_hash, &transactions()).unwrap();
        assert!(hash.to_hex().starts_with("00"));
    }

    #[test]
    fn test_search_is_reproducible() {
        let previous_hash = BlockHash::from([4u8; 32]);
        let pow = ProofOfWork::new(2);
        let token = CancellationToken::new();

        let first = pow.search(&transactions(), &previous_hash, 0, &token).unwrap();
        let second = pow.search(&transactions(), &previous_hash, 0, &token).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_search_respects_cancellation() {
        let token = CancellationToken::new();
        token.cancel();

        let result = ProofOfWork::new(3).search(&transactions(), &BlockHash::default(), 0, &token);
        assert!(matches!(result, Err(MiningError::Cancelled { attempts: 0 })));
    }

    #[test]
    fn test_search_times_out() {
        let pow = ProofOfWork::new(64).with_max_attempts(Some(25));

        let result = pow.search(&transactions(), &BlockHash::default(), 0, &CancellationToken::new());
        assert!(matches!(result, Err(MiningError::TimedOut { attempts: 25 })));
    }

    #[test]
    fn test_search_rejects_unreachable_difficulty() {
        let result = ProofOfWork::new(65).search(
            &transactions(),
            &BlockHash::default(),
            0,
            &CancellationToken::new(),
        );
        assert!(matches!(result, Err(MiningError::UnreachableDifficulty(65))));
    }
}
