// Blockchain module
//
// This module contains the ledger core:
// - Canonical encoding shared by hashing and signing
// - Signature verification and primitive types
// - Transaction structure and transaction pool
// - Block structure
// - Proof of work algorithm
// - Blockchain structure
//
// The wallet is the key-holding collaborator and sits beside the core.

pub mod block;
pub mod chain;
pub mod crypto;
pub mod encoding;
pub mod pool;
pub mod pow;
pub mod transaction;
pub mod wallet;

// Re-export main components for easier access
pub use block::Block;
pub use chain::{Blockchain, BlockchainError};
pub use crypto::{Address, BlockHash, Signature};
pub use pow::{CancellationToken, ProofOfWork};
pub use transaction::Transaction;
pub use wallet::Wallet;

/// Reserved sender identifying system-issued mining rewards
pub const MINING_SENDER: &str = "THE BLOCKCHAIN";

/// Amount credited to the miner for every mined block
pub const MINING_REWARD: f64 = 1.0;

/// Number of leading zero hex digits a block hash needs
pub const MINING_DIFFICULTY: usize = 3;
