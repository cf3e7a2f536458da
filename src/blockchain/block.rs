use chrono::Utc;
use serde::{Serialize, Serializer};

use super::crypto::BlockHash;
use super::encoding::{canonical_bytes, sha256, EncodingError};
use super::transaction::Transaction;

/// Represents a block in the blockchain
///
/// Immutable after creation. The hash commits to every field, including the
/// nonce that satisfied proof of work and the timestamp.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Block {
    /// Creation time in nanoseconds since the Unix epoch
    timestamp: i64,

    /// Proof of work nonce
    nonce: u64,

    /// Hash of the previous block
    #[serde(serialize_with = "serialize_hash_hex")]
    previous_hash: BlockHash,

    /// Transactions in submission order
    transactions: Vec<Transaction>,
}

/// Hash input layout; field names and order are part of the block hash
#[derive(Serialize)]
struct CanonicalBlock<'a> {
    nonce: u64,
    previous_hash: &'a BlockHash,
    timestamp: i64,
    transaction: &'a [Transaction],
}

fn serialize_hash_hex<S: Serializer>(hash: &BlockHash, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&hash.to_hex())
}

/// Current time in nanoseconds since the Unix epoch
pub fn now_nanos() -> i64 {
    let now = Utc::now();
    now.timestamp_nanos_opt()
        .unwrap_or_else(|| now.timestamp_micros().saturating_mul(1_000))
}

impl Block {
    /// Creates a new block stamped with the current time
    ///
    /// # Arguments
    ///
    /// * `nonce` - The proof of work nonce
    /// * `previous_hash` - The hash of the previous block
    /// * `transactions` - The transactions to include in the block
    pub fn new(nonce: u64, previous_hash: BlockHash, transactions: Vec<Transaction>) -> Self {
        Self::with_timestamp(now_nanos(), nonce, previous_hash, transactions)
    }

    /// Creates a block with a fixed timestamp
    pub fn with_timestamp(
        timestamp: i64,
        nonce: u64,
        previous_hash: BlockHash,
        transactions: Vec<Transaction>,
    ) -> Self {
        Block {
            timestamp,
            nonce,
            previous_hash,
            transactions,
        }
    }

    /// The zero-valued block whose hash links the genesis block
    pub fn zero() -> Self {
        Self::with_timestamp(0, 0, BlockHash::default(), Vec::new())
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn previous_hash(&self) -> &BlockHash {
        &self.previous_hash
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Calculates the hash of the block
    ///
    /// # Returns
    ///
    /// The SHA-256 digest of the block's canonical encoding
    pub fn hash(&self) -> Result<BlockHash, EncodingError> {
        Self::hash_parts(self.timestamp, self.nonce, &self.previous_hash, &self.transactions)
    }

    /// Hashes a candidate block from its parts without building it
    pub fn hash_parts(
        timestamp: i64,
        nonce: u64,
        previous_hash: &BlockHash,
        transactions: &[Transaction],
    ) -> Result<BlockHash, EncodingError> {
        let bytes = canonical_bytes(&CanonicalBlock {
            nonce,
            previous_hash,
            timestamp,
            transaction: transactions,
        })?;

        Ok(BlockHash(sha256(&bytes)))
    }
}
