use ed25519_dalek::VerifyingKey;
use log::{debug, info, warn};
use thiserror::Error;

use std::sync::{Arc, Mutex, MutexGuard};

use crate::config::{ChainConfig, ConfigError};

use super::block::{now_nanos, Block};
use super::crypto::{verify_signature, Address, Signature};
use super::encoding::EncodingError;
use super::pool::TransactionPool;
use super::pow::{meets_difficulty, CancellationToken, MiningError, ProofOfWork};
use super::transaction::{validate_amount, Transaction, TransactionError};

/// Errors that can occur during blockchain operations
#[derive(Debug, Error)]
pub enum BlockchainError {
    #[error("Transaction error: {0}")]
    TransactionError(#[from] TransactionError),

    #[error("Mining error: {0}")]
    MiningError(#[from] MiningError),

    #[error("Encoding error: {0}")]
    EncodingError(#[from] EncodingError),

    #[error("Config error: {0}")]
    ConfigError(#[from] ConfigError),

    #[error("Chain has no blocks")]
    EmptyChain,

    #[error("Lock poisoned: {0}")]
    LockPoisoned(&'static str),
}

/// Represents the blockchain
///
/// Cloning gives another handle to the same chain. Chain and pool each sit
/// behind a mutex, and mining cycles are serialized, so the last block cannot
/// change while a nonce search is running.
#[derive(Debug, Clone)]
pub struct Blockchain {
    /// The chain of blocks
    chain: Arc<Mutex<Vec<Block>>>,

    /// Pending transactions to be included in the next block
    pending_transactions: Arc<Mutex<TransactionPool>>,

    /// Held for the whole of a mining cycle
    mining: Arc<Mutex<()>>,

    /// Receives the reward of every mined block
    miner_address: Address,

    config: ChainConfig,

    proof_of_work: ProofOfWork,
}

impl Blockchain {
    /// Creates a new blockchain with a genesis block and the default config
    ///
    /// # Arguments
    ///
    /// * `miner_address` - The address credited with mining rewards
    pub fn new(miner_address: Address) -> Result<Self, BlockchainError> {
        Self::with_config(miner_address, ChainConfig::default())
    }

    /// Creates a new blockchain with a genesis block
    ///
    /// # Arguments
    ///
    /// * `miner_address` - The address credited with mining rewards
    /// * `config` - Difficulty, reward and mining limits
    pub fn with_config(miner_address: Address, config: ChainConfig) -> Result<Self, BlockchainError> {
        config.validate()?;

        let proof_of_work =
            ProofOfWork::new(config.difficulty).with_max_attempts(config.max_nonce_attempts);

        let genesis_block = Block::new(0, Block::zero().hash()?, Vec::new());
        info!(
            "action=create_genesis, status=success, miner={}, difficulty={}",
            miner_address, config.difficulty
        );

        Ok(Blockchain {
            chain: Arc::new(Mutex::new(vec![genesis_block])),
            pending_transactions: Arc::new(Mutex::new(TransactionPool::new())),
            mining: Arc::new(Mutex::new(())),
            miner_address,
            config,
            proof_of_work,
        })
    }

    fn blocks(&self) -> Result<MutexGuard<'_, Vec<Block>>, BlockchainError> {
        self.chain
            .lock()
            .map_err(|_| BlockchainError::LockPoisoned("chain"))
    }

    fn pool(&self) -> Result<MutexGuard<'_, TransactionPool>, BlockchainError> {
        self.pending_transactions
            .lock()
            .map_err(|_| BlockchainError::LockPoisoned("transaction pool"))
    }

    pub fn miner_address(&self) -> &Address {
        &self.miner_address
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    /// Gets the last block in the chain
    pub fn get_last_block(&self) -> Result<Block, BlockchainError> {
        self.blocks()?
            .last()
            .cloned()
            .ok_or(BlockchainError::EmptyChain)
    }

    /// Gets a copy of the entire blockchain
    pub fn get_chain(&self) -> Result<Vec<Block>, BlockchainError> {
        Ok(self.blocks()?.clone())
    }

    /// Gets a copy of the pending transactions, in arrival order
    pub fn get_pending_transactions(&self) -> Result<Vec<Transaction>, BlockchainError> {
        Ok(self.pool()?.snapshot())
    }

    /// Number of committed blocks, genesis included
    pub fn len(&self) -> Result<usize, BlockchainError> {
        Ok(self.blocks()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, BlockchainError> {
        Ok(self.blocks()?.is_empty())
    }

    /// Checks a signature against a transaction's canonical bytes
    pub fn verify_transaction_signature(
        sender_public_key: &VerifyingKey,
        signature: &Signature,
        transaction: &Transaction,
    ) -> Result<bool, EncodingError> {
        let message = transaction.canonical_bytes()?;
        Ok(verify_signature(sender_public_key, signature, &message))
    }

    /// Adds a signed transfer to the pending transactions
    ///
    /// The mining sender is refused here: reward transactions are only ever
    /// created by `mine`, so this entry point cannot mint value.
    ///
    /// # Arguments
    ///
    /// * `sender` - The address of the sender
    /// * `recipient` - The address of the recipient
    /// * `amount` - The amount to transfer
    /// * `sender_public_key` - The key the signature is checked against
    /// * `signature` - The sender's signature over the transaction
    ///
    /// # Returns
    ///
    /// `Ok(true)` when the transaction was pooled, `Ok(false)` when the
    /// signature does not verify
    pub fn add_transaction(
        &self,
        sender: Address,
        recipient: Address,
        amount: f64,
        sender_public_key: &VerifyingKey,
        signature: &Signature,
    ) -> Result<bool, BlockchainError> {
        if sender.is_mining_sender() {
            warn!("action=add_transaction, status=rejected, reason=reserved_sender");
            return Err(TransactionError::ReservedSender(sender).into());
        }

        validate_amount(amount)?;

        let transaction = Transaction::new(sender, recipient, amount);

        if !Self::verify_transaction_signature(sender_public_key, signature, &transaction)? {
            warn!(
                "action=add_transaction, status=rejected, reason=invalid_signature, sender={}",
                transaction.sender()
            );
            return Ok(false);
        }

        // Held until the transaction is pooled so concurrent submitters see each other
        let mut pool = self.pool()?;

        if self.config.enforce_balance {
            let available =
                self.balance_of(transaction.sender())? + pool.pending_delta(transaction.sender());
            if available < amount {
                warn!(
                    "action=add_transaction, status=rejected, reason=insufficient_funds, sender={}",
                    transaction.sender()
                );
                return Err(TransactionError::InsufficientFunds {
                    required: amount,
                    available,
                }
                .into());
            }
        }

        debug!(
            "action=add_transaction, status=success, sender={}, recipient={}, amount={}",
            transaction.sender(),
            transaction.recipient(),
            transaction.amount()
        );
        pool.submit(transaction);

        Ok(true)
    }

    /// Mines a new block with the pending transactions
    ///
    /// # Returns
    ///
    /// The newly committed block
    pub fn mine(&self) -> Result<Block, BlockchainError> {
        self.mine_with_cancel(&CancellationToken::new())
    }

    /// Mines a new block, stopping early when `cancel` is triggered
    ///
    /// The block holds the pooled transactions followed by the reward. Its
    /// timestamp is fixed before the search, so the committed block's hash is
    /// the one that satisfied proof of work. On failure nothing is committed
    /// and the pool is left as it was.
    pub fn mine_with_cancel(&self, cancel: &CancellationToken) -> Result<Block, BlockchainError> {
        let _cycle = self
            .mining
            .lock()
            .map_err(|_| BlockchainError::LockPoisoned("mining"))?;

        let previous_hash = self.get_last_block()?.hash()?;

        let mut transactions = self.pool()?.snapshot();
        let pooled = transactions.len();
        transactions.push(Transaction::new_reward(
            self.miner_address.clone(),
            self.config.mining_reward,
        ));

        let timestamp = now_nanos();
        let nonce = match self
            .proof_of_work
            .search(&transactions, &previous_hash, timestamp, cancel)
        {
            Ok(nonce) => nonce,
            Err(err) => {
                warn!("action=mining, status=failed, error={}", err);
                return Err(err.into());
            }
        };

        let block = Block::with_timestamp(timestamp, nonce, previous_hash, transactions);
        {
            // Pool before chain, the same order `add_transaction` uses
            let mut pool = self.pool()?;
            let mut chain = self.blocks()?;
            chain.push(block.clone());
            pool.commit(pooled);
        }

        info!(
            "action=mining, status=success, nonce={}, transactions={}",
            nonce,
            block.transactions().len()
        );

        Ok(block)
    }

    /// Calculates the balance of an address by replaying the whole chain
    ///
    /// Pending transactions are not counted. Takes the chain lock, so callers
    /// holding it must not call this.
    pub fn balance_of(&self, address: &Address) -> Result<f64, BlockchainError> {
        let chain = self.blocks()?;

        let balance = chain
            .iter()
            .flat_map(|block| block.transactions())
            .map(|transaction| transaction.balance_delta(address))
            .sum();

        Ok(balance)
    }

    /// Validates the blockchain
    ///
    /// Checks the genesis link, every hash link, the proof of work of every
    /// mined block and its reward transaction.
    pub fn is_valid(&self) -> Result<bool, BlockchainError> {
        let chain = self.blocks()?;

        let genesis = chain.first().ok_or(BlockchainError::EmptyChain)?;
        if genesis.previous_hash() != &Block::zero().hash()? || !genesis.transactions().is_empty() {
            warn!("action=validate, status=invalid, reason=genesis");
            return Ok(false);
        }

        for (index, pair) in chain.windows(2).enumerate() {
            let (previous_block, current_block) = (&pair[0], &pair[1]);

            // Check if the previous hash is correct
            if current_block.previous_hash() != &previous_block.hash()? {
                warn!("action=validate, status=invalid, reason=link, block={}", index + 1);
                return Ok(false);
            }

            // Check if the proof of work holds
            if !meets_difficulty(&current_block.hash()?, self.config.difficulty) {
                warn!("action=validate, status=invalid, reason=proof, block={}", index + 1);
                return Ok(false);
            }

            if !self.has_valid_reward(current_block) {
                warn!("action=validate, status=invalid, reason=reward, block={}", index + 1);
                return Ok(false);
            }
        }

        Ok(true)
    }

    /// A mined block carries exactly one reward, placed last
    fn has_valid_reward(&self, block: &Block) -> bool {
        let rewards = block.transactions().iter().filter(|t| t.is_reward()).count();

        match block.transactions().last() {
            Some(last) => {
                rewards == 1
                    && last.is_reward()
                    && last.recipient() == &self.miner_address
                    && last.amount() == self.config.mining_reward
            }
            None => false,
        }
    }
}
