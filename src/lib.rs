//! A single-node proof-of-work ledger.
//!
//! The crate is split into the chain core (`blockchain`) and its configuration (`config`).
//! Key generation and address derivation live in `blockchain::wallet`, which the core never
//! depends on: the chain only sees public keys and pre-computed signatures.

pub mod blockchain;
pub mod config;

pub use blockchain::{Address, Block, BlockHash, Blockchain, BlockchainError, Signature, Transaction, Wallet};
pub use config::ChainConfig;
