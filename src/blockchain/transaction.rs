use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::crypto::Address;
use super::encoding::{canonical_bytes, EncodingError};

/// Errors that can occur during transaction operations
#[derive(Debug, Error)]
pub enum TransactionError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Sender {0} is reserved for mining rewards")]
    ReservedSender(Address),

    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: f64, available: f64 },

    #[error("Encoding error: {0}")]
    Encoding(#[from] EncodingError),
}

/// Represents a value transfer between two accounts
///
/// Immutable once constructed. The serialized field names are part of the
/// canonical encoding and must not change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(rename = "sender_blockchain_address")]
    sender: Address,

    #[serde(rename = "recipient_blockchain_address")]
    recipient: Address,

    #[serde(rename = "value")]
    amount: f64,
}

impl Transaction {
    /// Creates a new transaction
    ///
    /// # Arguments
    ///
    /// * `sender` - The address of the sender
    /// * `recipient` - The address of the recipient
    /// * `amount` - The amount to transfer
    pub fn new(sender: Address, recipient: Address, amount: f64) -> Self {
        Transaction {
            sender,
            recipient,
            amount,
        }
    }

    /// Creates a mining reward transaction
    pub(crate) fn new_reward(miner: Address, amount: f64) -> Self {
        Transaction::new(Address::mining_sender(), miner, amount)
    }

    pub fn sender(&self) -> &Address {
        &self.sender
    }

    pub fn recipient(&self) -> &Address {
        &self.recipient
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    /// Checks if the transaction is a mining reward
    pub fn is_reward(&self) -> bool {
        self.sender.is_mining_sender()
    }

    /// Bytes covered by the sender's signature
    pub fn canonical_bytes(&self) -> Result<Vec<u8>, EncodingError> {
        canonical_bytes(self)
    }

    /// Change this transaction applies to the balance of `address`
    pub fn balance_delta(&self, address: &Address) -> f64 {
        let mut delta = 0.0;
        if &self.recipient == address {
            delta += self.amount;
        }
        if &self.sender == address {
            delta -= self.amount;
        }
        delta
    }
}

/// Checks that an amount can be transferred
pub fn validate_amount(amount: f64) -> Result<(), TransactionError> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(TransactionError::InvalidAmount(format!(
            "Amount must be a positive number: {}",
            amount
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::encoding::CANONICAL_ENCODING_VERSION;

    #[test]
    fn test_new_transaction() {
        let transaction = Transaction::new(Address::from("A"), Address::from("B"), 10.5);

        assert_eq!(transaction.sender(), &Address::from("A"));
        assert_eq!(transaction.recipient(), &Address::from("B"));
        assert_eq!(transaction.amount(), 10.5);
        assert!(!transaction.is_reward());
    }

    #[test]
    fn test_reward_transaction() {
        let transaction = Transaction::new_reward(Address::from("miner"), 1.0);

        assert!(transaction.is_reward());
        assert!(transaction.sender().is_mining_sender());
        assert_eq!(transaction.recipient(), &Address::from("miner"));
    }

    #[test]
    fn test_canonical_bytes() {
        let transaction = Transaction::new(Address::from("A"), Address::from("B"), 1.5);
        let bytes = transaction.canonical_bytes().unwrap();

        assert_eq!(bytes[0], CANONICAL_ENCODING_VERSION);
        assert_eq!(
            &bytes[1..],
            br#"{"sender_blockchain_address":"A","recipient_blockchain_address":"B","value":1.5}"#
        );
        assert_eq!(bytes, transaction.clone().canonical_bytes().unwrap());
    }

    #[test]
    fn test_canonical_bytes_differ_per_field() {
        let base = Transaction::new(Address::from("A"), Address::from("B"), 1.0);
        let other_amount = Transaction::new(Address::from("A"), Address::from("B"), 2.0);
        let swapped = Transaction::new(Address::from("B"), Address::from("A"), 1.0);

        let base_bytes = base.canonical_bytes().unwrap();
        assert_ne!(base_bytes, other_amount.canonical_bytes().unwrap());
        assert_ne!(base_bytes, swapped.canonical_bytes().unwrap());
    }

    #[test]
    fn test_balance_delta() {
        let transaction = Transaction::new(Address::from("A"), Address::from("B"), 3.0);

        assert_eq!(transaction.balance_delta(&Address::from("A")), -3.0);
        assert_eq!(transaction.balance_delta(&Address::from("B")), 3.0);
        assert_eq!(transaction.balance_delta(&Address::from("C")), 0.0);

        let to_self = Transaction::new(Address::from("A"), Address::from("A"), 3.0);
        assert_eq!(to_self.balance_delta(&Address::from("A")), 0.0);
    }

    #[test]
    fn test_validate_amount() {
        assert!(validate_amount(0.5).is_ok());
        assert!(validate_amount(0.0).is_err());
        assert!(validate_amount(-1.0).is_err());
        assert!(validate_amount(f64::NAN).is_err());
        assert!(validate_amount(f64::INFINITY).is_err());
    }
}
