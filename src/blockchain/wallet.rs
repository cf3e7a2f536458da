use ed25519_dalek::{Signer, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use ripemd::{Digest, Ripemd160};

use std::fmt;

use super::crypto::{Address, CryptoError, Signature};
use super::encoding::{sha256, EncodingError};
use super::transaction::Transaction;

/// Version byte placed in front of the key digest when deriving an address
const ADDRESS_VERSION: u8 = 0x00;

/// Holds a key pair and the address derived from it
///
/// The signing key never leaves the wallet. The chain core only ever receives
/// the public key and signatures produced here.
#[derive(Clone)]
pub struct Wallet {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
    address: Address,
}

impl Wallet {
    /// Creates a new wallet with a random keypair
    pub fn new() -> Self {
        let mut csprng = OsRng;
        let signing_key = SigningKey::generate(&mut csprng);
        Self::from_signing_key(signing_key)
    }

    /// Creates a wallet from an existing secret key
    ///
    /// # Arguments
    ///
    /// * `secret_key_bytes` - The 32 byte secret key
    pub fn from_secret_key(secret_key_bytes: &[u8]) -> Result<Self, CryptoError> {
        let bytes_array: [u8; 32] = secret_key_bytes.try_into().map_err(|_| {
            CryptoError::InvalidPrivateKey("Invalid private key length".to_string())
        })?;

        Ok(Self::from_signing_key(SigningKey::from_bytes(&bytes_array)))
    }

    fn from_signing_key(signing_key: SigningKey) -> Self {
        let verifying_key = signing_key.verifying_key();
        let address = derive_address(&verifying_key);

        Wallet {
            signing_key,
            verifying_key,
            address,
        }
    }

    /// Gets the wallet's address
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Gets the wallet's public key
    pub fn public_key(&self) -> &VerifyingKey {
        &self.verifying_key
    }

    pub fn public_key_hex(&self) -> String {
        hex::encode(self.verifying_key.as_bytes())
    }

    /// Signs the SHA-256 digest of a message
    pub fn sign(&self, message: &[u8]) -> Signature {
        let digest = sha256(message);
        Signature::from(self.signing_key.sign(&digest))
    }

    /// Signs a transaction's canonical bytes
    pub fn sign_transaction(&self, transaction: &Transaction) -> Result<Signature, EncodingError> {
        let message = transaction.canonical_bytes()?;
        Ok(self.sign(&message))
    }

    /// Exports the wallet's secret key as bytes
    pub fn export_secret_key(&self) -> Vec<u8> {
        self.signing_key.to_bytes().to_vec()
    }
}

impl Default for Wallet {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.address)
            .field("public_key", &self.public_key_hex())
            .finish_non_exhaustive()
    }
}

/// Derives a base58check address from a public key
///
/// `version || RIPEMD-160(SHA-256(key))`, followed by the first four bytes
/// of a double SHA-256 of that payload as checksum.
pub fn derive_address(public_key: &VerifyingKey) -> Address {
    let key_digest = Ripemd160::digest(sha256(public_key.as_bytes()));

    let mut payload = Vec::with_capacity(25);
    payload.push(ADDRESS_VERSION);
    payload.extend_from_slice(&key_digest);

    let checksum = sha256(&sha256(&payload));
    payload.extend_from_slice(&checksum[..4]);

    Address(bs58::encode(payload).into_string())
}

/// Checks the version byte and checksum of a base58check address
pub fn is_valid_address(address: &Address) -> bool {
    let bytes = match bs58::decode(address.as_str()).into_vec() {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };

    if bytes.len() != 25 || bytes[0] != ADDRESS_VERSION {
        return false;
    }

    let checksum = sha256(&sha256(&bytes[..21]));
    bytes[21..] == checksum[..4]
}
