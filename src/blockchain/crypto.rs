use ed25519_dalek::{Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use std::fmt;
use std::str::FromStr;

use super::encoding::sha256;
use super::MINING_SENDER;

/// Errors that can occur while decoding cryptographic material
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    #[error("Decoding error: {0}")]
    DecodingError(String),
}

/// Opaque account identifier
///
/// The core never inspects its structure; deriving it from a key is the wallet's job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(pub String);

impl Address {
    /// The reserved sender used by mining reward transactions
    pub fn mining_sender() -> Self {
        Address(MINING_SENDER.to_string())
    }

    /// Checks if this is the reserved mining reward sender
    pub fn is_mining_sender(&self) -> bool {
        self.0 == MINING_SENDER
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Address {
    fn from(s: &str) -> Self {
        Address(s.to_string())
    }
}

impl From<String> for Address {
    fn from(s: String) -> Self {
        Address(s)
    }
}

/// A SHA-256 block digest
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockHash(pub [u8; 32]);

impl BlockHash {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex rendering, 64 characters
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl From<[u8; 32]> for BlockHash {
    fn from(bytes: [u8; 32]) -> Self {
        BlockHash(bytes)
    }
}

impl fmt::Display for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// An `(r, s)` signature over the SHA-256 digest of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    pub r: [u8; 32],
    pub s: [u8; 32],
}

impl Signature {
    pub fn from_components(r: [u8; 32], s: [u8; 32]) -> Self {
        Signature { r, s }
    }

    /// Concatenation of `r` and `s`
    pub fn to_bytes(&self) -> [u8; 64] {
        let mut bytes = [0u8; 64];
        bytes[..32].copy_from_slice(&self.r);
        bytes[32..].copy_from_slice(&self.s);
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != 64 {
            return Err(CryptoError::InvalidSignature(format!(
                "Signature must be 64 bytes, got {}",
                bytes.len()
            )));
        }

        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..]);
        Ok(Signature { r, s })
    }
}

impl From<ed25519_dalek::Signature> for Signature {
    fn from(signature: ed25519_dalek::Signature) -> Self {
        Signature {
            r: *signature.r_bytes(),
            s: *signature.s_bytes(),
        }
    }
}

impl From<&Signature> for ed25519_dalek::Signature {
    fn from(signature: &Signature) -> Self {
        ed25519_dalek::Signature::from_components(signature.r, signature.s)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", hex::encode(self.r), hex::encode(self.s))
    }
}

impl FromStr for Signature {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|e| CryptoError::DecodingError(e.to_string()))?;
        Signature::from_bytes(&bytes)
    }
}

/// Decodes a hex encoded public key
pub fn public_key_from_hex(hex_str: &str) -> Result<VerifyingKey, CryptoError> {
    let bytes = hex::decode(hex_str).map_err(|e| CryptoError::DecodingError(e.to_string()))?;

    let bytes: [u8; 32] = bytes.try_into().map_err(|_| {
        CryptoError::InvalidPublicKey("Public key must be 32 bytes".to_string())
    })?;

    VerifyingKey::from_bytes(&bytes).map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))
}

/// Verifies a signature against a message and public key
///
/// The message is hashed with SHA-256 first; the signature covers the digest.
/// Any mismatch yields `false`, never an error.
pub fn verify_signature(public_key: &VerifyingKey, signature: &Signature, message: &[u8]) -> bool {
    let digest = sha256(message);
    public_key
        .verify(&digest, &ed25519_dalek::Signature::from(signature))
        .is_ok()
}
