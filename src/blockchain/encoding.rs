use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Version byte prefixed to every canonical encoding
///
/// Bump it whenever the byte layout of hashed or signed values changes, so that
/// hashes produced under different layouts can never collide.
pub const CANONICAL_ENCODING_VERSION: u8 = 1;

/// Errors that can occur while encoding values
#[derive(Debug, Error)]
pub enum EncodingError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Encodes a value into its canonical byte form
///
/// The layout is the version byte followed by compact JSON. Field order is the
/// declaration order of the serialized struct, which keeps the output stable.
/// Both transaction signing and block hashing go through here.
///
/// # Arguments
///
/// * `value` - The value to encode
///
/// # Returns
///
/// The canonical bytes of the value
pub fn canonical_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, EncodingError> {
    let mut bytes = Vec::with_capacity(256);
    bytes.push(CANONICAL_ENCODING_VERSION);
    serde_json::to_writer(&mut bytes, value)?;
    Ok(bytes)
}

/// Computes the SHA-256 digest of some bytes
pub fn sha256(bytes: &[u8]) -> [u8; 32] {
    Sha256::digest(bytes).into()
}
