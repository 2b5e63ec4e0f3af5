//! Base58 encoding and decoding with optional checksum support.
//!
//! Provides raw Base58 encode/decode and Base58Check encode/decode (with
//! double-SHA-256 checksum) used for the display form of addresses.

use crate::PrimitivesError;
use crate::hash::sha256d;

/// Length of the Base58Check checksum in bytes.
pub const CHECKSUM_SIZE: usize = 4;

/// Encode a byte slice to a Base58 string.
///
/// Uses Bitcoin's Base58 alphabet. Leading zero bytes are encoded as
/// leading '1' characters.
pub fn encode(data: &[u8]) -> String {
    bs58::encode(data).with_alphabet(bs58::Alphabet::BITCOIN).into_string()
}

/// Decode a Base58 string to a byte vector.
///
/// # Returns
/// `Ok(Vec<u8>)` on success, or an error for characters outside the alphabet.
pub fn decode(s: &str) -> Result<Vec<u8>, PrimitivesError> {
    bs58::decode(s)
        .with_alphabet(bs58::Alphabet::BITCOIN)
        .into_vec()
        .map_err(|e| PrimitivesError::InvalidBase58(e.to_string()))
}

/// First four bytes of SHA-256d(data).
pub fn checksum(data: &[u8]) -> [u8; CHECKSUM_SIZE] {
    let digest = sha256d(data);
    [digest[0], digest[1], digest[2], digest[3]]
}

/// Encode a byte slice with a 4-byte double-SHA-256 checksum appended (Base58Check).
///
/// # Arguments
/// * `data` - The bytes to encode (version byte + payload).
///
/// # Returns
/// A Base58Check-encoded string.
pub fn check_encode(data: &[u8]) -> String {
    let mut payload = Vec::with_capacity(data.len() + CHECKSUM_SIZE);
    payload.extend_from_slice(data);
    payload.extend_from_slice(&checksum(data));
    encode(&payload)
}

/// Decode a Base58Check string, verifying the 4-byte checksum.
///
/// # Returns
/// `Ok(Vec<u8>)` of the payload (without checksum) on success, or an
/// error for invalid encoding or checksum mismatch.
pub fn check_decode(s: &str) -> Result<Vec<u8>, PrimitivesError> {
    let decoded = decode(s)?;
    if decoded.len() < CHECKSUM_SIZE {
        return Err(PrimitivesError::InvalidBase58(
            "data too short for checksum".to_string()
        ));
    }
    let (payload, sum) = decoded.split_at(decoded.len() - CHECKSUM_SIZE);
    if sum != checksum(payload) {
        return Err(PrimitivesError::ChecksumMismatch);
    }
    Ok(payload.to_vec())
}
