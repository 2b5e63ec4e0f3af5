//! Chain hash type for transaction and block identification.
//!
//! Provides `Hash256` — a 32-byte identifier stored in wire order and
//! displayed as byte-reversed hex, matching the convention for transaction
//! IDs and block hashes. Converting between the two orders happens only in
//! the constructors and formatters here, so every encode or decode performs
//! the reversal exactly once.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::PrimitivesError;

/// Size of a Hash256 in bytes.
pub const HASH_SIZE: usize = 32;

/// Hex string length of a Hash256 (64 hex characters).
pub const HASH_STRING_SIZE: usize = HASH_SIZE * 2;

/// A 32-byte hash used for transaction IDs and block hashes.
///
/// Bytes are kept in wire order. When displayed as a string, the bytes are
/// reversed to give the conventional big-endian hex form.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Hash256([u8; HASH_SIZE]);

impl Hash256 {
    /// Create a hash from bytes already in wire order.
    pub const fn from_wire(bytes: [u8; HASH_SIZE]) -> Self {
        Hash256(bytes)
    }

    /// Create a hash from a wire-order byte slice.
    ///
    /// # Arguments
    /// * `bytes` - A slice that must be exactly 32 bytes.
    ///
    /// # Returns
    /// `Ok(Hash256)` if the slice is 32 bytes, or an error otherwise.
    pub fn from_wire_slice(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        let arr: [u8; HASH_SIZE] = bytes.try_into().map_err(|_| {
            PrimitivesError::InvalidHash(format!(
                "invalid hash length of {}, want {}",
                bytes.len(),
                HASH_SIZE
            ))
        })?;
        Ok(Hash256(arr))
    }

    /// Create a hash from bytes in display order (the order hex strings use).
    ///
    /// # Arguments
    /// * `bytes` - A slice that must be exactly 32 bytes.
    ///
    /// # Returns
    /// `Ok(Hash256)` with the bytes reversed into wire order.
    pub fn from_display_bytes(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        let mut hash = Self::from_wire_slice(bytes)?;
        hash.0.reverse();
        Ok(hash)
    }

    /// Parse a 64-character hex string in display order.
    ///
    /// Unlike block explorers, no zero padding is applied: the string must
    /// be exactly 64 hex characters.
    ///
    /// # Arguments
    /// * `hex_str` - The hex string.
    ///
    /// # Returns
    /// `Ok(Hash256)` on success, or an error for bad length or characters.
    pub fn from_hex(hex_str: &str) -> Result<Self, PrimitivesError> {
        if hex_str.len() != HASH_STRING_SIZE {
            return Err(PrimitivesError::InvalidHash(format!(
                "hash string must be {} hex characters, got {}",
                HASH_STRING_SIZE,
                hex_str.len()
            )));
        }
        let decoded = hex::decode(hex_str)?;
        Self::from_display_bytes(&decoded)
    }

    /// The 32 bytes in wire order.
    pub fn to_wire(&self) -> [u8; HASH_SIZE] {
        self.0
    }

    /// The 32 bytes in display order.
    pub fn to_display_bytes(&self) -> [u8; HASH_SIZE] {
        let mut reversed = self.0;
        reversed.reverse();
        reversed
    }

    /// Access the wire-order byte array.
    pub fn as_wire(&self) -> &[u8; HASH_SIZE] {
        &self.0
    }
}

/// Display the hash as byte-reversed hex.
///
/// Wire bytes `[0x06, 0xe5, ...]` display as `"...e506"`.
impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.to_display_bytes()))
    }
}

impl fmt::Debug for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash256({})", self)
    }
}

impl FromStr for Hash256 {
    type Err = PrimitivesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Hash256::from_hex(s)
    }
}

/// Serialize as a hex string in JSON.
impl Serialize for Hash256 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

/// Deserialize from a hex string in JSON.
impl<'de> Deserialize<'de> for Hash256 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Hash256::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
