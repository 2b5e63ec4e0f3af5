//! Argument codecs for request payloads.
//!
//! Validates caller-supplied heights, indexes, block indexes and stealth
//! bitfields and turns them into wire bytes. Text forms follow what users
//! type on a command line: decimal digits for integers, 64 hex characters
//! for hashes and 8 hex characters for bitfields.

use std::fmt;
use std::str::FromStr;

use crate::chainhash::{Hash256, HASH_STRING_SIZE};
use crate::PrimitivesError;

/// Encode an integer as a 4-byte little-endian value.
///
/// # Returns
/// The wire bytes, or `InvalidInteger` if `n` is negative or exceeds `u32::MAX`.
pub fn encode_uint32(n: i64) -> Result<[u8; 4], PrimitivesError> {
    let value = u32::try_from(n)
        .map_err(|_| PrimitivesError::InvalidInteger(format!("{} is outside 0..=4294967295", n)))?;
    Ok(value.to_le_bytes())
}

/// Decode exactly four little-endian bytes.
pub fn decode_uint32(bytes: &[u8]) -> Result<u32, PrimitivesError> {
    let arr: [u8; 4] = bytes.try_into().map_err(|_| {
        PrimitivesError::InvalidInteger(format!("expected 4 bytes, got {}", bytes.len()))
    })?;
    Ok(u32::from_le_bytes(arr))
}

/// Parse a non-negative decimal integer that must fit in 32 bits.
///
/// Only ASCII digits are accepted: no sign, no whitespace, no fraction.
pub fn parse_uint32(s: &str) -> Result<u32, PrimitivesError> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        let reason = format!("'{}' is not a non-negative integer", s);
        return Err(PrimitivesError::InvalidInteger(reason));
    }
    s.parse::<u32>()
        .map_err(|_| PrimitivesError::InvalidInteger(format!("'{}' does not fit in 32 bits", s)))
}

// ---------------------------------------------------------------------------
// BlockIndex
// ---------------------------------------------------------------------------

/// A block addressed either by height or by hash.
///
/// The wire tells the two apart only by payload length (4 or 32 bytes);
/// interpreting that is the server's job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockIndex {
    /// Block height.
    Height(u32),
    /// Block hash.
    Hash(Hash256),
}

impl BlockIndex {
    /// Encode to 4 little-endian bytes (height) or 32 reversed bytes (hash).
    pub fn encode(&self) -> Vec<u8> {
        match self {
            BlockIndex::Height(h) => h.to_le_bytes().to_vec(),
            BlockIndex::Hash(hash) => hash.to_wire().to_vec(),
        }
    }
}

impl From<u32> for BlockIndex {
    fn from(height: u32) -> Self {
        BlockIndex::Height(height)
    }
}

impl From<Hash256> for BlockIndex {
    fn from(hash: Hash256) -> Self {
        BlockIndex::Hash(hash)
    }
}

/// Parse a height (decimal digits) or a hash (exactly 64 hex characters).
///
/// A 64-character string is always read as a hash.
impl FromStr for BlockIndex {
    type Err = PrimitivesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() == HASH_STRING_SIZE {
            return Hash256::from_hex(s)
                .map(BlockIndex::Hash)
                .map_err(|e| PrimitivesError::InvalidBlockIndex(e.to_string()));
        }
        parse_uint32(s).map(BlockIndex::Height).map_err(|_| {
            PrimitivesError::InvalidBlockIndex(format!("'{}' is neither a height nor a hash", s))
        })
    }
}

impl fmt::Display for BlockIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockIndex::Height(h) => write!(f, "{}", h),
            BlockIndex::Hash(hash) => write!(f, "{}", hash),
        }
    }
}

// ---------------------------------------------------------------------------
// Bitfield
// ---------------------------------------------------------------------------

/// Number of hex characters in a textual bitfield.
const BITFIELD_STRING_SIZE: usize = 8;

/// The 32-bit prefix filter of a stealth scan.
///
/// The display form is big-endian (as hex strings are written); the wire
/// form is the reverse, i.e. the value in little-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Bitfield(pub u32);

impl Bitfield {
    /// Build from 4 bytes in display order.
    pub fn from_display_bytes(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        let arr: [u8; 4] = bytes.try_into().map_err(|_| {
            PrimitivesError::InvalidBitfield(format!("expected 4 bytes, got {}", bytes.len()))
        })?;
        Ok(Bitfield(u32::from_be_bytes(arr)))
    }

    /// The 4 wire bytes.
    pub fn encode(&self) -> [u8; 4] {
        self.0.to_le_bytes()
    }
}

impl From<u32> for Bitfield {
    fn from(v: u32) -> Self {
        Bitfield(v)
    }
}

/// Parse 8 hex characters, or a decimal integer of any other length.
impl FromStr for Bitfield {
    type Err = PrimitivesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() == BITFIELD_STRING_SIZE {
            let bytes =
                hex::decode(s).map_err(|e| PrimitivesError::InvalidBitfield(e.to_string()))?;
            return Bitfield::from_display_bytes(&bytes);
        }
        parse_uint32(s).map(Bitfield).map_err(|_| {
            let reason = format!("'{}' is neither 8 hex digits nor an integer", s);
            PrimitivesError::InvalidBitfield(reason)
        })
    }
}

impl fmt::Display for Bitfield {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}
