//! Address handling.
//!
//! An address is a version byte plus a 20-byte hash. It travels in two
//! forms:
//! - wire form: 21 bytes, version followed by the hash with its 20 bytes
//!   reversed (the server serializes short hashes the same way it does
//!   256-bit hashes), no checksum;
//! - display form: Base58Check of version + hash.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::base58;
use crate::PrimitivesError;

/// Length of the hash part of an address.
pub const ADDRESS_HASH_SIZE: usize = 20;

/// Length of the wire form (version + hash).
pub const ADDRESS_WIRE_SIZE: usize = ADDRESS_HASH_SIZE + 1;

/// Mainnet P2PKH address version byte.
pub const MAINNET_P2PKH: u8 = 0x00;
/// Mainnet P2SH address version byte.
pub const MAINNET_P2SH: u8 = 0x05;
/// Testnet P2PKH address version byte.
pub const TESTNET_P2PKH: u8 = 0x6f;

/// A versioned 20-byte address.
///
/// Any version byte is accepted; the server, not the client, decides what
/// it supports.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address {
    version: u8,
    hash: [u8; ADDRESS_HASH_SIZE],
}

impl Address {
    /// Create an address from its version byte and hash (display order).
    pub const fn new(version: u8, hash: [u8; ADDRESS_HASH_SIZE]) -> Self {
        Address { version, hash }
    }

    /// Decode the 21-byte wire form.
    ///
    /// # Arguments
    /// * `bytes` - Version byte followed by the byte-reversed hash.
    ///
    /// # Returns
    /// An `Address`, or an error if the slice is not 21 bytes.
    pub fn from_wire(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        if bytes.len() != ADDRESS_WIRE_SIZE {
            return Err(PrimitivesError::InvalidAddressLength {
                expected: ADDRESS_WIRE_SIZE,
                got: bytes.len(),
            });
        }
        let mut hash = [0u8; ADDRESS_HASH_SIZE];
        hash.copy_from_slice(&bytes[1..]);
        hash.reverse();
        Ok(Address { version: bytes[0], hash })
    }

    /// Encode the 21-byte wire form.
    pub fn to_wire(&self) -> [u8; ADDRESS_WIRE_SIZE] {
        let mut out = [0u8; ADDRESS_WIRE_SIZE];
        out[0] = self.version;
        for (i, b) in self.hash.iter().rev().enumerate() {
            out[i + 1] = *b;
        }
        out
    }

    /// Parse a Base58Check address string.
    ///
    /// Fails on characters outside the Base58 alphabet, on a decoded length
    /// other than 25 bytes, and on a checksum mismatch.
    pub fn from_string(addr: &str) -> Result<Self, PrimitivesError> {
        let payload = base58::check_decode(addr)?;
        if payload.len() != ADDRESS_WIRE_SIZE {
            return Err(PrimitivesError::InvalidAddressLength {
                expected: ADDRESS_WIRE_SIZE,
                got: payload.len(),
            });
        }
        let mut hash = [0u8; ADDRESS_HASH_SIZE];
        hash.copy_from_slice(&payload[1..]);
        Ok(Address { version: payload[0], hash })
    }

    /// The version byte.
    pub fn version(&self) -> u8 {
        self.version
    }

    /// The 20-byte hash in display order.
    pub fn hash(&self) -> &[u8; ADDRESS_HASH_SIZE] {
        &self.hash
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut payload = [0u8; ADDRESS_WIRE_SIZE];
        payload[0] = self.version;
        payload[1..].copy_from_slice(&self.hash);
        write!(f, "{}", base58::check_encode(&payload))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl FromStr for Address {
    type Err = PrimitivesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Address::from_string(s)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Address::from_string(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDRESS: &str = "1DUhzP41otHNKijH4B6dZN1SRVuYJyYfrp";
    const ADDRESS_WIRE: &str = "00549619cbda3ee1a449ca6350560a9d22dff4de88";

    #[test]
    fn test_from_string_to_wire() {
        let addr = Address::from_string(ADDRESS).unwrap();
        assert_eq!(addr.version(), MAINNET_P2PKH);
        assert_eq!(hex::encode(addr.hash()), "88def4df229d0a565063ca49a4e13edacb199654");
        assert_eq!(hex::encode(addr.to_wire()), ADDRESS_WIRE);
    }

    #[test]
    fn test_from_wire_to_string() {
        let wire = hex::decode(ADDRESS_WIRE).unwrap();
        let addr = Address::from_wire(&wire).unwrap();
        assert_eq!(addr.to_string(), ADDRESS);
    }

    #[test]
    fn test_testnet_and_p2sh_versions() {
        let testnet = Address::from_string("mtdruWYVEV1wz5yL7GvpBj4MgifCB7yhPd").unwrap();
        assert_eq!(testnet.version(), TESTNET_P2PKH);
        assert_eq!(hex::encode(testnet.hash()), "8fe80c75c9560e8b56ed64ea3c26e18d2c52211b");

        let p2sh = Address::new(MAINNET_P2SH, [0x11; 20]);
        assert_eq!(p2sh.to_string(), "33FFrcn4Tv1qgGEuXPkkPdr44DuWp3RzPo");
    }

    #[test]
    fn test_zero_address() {
        let addr = Address::new(MAINNET_P2PKH, [0u8; 20]);
        assert_eq!(addr.to_string(), "1111111111111111111114oLvT2");
    }

    #[test]
    fn test_invalid_strings() {
        assert!(Address::from_string("").is_err());
        assert!(Address::from_string("$#!+").is_err());
        // Valid Base58Check but wrong payload length.
        let short = base58::check_encode(&[0u8; 10]);
        assert!(matches!(
            Address::from_string(&short),
            Err(PrimitivesError::InvalidAddressLength { expected: 21, got: 10 })
        ));
    }

    #[test]
    fn test_checksum_tamper() {
        let mut decoded = base58::decode(ADDRESS).unwrap();
        decoded[24] ^= 0x01;
        let tampered = base58::encode(&decoded);
        assert_eq!(Address::from_string(&tampered), Err(PrimitivesError::ChecksumMismatch));
    }

    #[test]
    fn test_from_wire_wrong_length() {
        assert!(Address::from_wire(&[0u8; 20]).is_err());
        assert!(Address::from_wire(&[0u8; 22]).is_err());
    }
}
