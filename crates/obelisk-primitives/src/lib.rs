//! Obelisk client - primitive types and binary codecs.
//!
//! This crate provides the leaf building blocks of the Obelisk wire protocol:
//! - Hash functions (SHA-256, SHA-256d) used for address checksums
//! - `Hash256` for block and transaction identifiers (reversed on the wire)
//! - Base58 and Base58Check encoding
//! - `Address` conversion between the 21-byte wire form and checksummed text
//! - `WireReader` / `WireWriter` for little-endian protocol fields
//! - Argument codecs for heights, block indexes and stealth bitfields

pub mod hash;
pub mod chainhash;
pub mod base58;
pub mod address;
pub mod util;
pub mod codec;

mod error;
pub use error::PrimitivesError;

pub use address::Address;
pub use chainhash::Hash256;
pub use codec::{Bitfield, BlockIndex};
pub use util::{WireReader, WireWriter};
