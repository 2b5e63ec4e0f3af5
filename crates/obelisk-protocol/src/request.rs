//! Typed requests and their payload encoders.

use obelisk_primitives::{Address, Bitfield, BlockIndex, Hash256, WireWriter};
use serde::{Deserialize, Serialize};

use crate::command::CommandKind;
use crate::error::ProtocolError;

/// Largest prefix length accepted by a stealth scan.
pub const MAX_STEALTH_BITS: u8 = 32;

/// A transaction output reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutPoint {
    /// Transaction hash.
    pub hash: Hash256,
    /// Output index within the transaction.
    pub index: u32,
}

/// One request, carrying the typed arguments of its command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// `blockchain.fetch_last_height`
    FetchLastHeight,
    /// `blockchain.fetch_block_height`
    FetchBlockHeight {
        /// Block hash.
        hash: Hash256,
    },
    /// `blockchain.fetch_block_header`
    FetchBlockHeader {
        /// Block height or hash.
        index: BlockIndex,
    },
    /// `blockchain.fetch_block_transaction_hashes`
    FetchBlockTransactionHashes {
        /// Block height or hash.
        index: BlockIndex,
    },
    /// `blockchain.fetch_transaction`
    FetchTransaction {
        /// Transaction hash.
        hash: Hash256,
    },
    /// `transaction_pool.fetch_transaction`
    FetchPoolTransaction {
        /// Transaction hash.
        hash: Hash256,
    },
    /// `blockchain.fetch_transaction_index`
    FetchTransactionIndex {
        /// Transaction hash.
        hash: Hash256,
    },
    /// `blockchain.fetch_spend`
    FetchSpend {
        /// The output whose spend is wanted.
        outpoint: OutPoint,
    },
    /// `blockchain.fetch_stealth`
    FetchStealth {
        /// Number of significant prefix bits, 0 to 32.
        nbits: u8,
        /// Prefix filter.
        bitfield: Bitfield,
        /// Scan from this height.
        from_height: u32,
    },
    /// `blockchain.fetch_history`
    FetchHistory {
        /// Watched address.
        address: Address,
        /// Only rows from this height.
        from_height: u32,
    },
    /// `address.fetch_history`
    FetchAddressHistory {
        /// Watched address.
        address: Address,
        /// Only rows from this height.
        from_height: u32,
    },
    /// `address.subscribe`
    SubscribeAddress {
        /// Address to watch.
        address: Address,
    },
    /// `address.renew`
    RenewAddress {
        /// Address whose subscription to extend.
        address: Address,
    },
}

impl Request {
    /// The command this request invokes.
    pub fn kind(&self) -> CommandKind {
        match self {
            Request::FetchLastHeight => CommandKind::FetchLastHeight,
            Request::FetchBlockHeight { .. } => CommandKind::FetchBlockHeight,
            Request::FetchBlockHeader { .. } => CommandKind::FetchBlockHeader,
            Request::FetchBlockTransactionHashes { .. } => CommandKind::FetchBlockTransactionHashes,
            Request::FetchTransaction { .. } => CommandKind::FetchTransaction,
            Request::FetchPoolTransaction { .. } => CommandKind::FetchPoolTransaction,
            Request::FetchTransactionIndex { .. } => CommandKind::FetchTransactionIndex,
            Request::FetchSpend { .. } => CommandKind::FetchSpend,
            Request::FetchStealth { .. } => CommandKind::FetchStealth,
            Request::FetchHistory { .. } => CommandKind::FetchHistory,
            Request::FetchAddressHistory { .. } => CommandKind::FetchAddressHistory,
            Request::SubscribeAddress { .. } => CommandKind::SubscribeAddress,
            Request::RenewAddress { .. } => CommandKind::RenewAddress,
        }
    }

    /// Validate the arguments and build the payload.
    ///
    /// # Returns
    /// The payload bytes, or `ProtocolError::InvalidArgument` naming the
    /// rejected argument. Nothing may be sent when this fails.
    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        let mut w = WireWriter::new();
        match self {
            Request::FetchLastHeight => {}
            Request::FetchBlockHeight { hash }
            | Request::FetchTransaction { hash }
            | Request::FetchPoolTransaction { hash }
            | Request::FetchTransactionIndex { hash } => {
                w.write_hash(hash);
            }
            Request::FetchBlockHeader { index }
            | Request::FetchBlockTransactionHashes { index } => {
                w.write_bytes(&index.encode());
            }
            Request::FetchSpend { outpoint } => {
                w.write_hash(&outpoint.hash).write_u32_le(outpoint.index);
            }
            Request::FetchStealth { nbits, bitfield, from_height } => {
                if *nbits > MAX_STEALTH_BITS {
                    return Err(ProtocolError::invalid(
                        "number of bits",
                        format!("{} is outside 0..={}", nbits, MAX_STEALTH_BITS),
                    ));
                }
                w.write_u8(*nbits)
                    .write_bytes(&bitfield.encode())
                    .write_u32_le(*from_height);
            }
            Request::FetchHistory { address, from_height }
            | Request::FetchAddressHistory { address, from_height } => {
                w.write_address(address).write_u32_le(*from_height);
            }
            Request::SubscribeAddress { address } | Request::RenewAddress { address } => {
                w.write_address(address);
            }
        }
        Ok(w.into_bytes())
    }
}
