//! Push messages that do not answer a request.
//!
//! Address activity arrives on the request connection under the
//! [`ADDRESS_UPDATE`] name. Blocks, transactions and heartbeats arrive on
//! their own one-way feeds as multi-part messages.

use obelisk_primitives::{Address, Hash256, PrimitivesError, WireReader};

use crate::command::ADDRESS_UPDATE;
use crate::error::ProtocolError;
use crate::response::HEADER_SIZE;

const BLOCK_FEED: &str = "block feed";
const TRANSACTION_FEED: &str = "transaction feed";
const HEARTBEAT_FEED: &str = "heartbeat feed";

/// Activity on a subscribed address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressUpdate {
    /// The address that was paid or spent from.
    pub address: Address,
    /// Height of the confirming block, `None` while unconfirmed.
    pub height: Option<u32>,
    /// Hash of the confirming block, `None` while unconfirmed.
    pub block_hash: Option<Hash256>,
    /// The raw transaction.
    pub tx: Vec<u8>,
}

impl AddressUpdate {
    /// Decode the body of an `address.update` frame.
    ///
    /// The body carries no status word. A height of 0 marks an unconfirmed
    /// transaction, in which case the block hash field is ignored.
    pub fn decode(body: &[u8]) -> Result<Self, ProtocolError> {
        let bad = |e: PrimitivesError| ProtocolError::malformed(ADDRESS_UPDATE, e);
        let mut r = WireReader::new(body);
        let address = r.read_address().map_err(bad)?;
        let height = r.read_u32_le().map_err(bad)?;
        let block_hash = r.read_hash().map_err(bad)?;
        let tx = r.read_rest().to_vec();

        let (height, block_hash) = match height {
            0 => (None, None),
            h => (Some(h), Some(block_hash)),
        };
        Ok(AddressUpdate { address, height, block_hash, tx })
    }
}

/// A new block announced on the block feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockNotification {
    /// Block height.
    pub height: u32,
    /// Raw 80-byte header.
    pub header: [u8; HEADER_SIZE],
    /// Raw transactions in block order.
    pub transactions: Vec<Vec<u8>>,
}

impl BlockNotification {
    /// Assemble a notification from the parts of one feed message:
    /// height, header, then one part per transaction.
    pub fn from_parts(parts: &[Vec<u8>]) -> Result<Self, ProtocolError> {
        let (height, rest) = parts
            .split_first()
            .ok_or_else(|| ProtocolError::malformed(BLOCK_FEED, "empty message"))?;
        let (header, transactions) = rest
            .split_first()
            .ok_or_else(|| ProtocolError::malformed(BLOCK_FEED, "missing header part"))?;

        let height = exact_u32(BLOCK_FEED, height)?;
        let header: [u8; HEADER_SIZE] = header.as_slice().try_into().map_err(|_| {
            ProtocolError::malformed(
                BLOCK_FEED,
                format!("header part is {} bytes, expected {}", header.len(), HEADER_SIZE),
            )
        })?;

        Ok(BlockNotification { height, header, transactions: transactions.to_vec() })
    }
}

/// A liveness tick from the heartbeat feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Heartbeat {
    /// Server-side counter.
    pub counter: u32,
}

impl Heartbeat {
    /// Decode a heartbeat message, which must be one 4-byte part.
    pub fn from_parts(parts: &[Vec<u8>]) -> Result<Self, ProtocolError> {
        match parts {
            [counter] => Ok(Heartbeat { counter: exact_u32(HEARTBEAT_FEED, counter)? }),
            _ => Err(ProtocolError::malformed(
                HEARTBEAT_FEED,
                format!("expected 1 part, got {}", parts.len()),
            )),
        }
    }
}

/// Extract the raw transaction from a transaction feed message.
///
/// Each message carries exactly one part.
pub fn transaction_from_parts(parts: &[Vec<u8>]) -> Result<Vec<u8>, ProtocolError> {
    match parts {
        [tx] => Ok(tx.clone()),
        _ => Err(ProtocolError::malformed(
            TRANSACTION_FEED,
            format!("expected 1 part, got {}", parts.len()),
        )),
    }
}

fn exact_u32(feed: &'static str, part: &[u8]) -> Result<u32, ProtocolError> {
    let bytes: [u8; 4] = part.try_into().map_err(|_| {
        let reason = format!("expected a 4-byte integer, got {} bytes", part.len());
        ProtocolError::malformed(feed, reason)
    })?;
    Ok(u32::from_le_bytes(bytes))
}
