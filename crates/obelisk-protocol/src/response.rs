//! Typed results and the per-command body decoders.
//!
//! A decoder sees the body of a successful reply, after the status word has
//! been stripped, and must consume it exactly. Short buffers, partial
//! trailing records and leftover bytes are all reported as
//! [`ProtocolError::Malformed`].

use num_bigint::BigUint;
use obelisk_primitives::address::ADDRESS_WIRE_SIZE;
use obelisk_primitives::chainhash::HASH_SIZE;
use obelisk_primitives::{Address, Hash256, PrimitivesError, WireReader};
use serde::{Deserialize, Serialize};

use crate::command::CommandKind;
use crate::error::ProtocolError;
use crate::request::OutPoint;

/// Size of a serialized block header.
pub const HEADER_SIZE: usize = 80;

/// Size of a compressed public key in a stealth row.
pub const EPHEMERAL_KEY_SIZE: usize = 33;

/// Index value marking an output as unspent.
pub const UNSPENT_INDEX: u32 = u32::MAX;

const STEALTH_RECORD_SIZE: usize = EPHEMERAL_KEY_SIZE + ADDRESS_WIRE_SIZE + HASH_SIZE;
const HISTORY_RECORD_SIZE: usize = (HASH_SIZE + 8) + 8 + (HASH_SIZE + 8);

/// Block position of a confirmed transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionIndex {
    /// Height of the containing block.
    pub height: u32,
    /// Position within the block.
    pub index: u32,
}

/// One side of a history row: an output or the input spending it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryPoint {
    /// Transaction hash.
    pub hash: Hash256,
    /// Output or input index.
    pub index: u32,
    /// Confirmation height, `None` while unconfirmed.
    pub height: Option<u32>,
}

/// One row of an address history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// The output paying the address.
    pub output: HistoryPoint,
    /// Value of the output in satoshis.
    #[serde(with = "crate::satoshis")]
    pub value: BigUint,
    /// The spending input, `None` while the output is unspent.
    pub spend: Option<HistoryPoint>,
}

impl HistoryEntry {
    /// Whether the output has not been spent.
    pub fn is_unspent(&self) -> bool {
        self.spend.is_none()
    }
}

/// One match of a stealth scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StealthEntry {
    /// Ephemeral public key published by the sender.
    pub ephemeral_key: [u8; EPHEMERAL_KEY_SIZE],
    /// Recipient address exactly as sent by the server.
    pub raw_address: [u8; ADDRESS_WIRE_SIZE],
    /// Recipient address decoded from `raw_address`.
    pub address: Address,
    /// Hash of the paying transaction.
    pub tx_hash: Hash256,
}

/// The decoded body of a successful reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// A block height.
    Height(u32),
    /// A raw 80-byte block header.
    Header([u8; HEADER_SIZE]),
    /// Transaction hashes of a block, in block order.
    TransactionHashes(Vec<Hash256>),
    /// A raw serialized transaction.
    Transaction(Vec<u8>),
    /// Block position of a transaction.
    TransactionIndex(TransactionIndex),
    /// The input spending an output.
    Spend(OutPoint),
    /// Stealth scan matches.
    Stealth(Vec<StealthEntry>),
    /// Address history rows.
    History(Vec<HistoryEntry>),
    /// Acknowledgement of a subscribe or renew.
    Subscribed,
}

impl Response {
    /// Decode a reply body for `kind`.
    ///
    /// # Arguments
    /// * `kind` - the command the reply answers
    /// * `body` - the reply payload with the status word removed
    pub fn decode(kind: CommandKind, body: &[u8]) -> Result<Self, ProtocolError> {
        let command = kind.name();
        let bad = |e: PrimitivesError| ProtocolError::malformed(command, e);
        let mut r = WireReader::new(body);

        let response = match kind {
            CommandKind::FetchLastHeight | CommandKind::FetchBlockHeight => {
                Response::Height(r.read_u32_le().map_err(bad)?)
            }
            CommandKind::FetchBlockHeader => Response::Header(r.read_array().map_err(bad)?),
            CommandKind::FetchBlockTransactionHashes => {
                expect_records(command, body.len(), HASH_SIZE)?;
                let mut hashes = Vec::with_capacity(body.len() / HASH_SIZE);
                while !r.is_empty() {
                    hashes.push(r.read_hash().map_err(bad)?);
                }
                Response::TransactionHashes(hashes)
            }
            CommandKind::FetchTransaction | CommandKind::FetchPoolTransaction => {
                Response::Transaction(r.read_rest().to_vec())
            }
            CommandKind::FetchTransactionIndex => Response::TransactionIndex(TransactionIndex {
                height: r.read_u32_le().map_err(bad)?,
                index: r.read_u32_le().map_err(bad)?,
            }),
            CommandKind::FetchSpend => Response::Spend(OutPoint {
                hash: r.read_hash().map_err(bad)?,
                index: r.read_u32_le().map_err(bad)?,
            }),
            CommandKind::FetchStealth => {
                expect_records(command, body.len(), STEALTH_RECORD_SIZE)?;
                let mut rows = Vec::with_capacity(body.len() / STEALTH_RECORD_SIZE);
                while !r.is_empty() {
                    rows.push(read_stealth(&mut r).map_err(bad)?);
                }
                Response::Stealth(rows)
            }
            CommandKind::FetchHistory | CommandKind::FetchAddressHistory => {
                expect_records(command, body.len(), HISTORY_RECORD_SIZE)?;
                let mut rows = Vec::with_capacity(body.len() / HISTORY_RECORD_SIZE);
                while !r.is_empty() {
                    rows.push(read_history(&mut r).map_err(bad)?);
                }
                Response::History(rows)
            }
            CommandKind::SubscribeAddress | CommandKind::RenewAddress => Response::Subscribed,
        };

        r.finish().map_err(bad)?;
        Ok(response)
    }
}

fn expect_records(command: &'static str, len: usize, record: usize) -> Result<(), ProtocolError> {
    match len % record {
        0 => Ok(()),
        partial => Err(ProtocolError::malformed(
            command,
            format!("trailing partial record of {} bytes (records are {} bytes)", partial, record),
        )),
    }
}

fn read_stealth(r: &mut WireReader<'_>) -> Result<StealthEntry, PrimitivesError> {
    let ephemeral_key = r.read_array()?;
    let raw_address: [u8; ADDRESS_WIRE_SIZE] = r.read_array()?;
    let address = Address::from_wire(&raw_address)?;
    let tx_hash = r.read_hash()?;
    Ok(StealthEntry { ephemeral_key, raw_address, address, tx_hash })
}

fn read_history(r: &mut WireReader<'_>) -> Result<HistoryEntry, PrimitivesError> {
    let output = read_point(r)?;
    let value = BigUint::from(r.read_u64_le()?);
    let spend = read_point(r)?;
    let spend = (spend.index != UNSPENT_INDEX).then_some(spend);
    Ok(HistoryEntry { output, value, spend })
}

fn read_point(r: &mut WireReader<'_>) -> Result<HistoryPoint, PrimitivesError> {
    let hash = r.read_hash()?;
    let index = r.read_u32_le()?;
    let height = match r.read_u32_le()? {
        0 | u32::MAX => None,
        h => Some(h),
    };
    Ok(HistoryPoint { hash, index, height })
}

#[cfg(test)]
mod tests {
    use super::*;

    // Transactions of block 100000, display order.
    const BLOCK_100000_TXS: [&str; 4] = [
        "8c14f0db3df150123e6f3dbbf30f8b955a8249b62ac1d1ff16284aefa3d06d87",
        "fff2525b8931402dd09222c50775608f75787bd2b87e56995a7bdd30f79702c4",
        "6359f0868171b1d194cbee1af2f16ea598ae8fad666d9b012c8ed2b79a236ec4",
        "e9a66845e05d5abc0ad04ec80f774a7e585c6e8db975962d069a522137b80c1d",
    ];

    fn hash(s: &str) -> Hash256 {
        s.parse().unwrap()
    }

    fn push_point(buf: &mut Vec<u8>, hash: &Hash256, index: u32, height: u32) {
        buf.extend_from_slice(hash.as_wire());
        buf.extend_from_slice(&index.to_le_bytes());
        buf.extend_from_slice(&height.to_le_bytes());
    }

    #[test]
    fn test_decode_height() {
        let body = 290_440u32.to_le_bytes();
        assert_eq!(
            Response::decode(CommandKind::FetchBlockHeight, &body).unwrap(),
            Response::Height(290_440)
        );
    }

    #[test]
    fn test_decode_height_rejects_wrong_length() {
        let short = Response::decode(CommandKind::FetchLastHeight, &[1, 2, 3]);
        assert!(matches!(short, Err(ProtocolError::Malformed { .. })));

        let long = Response::decode(CommandKind::FetchLastHeight, &[1, 2, 3, 4, 5]);
        assert!(matches!(
            long,
            Err(ProtocolError::Malformed { command: "blockchain.fetch_last_height", .. })
        ));
    }

    #[test]
    fn test_decode_header() {
        let body = [7u8; HEADER_SIZE];
        assert_eq!(
            Response::decode(CommandKind::FetchBlockHeader, &body).unwrap(),
            Response::Header(body)
        );
        assert!(Response::decode(CommandKind::FetchBlockHeader, &body[..79]).is_err());
    }

    #[test]
    fn test_decode_block_transaction_hashes() {
        let mut body = Vec::new();
        for tx in BLOCK_100000_TXS {
            body.extend_from_slice(hash(tx).as_wire());
        }
        let Response::TransactionHashes(hashes) =
            Response::decode(CommandKind::FetchBlockTransactionHashes, &body).unwrap()
        else {
            panic!("expected transaction hashes");
        };
        let shown: Vec<String> = hashes.iter().map(|h| h.to_string()).collect();
        assert_eq!(shown, BLOCK_100000_TXS);
    }

    #[test]
    fn test_decode_block_transaction_hashes_partial_record() {
        let mut body = hash(BLOCK_100000_TXS[0]).to_wire().to_vec();
        body.extend_from_slice(&[0u8; 5]);
        let err = Response::decode(CommandKind::FetchBlockTransactionHashes, &body).unwrap_err();
        assert!(matches!(err, ProtocolError::Malformed { .. }));
        assert!(err.to_string().contains("partial record of 5 bytes"));
    }

    #[test]
    fn test_decode_empty_hash_list() {
        assert_eq!(
            Response::decode(CommandKind::FetchBlockTransactionHashes, &[]).unwrap(),
            Response::TransactionHashes(vec![])
        );
    }

    #[test]
    fn test_decode_transaction_takes_rest() {
        let body = [1u8, 0, 0, 0, 0xaa, 0xbb];
        assert_eq!(
            Response::decode(CommandKind::FetchPoolTransaction, &body).unwrap(),
            Response::Transaction(body.to_vec())
        );
    }

    #[test]
    fn test_decode_transaction_index_and_spend() {
        let mut body = 100_000u32.to_le_bytes().to_vec();
        body.extend_from_slice(&3u32.to_le_bytes());
        assert_eq!(
            Response::decode(CommandKind::FetchTransactionIndex, &body).unwrap(),
            Response::TransactionIndex(TransactionIndex { height: 100_000, index: 3 })
        );

        let spender = hash(BLOCK_100000_TXS[1]);
        let mut body = spender.to_wire().to_vec();
        body.extend_from_slice(&2u32.to_le_bytes());
        assert_eq!(
            Response::decode(CommandKind::FetchSpend, &body).unwrap(),
            Response::Spend(OutPoint { hash: spender, index: 2 })
        );
    }

    #[test]
    fn test_decode_history_spent_unspent_unconfirmed() {
        let a = hash(BLOCK_100000_TXS[0]);
        let b = hash(BLOCK_100000_TXS[1]);
        let c = hash(BLOCK_100000_TXS[2]);
        let mut body = Vec::new();

        // spent
        push_point(&mut body, &a, 0, 100_000);
        body.extend_from_slice(&5_000_000_000u64.to_le_bytes());
        push_point(&mut body, &b, 1, 100_010);
        // unspent
        push_point(&mut body, &b, 0, 100_010);
        body.extend_from_slice(&1_000u64.to_le_bytes());
        push_point(&mut body, &Hash256::default(), UNSPENT_INDEX, UNSPENT_INDEX);
        // unconfirmed output
        push_point(&mut body, &c, 2, u32::MAX);
        body.extend_from_slice(&u64::MAX.to_le_bytes());
        push_point(&mut body, &Hash256::default(), UNSPENT_INDEX, UNSPENT_INDEX);

        let Response::History(rows) =
            Response::decode(CommandKind::FetchAddressHistory, &body).unwrap()
        else {
            panic!("expected history");
        };
        assert_eq!(rows.len(), 3);

        assert_eq!(rows[0].output, HistoryPoint { hash: a, index: 0, height: Some(100_000) });
        assert_eq!(rows[0].value, BigUint::from(5_000_000_000u64));
        assert_eq!(rows[0].spend, Some(HistoryPoint { hash: b, index: 1, height: Some(100_010) }));

        assert!(rows[1].is_unspent());
        assert_eq!(rows[1].output.height, Some(100_010));

        assert_eq!(rows[2].output.height, None);
        assert_eq!(rows[2].output.hash, c);
        assert_eq!(rows[2].value, BigUint::from(u64::MAX));
        assert!(rows[2].spend.is_none());
    }

    #[test]
    fn test_decode_history_zero_height_is_unconfirmed() {
        let mut body = Vec::new();
        push_point(&mut body, &hash(BLOCK_100000_TXS[3]), 0, 0);
        body.extend_from_slice(&10u64.to_le_bytes());
        push_point(&mut body, &hash(BLOCK_100000_TXS[2]), 0, 0);

        let Response::History(rows) = Response::decode(CommandKind::FetchHistory, &body).unwrap()
        else {
            panic!("expected history");
        };
        assert_eq!(rows[0].output.height, None);
        assert_eq!(rows[0].spend.unwrap().height, None);
    }

    #[test]
    fn test_history_entry_json() {
        let output = HistoryPoint { hash: hash(BLOCK_100000_TXS[0]), index: 0, height: Some(1) };
        let entry = HistoryEntry {
            output,
            value: BigUint::from(5_000_000_000u64),
            spend: None,
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["value"], "5000000000");
        assert_eq!(json["output"]["hash"], BLOCK_100000_TXS[0]);
        assert!(json["spend"].is_null());

        let back: HistoryEntry = serde_json::from_value(json).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn test_decode_history_partial_record() {
        let body = vec![0u8; HISTORY_RECORD_SIZE + 10];
        assert!(matches!(
            Response::decode(CommandKind::FetchHistory, &body),
            Err(ProtocolError::Malformed { command: "blockchain.fetch_history", .. })
        ));
    }

    #[test]
    fn test_decode_stealth() {
        let address: Address = "1DUhzP41otHNKijH4B6dZN1SRVuYJyYfrp".parse().unwrap();
        let tx = hash(BLOCK_100000_TXS[0]);
        let mut body = vec![0x02; EPHEMERAL_KEY_SIZE];
        body.extend_from_slice(&address.to_wire());
        body.extend_from_slice(tx.as_wire());

        let Response::Stealth(rows) = Response::decode(CommandKind::FetchStealth, &body).unwrap()
        else {
            panic!("expected stealth rows");
        };
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].ephemeral_key, [0x02; EPHEMERAL_KEY_SIZE]);
        assert_eq!(rows[0].raw_address, address.to_wire());
        assert_eq!(rows[0].address, address);
        assert_eq!(rows[0].tx_hash, tx);
    }

    #[test]
    fn test_decode_subscribe_requires_empty_body() {
        assert_eq!(
            Response::decode(CommandKind::SubscribeAddress, &[]).unwrap(),
            Response::Subscribed
        );
        assert!(Response::decode(CommandKind::RenewAddress, &[0]).is_err());
    }
}
