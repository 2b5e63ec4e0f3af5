//! Digests used on the client side: Base58Check checksums and block or
//! transaction ids.

use sha2::{Digest, Sha256};

use crate::chainhash::Hash256;

/// Single SHA-256 digest.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// SHA-256 applied twice.
pub fn sha256d(data: &[u8]) -> [u8; 32] {
    sha256(&sha256(data))
}

/// Id of a serialized block header or transaction.
///
/// The digest is already in wire order, so the returned hash displays in
/// the usual reversed form.
pub fn double_hash(data: &[u8]) -> Hash256 {
    Hash256::from_wire(sha256d(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_digest_of_abc() {
        assert_eq!(
            hex::encode(sha256(b"abc")),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn double_digest_of_nothing() {
        assert_eq!(
            hex::encode(sha256d(&[])),
            "5df6e0e2761359d30a8275058e299fcc0381534545f55cf43e41983f5d4c9456"
        );
    }

    #[test]
    fn genesis_header_id() {
        let header = hex::decode(concat!(
            "0100000000000000000000000000000000000000000000000000000000000000",
            "000000003ba3edfd7a7b12b27ac72c3e67768f617fc81bc3888a51323a9fb8aa",
            "4b1e5e4a29ab5f49ffff001d1dac2b7c",
        ))
        .unwrap();
        assert_eq!(
            double_hash(&header).to_string(),
            "000000000019d6689c085ae165831e934ff763ae46a2a6c172b3f1b60a8ce26f"
        );
    }
}
