/// Unified error type for primitive encoding and decoding.
///
/// Covers hex, hash, integer and address parsing as well as cursor errors
/// raised while reading wire buffers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PrimitivesError {
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("invalid hash: {0}")]
    InvalidHash(String),

    #[error("invalid integer: {0}")]
    InvalidInteger(String),

    #[error("invalid block index: {0}")]
    InvalidBlockIndex(String),

    #[error("invalid bitfield: {0}")]
    InvalidBitfield(String),

    #[error("invalid base58: {0}")]
    InvalidBase58(String),

    #[error("checksum mismatch")]
    ChecksumMismatch,

    #[error("invalid address length: expected {expected}, got {got}")]
    InvalidAddressLength { expected: usize, got: usize },

    #[error("unexpected end of data: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEof { needed: usize, remaining: usize },

    #[error("{0} unexpected trailing bytes")]
    TrailingBytes(usize),
}

impl From<hex::FromHexError> for PrimitivesError {
    fn from(e: hex::FromHexError) -> Self {
        PrimitivesError::InvalidHex(e.to_string())
    }
}
