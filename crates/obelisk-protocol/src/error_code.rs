//! Server error codes.
//!
//! A reply whose leading status word is nonzero carries one of these codes.
//! The table is fixed by the server and starts at 1; zero means success.

use std::fmt;

macro_rules! error_codes {
    ($( $code:literal => $variant:ident, $name:literal; )+) => {
        /// A named error reported by the server.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u32)]
        pub enum ErrorCode {
            $(
                #[doc = concat!("`", $name, "` (code ", stringify!($code), ")")]
                $variant = $code,
            )+
        }

        impl ErrorCode {
            /// Every code, in table order.
            pub const ALL: &'static [ErrorCode] = &[$(ErrorCode::$variant),+];

            /// Look up a code. Returns `None` for 0 and for codes past the table.
            pub fn from_code(code: u32) -> Option<Self> {
                match code {
                    $($code => Some(ErrorCode::$variant),)+
                    _ => None,
                }
            }

            /// The snake_case name the server uses.
            pub fn name(&self) -> &'static str {
                match self {
                    $(ErrorCode::$variant => $name,)+
                }
            }
        }
    };
}

error_codes! {
    1 => ServiceStopped, "service_stopped";
    2 => OperationFailed, "operation_failed";
    // blockchain
    3 => NotFound, "not_found";
    4 => Duplicate, "duplicate";
    5 => UnspentOutput, "unspent_output";
    6 => UnsupportedPaymentType, "unsupported_payment_type";
    // network
    7 => ResolveFailed, "resolve_failed";
    8 => NetworkUnreachable, "network_unreachable";
    9 => AddressInUse, "address_in_use";
    10 => ListenFailed, "listen_failed";
    11 => AcceptFailed, "accept_failed";
    12 => BadStream, "bad_stream";
    13 => ChannelTimeout, "channel_timeout";
    // transaction pool
    14 => BlockchainReorganized, "blockchain_reorganized";
    15 => PoolFilled, "pool_filled";
    // transaction validation
    16 => CoinbaseTransaction, "coinbase_transaction";
    17 => IsNotStandard, "is_not_standard";
    18 => DoubleSpend, "double_spend";
    19 => InputNotFound, "input_not_found";
    20 => EmptyTransaction, "empty_transaction";
    21 => OutputValueOverflow, "output_value_overflow";
    22 => InvalidCoinbaseScriptSize, "invalid_coinbase_script_size";
    23 => PreviousOutputNull, "previous_output_null";
    // block validation
    24 => PreviousBlockInvalid, "previous_block_invalid";
    25 => SizeLimits, "size_limits";
    26 => ProofOfWork, "proof_of_work";
    27 => FuturisticTimestamp, "futuristic_timestamp";
    28 => FirstNotCoinbase, "first_not_coinbase";
    29 => ExtraCoinbases, "extra_coinbases";
    30 => TooManySigs, "too_many_sigs";
    31 => MerkleMismatch, "merkle_mismatch";
    32 => IncorrectProofOfWork, "incorrect_proof_of_work";
    33 => TimestampTooEarly, "timestamp_too_early";
    34 => NonFinalTransaction, "non_final_transaction";
    35 => CheckpointsFailed, "checkpoints_failed";
    36 => OldVersionBlock, "old_version_block";
    37 => CoinbaseHeightMismatch, "coinbase_height_mismatch";
    38 => DuplicateOrSpent, "duplicate_or_spent";
    39 => ValidateInputsFailed, "validate_inputs_failed";
    40 => FeesOutOfRange, "fees_out_of_range";
    41 => CoinbaseTooLarge, "coinbase_too_large";
}

impl ErrorCode {
    /// The numeric code.
    pub fn code(&self) -> u32 {
        *self as u32
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A nonzero status returned by the server.
///
/// Keeps the raw code so that codes newer than this table still reach the
/// caller intact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObeliskError {
    /// The raw status word.
    pub code: u32,
    /// The named kind, when the code is in the table.
    pub kind: Option<ErrorCode>,
}

impl ObeliskError {
    /// Build from a raw status word.
    pub fn from_code(code: u32) -> Self {
        ObeliskError { code, kind: ErrorCode::from_code(code) }
    }

    /// The server's name for this error, or `"unknown"`.
    pub fn name(&self) -> &'static str {
        self.kind.map(|k| k.name()).unwrap_or("unknown")
    }
}

impl fmt::Display for ObeliskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.name(), self.code)
    }
}

impl std::error::Error for ObeliskError {}

impl From<ErrorCode> for ObeliskError {
    fn from(kind: ErrorCode) -> Self {
        ObeliskError { code: kind.code(), kind: Some(kind) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_dense_from_one() {
        assert_eq!(ErrorCode::ALL.len(), 41);
        for (i, kind) in ErrorCode::ALL.iter().enumerate() {
            assert_eq!(kind.code(), i as u32 + 1);
            assert_eq!(ErrorCode::from_code(kind.code()), Some(*kind));
        }
    }

    #[test]
    fn test_known_names() {
        assert_eq!(ErrorCode::from_code(1).unwrap().name(), "service_stopped");
        assert_eq!(ErrorCode::from_code(3).unwrap().name(), "not_found");
        assert_eq!(ErrorCode::from_code(18).unwrap().name(), "double_spend");
        assert_eq!(ErrorCode::from_code(41).unwrap().name(), "coinbase_too_large");
    }

    #[test]
    fn test_out_of_table() {
        assert_eq!(ErrorCode::from_code(0), None);
        assert_eq!(ErrorCode::from_code(42), None);

        let err = ObeliskError::from_code(99);
        assert_eq!(err.code, 99);
        assert_eq!(err.kind, None);
        assert_eq!(err.to_string(), "unknown (code 99)");
    }

    #[test]
    fn test_obelisk_error_display() {
        let err = ObeliskError::from_code(3);
        assert_eq!(err.kind, Some(ErrorCode::NotFound));
        assert_eq!(err.to_string(), "not_found (code 3)");
        assert_eq!(ObeliskError::from(ErrorCode::NotFound), err);
    }
}
