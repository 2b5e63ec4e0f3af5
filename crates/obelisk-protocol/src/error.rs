//! Error types for encoding requests and decoding replies.

use obelisk_primitives::PrimitivesError;

/// Errors raised by the command table.
///
/// `InvalidArgument` is a caller mistake detected before anything is sent.
/// `Malformed` means the server's bytes did not match the layout of the
/// command, which is a protocol violation and never a named server error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// A request argument failed validation.
    #[error("invalid {argument}: {reason}")]
    InvalidArgument {
        /// Name of the offending argument.
        argument: &'static str,
        /// Why it was rejected.
        reason: String,
    },

    /// A reply or push message did not have the expected layout.
    #[error("malformed {command} message: {reason}")]
    Malformed {
        /// Wire name of the command being decoded.
        command: &'static str,
        /// What was wrong with it.
        reason: String,
    },

    /// Error from the primitives crate.
    #[error("primitives error: {0}")]
    Primitives(#[from] PrimitivesError),
}

impl ProtocolError {
    /// Build an `InvalidArgument` error.
    pub fn invalid(argument: &'static str, reason: impl Into<String>) -> Self {
        ProtocolError::InvalidArgument { argument, reason: reason.into() }
    }

    /// Build a `Malformed` error.
    pub fn malformed(command: &'static str, reason: impl ToString) -> Self {
        ProtocolError::Malformed { command, reason: reason.to_string() }
    }
}
