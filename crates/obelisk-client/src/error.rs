//! Error types for client operations.

use obelisk_protocol::{ObeliskError, ProtocolError};

/// Errors that can occur when talking to an Obelisk server.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    /// A request argument was rejected before anything was sent.
    #[error("invalid {argument}: {reason}")]
    InvalidArgument {
        /// Name of the offending argument.
        argument: &'static str,
        /// Why it was rejected.
        reason: String,
    },

    /// The server answered with a nonzero status.
    #[error("server error: {0}")]
    Remote(#[from] ObeliskError),

    /// The server's reply could not be decoded.
    #[error("protocol error: {0}")]
    Protocol(ProtocolError),

    /// The connection closed before the reply arrived.
    #[error("connection lost")]
    ConnectionLost,

    /// No reply arrived within the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// The transport could not be set up.
    #[error("transport error: {0}")]
    Transport(String),

    /// A configuration value could not be parsed.
    #[error("config error: {0}")]
    Config(String),
}

impl From<ProtocolError> for ClientError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::InvalidArgument { argument, reason } => {
                ClientError::InvalidArgument { argument, reason }
            }
            other => ClientError::Protocol(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use obelisk_protocol::ErrorCode;

    #[test]
    fn test_invalid_argument_is_lifted() {
        let err: ClientError =
            ProtocolError::invalid("number of bits", "40 is outside 0..=32").into();
        assert_eq!(
            err,
            ClientError::InvalidArgument {
                argument: "number of bits",
                reason: "40 is outside 0..=32".to_string(),
            }
        );
    }

    #[test]
    fn test_malformed_stays_protocol() {
        let err: ClientError =
            ProtocolError::malformed("blockchain.fetch_last_height", "short").into();
        assert!(matches!(err, ClientError::Protocol(ProtocolError::Malformed { .. })));
    }

    #[test]
    fn test_remote_display() {
        let err = ClientError::from(ObeliskError::from(ErrorCode::NotFound));
        assert_eq!(err.to_string(), "server error: not_found (code 3)");
    }
}
