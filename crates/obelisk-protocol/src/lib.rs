#![deny(missing_docs)]

//! # obelisk-protocol
//!
//! The command table of the Obelisk request/response protocol.
//!
//! Every remote command is a variant of [`CommandKind`]. A [`Request`]
//! carries the typed arguments of one command and encodes them into a
//! payload; [`Response::decode`] turns the body of a successful reply back
//! into a typed value. Server error codes are mapped by [`ErrorCode`].
//!
//! Push messages that do not answer a request (address activity, new
//! blocks, new transactions, heartbeats) are decoded by the types in
//! [`notification`].
//!
//! # Example
//!
//! ```
//! use obelisk_protocol::{CommandKind, Request, Response};
//!
//! let request = Request::FetchLastHeight;
//! assert_eq!(request.kind(), CommandKind::FetchLastHeight);
//! assert!(request.encode().unwrap().is_empty());
//!
//! let body = 290_440u32.to_le_bytes();
//! let response = Response::decode(CommandKind::FetchLastHeight, &body).unwrap();
//! assert_eq!(response, Response::Height(290_440));
//! ```

pub mod balance;
pub mod command;
pub mod error;
pub mod error_code;
pub mod notification;
pub mod request;
pub mod response;
mod satoshis;

pub use balance::Balance;
pub use command::CommandKind;
pub use error::ProtocolError;
pub use error_code::{ErrorCode, ObeliskError};
pub use notification::{AddressUpdate, BlockNotification, Heartbeat};
pub use request::{OutPoint, Request};
pub use response::{HistoryEntry, HistoryPoint, Response, StealthEntry, TransactionIndex};
