//! Transport seam between the client and the message bus.
//!
//! The client needs two primitives: a bidirectional multipart link for
//! requests and replies, and a receive-only multipart link for feeds. Both
//! are plain tokio channels, so everything above this module is independent
//! of the socket library.

use tokio::sync::mpsc;

use crate::error::ClientError;

pub mod memory;
#[cfg(feature = "zmq")]
pub mod zeromq;

pub use memory::{MemoryConnector, MemoryPeer, MemoryPublisher, MemoryRouter};
#[cfg(feature = "zmq")]
pub use zeromq::ZmqConnector;

/// One message: an ordered list of frame parts.
pub type Multipart = Vec<Vec<u8>>;

/// A request/response link.
///
/// When the peer goes away `inbound` yields `None`.
#[derive(Debug)]
pub struct DealerLink {
    /// Messages to the server.
    pub outbound: mpsc::UnboundedSender<Multipart>,
    /// Messages from the server.
    pub inbound: mpsc::UnboundedReceiver<Multipart>,
}

/// A receive-only feed link. Dropping it closes the subscription.
#[derive(Debug)]
pub struct FeedLink {
    /// Messages published on the feed.
    pub inbound: mpsc::UnboundedReceiver<Multipart>,
}

/// Opens links to named endpoints.
pub trait Connector: Send + Sync {
    /// Open a request/response link to `endpoint`.
    fn connect(&self, endpoint: &str) -> Result<DealerLink, ClientError>;

    /// Subscribe to every message published on `endpoint`.
    fn subscribe(&self, endpoint: &str) -> Result<FeedLink, ClientError>;
}
