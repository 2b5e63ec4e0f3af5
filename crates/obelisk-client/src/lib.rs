#![deny(missing_docs)]

//! # obelisk-client
//!
//! Async client for Obelisk servers.
//!
//! [`ObeliskClient`] sends typed requests over one request/response
//! connection, correlates replies by id, and manages the heartbeat, block
//! and transaction feeds. Address activity is delivered through
//! [`AddressWatch`] or the raw [`ObeliskClient::address_updates`] stream.
//!
//! The socket layer sits behind the [`Connector`] trait. The `zmq` feature
//! enables [`ZmqConnector`](transport::ZmqConnector); [`MemoryConnector`]
//! runs everything in-process.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use obelisk_client::{ClientConfig, MemoryConnector, ObeliskClient};
//!
//! # async fn example() -> Result<(), obelisk_client::ClientError> {
//! let connector = MemoryConnector::new();
//! let config = ClientConfig::from_env()?;
//! let _router = connector.bind(&config.endpoint)?;
//! let client = ObeliskClient::connect(config, Arc::new(connector))?;
//!
//! let height = client.fetch_last_height().await?;
//! let headers = client.fetch_block_headers(height.saturating_sub(9)..=height, 4).await?;
//! println!("{} headers up to {}", headers.len(), height);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod feeds;
pub mod subscription;
pub mod transport;


pub use client::{BlockHeader, ObeliskClient};
pub use config::ClientConfig;
pub use dispatcher::Dispatcher;
pub use error::ClientError;
pub use feeds::{Feed, FeedManager};
pub use subscription::AddressWatch;
pub use transport::{Connector, DealerLink, FeedLink, MemoryConnector, Multipart};
