//! Async client for the Obelisk query and notification API.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt, TryStreamExt};
use obelisk_primitives::{Address, Bitfield, BlockIndex, Hash256};
use obelisk_protocol::response::HEADER_SIZE;
use obelisk_protocol::notification::transaction_from_parts;
use obelisk_protocol::{
    AddressUpdate, Balance, BlockNotification, CommandKind, Heartbeat, HistoryEntry, OutPoint,
    ProtocolError, Request, Response, StealthEntry, TransactionIndex,
};
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::config::ClientConfig;
use crate::dispatcher::Dispatcher;
use crate::error::ClientError;
use crate::feeds::{Feed, FeedManager};
use crate::subscription::{self, AddressWatch};
use crate::transport::Connector;

/// A raw block header.
pub type BlockHeader = [u8; HEADER_SIZE];

/// Unwrap the expected response variant. The decoder picks the variant
/// from the command kind, so a mismatch is a protocol violation.
macro_rules! expect_response {
    ($response:expr, $kind:expr, $variant:ident) => {
        match $response {
            Response::$variant(value) => Ok(value),
            other => Err(unexpected($kind, &other)),
        }
    };
}

fn unexpected(kind: CommandKind, response: &Response) -> ClientError {
    ClientError::Protocol(ProtocolError::malformed(
        kind.name(),
        format!("unexpected response {:?}", response),
    ))
}

/// Client for one Obelisk server.
///
/// Owns the request connection (through a [`Dispatcher`] task) and the
/// registry of feed subscriptions. Must be created inside a tokio runtime.
pub struct ObeliskClient {
    config: ClientConfig,
    dispatcher: Dispatcher,
    feeds: FeedManager,
}

impl ObeliskClient {
    /// Connect to the endpoints in `config` through `connector`.
    ///
    /// Only the request connection is opened here; feeds are opened on
    /// first subscribe.
    pub fn connect(
        config: ClientConfig,
        connector: Arc<dyn Connector>,
    ) -> Result<Self, ClientError> {
        let link = connector.connect(&config.endpoint)?;
        let dispatcher = Dispatcher::spawn(link, config.request_timeout);
        let feeds = FeedManager::new(connector, &config);
        info!(endpoint = %config.endpoint, "connected");
        Ok(Self { config, dispatcher, feeds })
    }

    /// Connect over ZeroMQ.
    #[cfg(feature = "zmq")]
    pub fn connect_zmq(config: ClientConfig) -> Result<Self, ClientError> {
        Self::connect(config, Arc::new(crate::transport::ZmqConnector::new()))
    }

    /// The configuration this client was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Whether the request connection is still up.
    pub fn is_connected(&self) -> bool {
        self.dispatcher.is_connected()
    }

    /// Send any request and return its decoded reply.
    pub async fn call(&self, request: Request) -> Result<Response, ClientError> {
        self.dispatcher.call(&request).await
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Height of the last block in the chain.
    pub async fn fetch_last_height(&self) -> Result<u32, ClientError> {
        let response = self.call(Request::FetchLastHeight).await?;
        expect_response!(response, CommandKind::FetchLastHeight, Height)
    }

    /// Height of the block with the given hash.
    pub async fn fetch_block_height(&self, hash: Hash256) -> Result<u32, ClientError> {
        let response = self.call(Request::FetchBlockHeight { hash }).await?;
        expect_response!(response, CommandKind::FetchBlockHeight, Height)
    }

    /// Header of a block given its height or hash.
    pub async fn fetch_block_header(
        &self,
        index: impl Into<BlockIndex>,
    ) -> Result<BlockHeader, ClientError> {
        let response = self.call(Request::FetchBlockHeader { index: index.into() }).await?;
        expect_response!(response, CommandKind::FetchBlockHeader, Header)
    }

    /// Transaction hashes of a block, in block order.
    pub async fn fetch_block_transaction_hashes(
        &self,
        index: impl Into<BlockIndex>,
    ) -> Result<Vec<Hash256>, ClientError> {
        let request = Request::FetchBlockTransactionHashes { index: index.into() };
        let response = self.call(request).await?;
        expect_response!(response, CommandKind::FetchBlockTransactionHashes, TransactionHashes)
    }

    /// A raw transaction. With `unconfirmed` set the memory pool is queried
    /// instead of the chain.
    pub async fn fetch_transaction(
        &self,
        hash: Hash256,
        unconfirmed: bool,
    ) -> Result<Vec<u8>, ClientError> {
        let request = if unconfirmed {
            Request::FetchPoolTransaction { hash }
        } else {
            Request::FetchTransaction { hash }
        };
        let kind = request.kind();
        let response = self.call(request).await?;
        expect_response!(response, kind, Transaction)
    }

    /// Height and block position of a confirmed transaction.
    pub async fn fetch_transaction_index(
        &self,
        hash: Hash256,
    ) -> Result<TransactionIndex, ClientError> {
        let response = self.call(Request::FetchTransactionIndex { hash }).await?;
        expect_response!(response, CommandKind::FetchTransactionIndex, TransactionIndex)
    }

    /// The input that spends `outpoint`.
    pub async fn fetch_spend(&self, outpoint: OutPoint) -> Result<OutPoint, ClientError> {
        let response = self.call(Request::FetchSpend { outpoint }).await?;
        expect_response!(response, CommandKind::FetchSpend, Spend)
    }

    /// Stealth payments whose prefix matches the first `nbits` of `bitfield`.
    pub async fn fetch_stealth(
        &self,
        nbits: u8,
        bitfield: Bitfield,
        from_height: u32,
    ) -> Result<Vec<StealthEntry>, ClientError> {
        let response = self.call(Request::FetchStealth { nbits, bitfield, from_height }).await?;
        expect_response!(response, CommandKind::FetchStealth, Stealth)
    }

    /// History of an address from `from_height`. With `unconfirmed` set,
    /// memory pool transactions are included.
    pub async fn fetch_history(
        &self,
        address: Address,
        from_height: u32,
        unconfirmed: bool,
    ) -> Result<Vec<HistoryEntry>, ClientError> {
        let request = if unconfirmed {
            Request::FetchAddressHistory { address, from_height }
        } else {
            Request::FetchHistory { address, from_height }
        };
        let kind = request.kind();
        let response = self.call(request).await?;
        expect_response!(response, kind, History)
    }

    /// Headers for `heights`, at most `concurrency` requests in flight.
    ///
    /// Results come back in the order of `heights` regardless of the order
    /// the replies arrive in. The first failure aborts the batch.
    pub async fn fetch_block_headers<I>(
        &self,
        heights: I,
        concurrency: usize,
    ) -> Result<Vec<(u32, BlockHeader)>, ClientError>
    where
        I: IntoIterator<Item = u32>,
    {
        stream::iter(heights)
            .map(|height| async move {
                self.fetch_block_header(height).await.map(|header| (height, header))
            })
            .buffered(concurrency.max(1))
            .try_collect()
            .await
    }

    /// The last `limit` headers of the chain, oldest first.
    pub async fn fetch_recent_headers(
        &self,
        limit: u32,
        concurrency: usize,
    ) -> Result<Vec<(u32, BlockHeader)>, ClientError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let tip = self.fetch_last_height().await?;
        let first = tip.saturating_sub(limit - 1);
        self.fetch_block_headers(first..=tip, concurrency).await
    }

    /// Balance of an address, counting memory pool transactions.
    pub async fn fetch_balance(&self, address: Address) -> Result<Balance, ClientError> {
        let history = self.fetch_history(address, 0, true).await?;
        Ok(Balance::from_history(&history))
    }

    // -----------------------------------------------------------------------
    // Address subscriptions
    // -----------------------------------------------------------------------

    /// Ask the server to push activity for `address`.
    pub async fn subscribe_address(&self, address: Address) -> Result<(), ClientError> {
        subscription::subscribe_address(&self.dispatcher, &address).await
    }

    /// Extend the subscription for `address`.
    pub async fn renew_address(&self, address: Address) -> Result<(), ClientError> {
        subscription::renew_address(&self.dispatcher, &address).await
    }

    /// Subscribe to `address` and keep renewing at the configured interval.
    pub async fn watch_address(&self, address: Address) -> Result<AddressWatch, ClientError> {
        self.watch_address_every(address, self.config.renew_interval).await
    }

    /// Subscribe to `address` and renew every `renew_every`.
    pub async fn watch_address_every(
        &self,
        address: Address,
        renew_every: Duration,
    ) -> Result<AddressWatch, ClientError> {
        AddressWatch::start(self.dispatcher.clone(), address, renew_every).await
    }

    /// Every address update pushed on this connection, for all addresses.
    pub fn address_updates(&self) -> broadcast::Receiver<AddressUpdate> {
        self.dispatcher.address_updates()
    }

    // -----------------------------------------------------------------------
    // Feeds
    // -----------------------------------------------------------------------

    /// Receive new blocks. Returns false if the feed was already open.
    pub fn subscribe_blocks<F>(&self, mut handler: F) -> Result<bool, ClientError>
    where
        F: FnMut(BlockNotification) + Send + 'static,
    {
        self.feeds.subscribe(
            Feed::Blocks,
            Box::new(move |parts| match BlockNotification::from_parts(&parts) {
                Ok(block) => handler(block),
                Err(e) => warn!(error = %e, "dropping malformed block message"),
            }),
        )
    }

    /// Stop receiving blocks.
    pub fn unsubscribe_blocks(&self) -> bool {
        self.feeds.unsubscribe(Feed::Blocks)
    }

    /// Receive new unconfirmed transactions. Returns false if the feed was
    /// already open.
    pub fn subscribe_transactions<F>(&self, mut handler: F) -> Result<bool, ClientError>
    where
        F: FnMut(Vec<u8>) + Send + 'static,
    {
        self.feeds.subscribe(
            Feed::Transactions,
            Box::new(move |parts| match transaction_from_parts(&parts) {
                Ok(tx) => handler(tx),
                Err(e) => warn!(error = %e, "dropping malformed transaction message"),
            }),
        )
    }

    /// Stop receiving transactions.
    pub fn unsubscribe_transactions(&self) -> bool {
        self.feeds.unsubscribe(Feed::Transactions)
    }

    /// Receive heartbeats. Returns false if the feed was already open.
    pub fn subscribe_heartbeat<F>(&self, mut handler: F) -> Result<bool, ClientError>
    where
        F: FnMut(Heartbeat) + Send + 'static,
    {
        self.feeds.subscribe(
            Feed::Heartbeat,
            Box::new(move |parts| match Heartbeat::from_parts(&parts) {
                Ok(beat) => handler(beat),
                Err(e) => warn!(error = %e, "dropping malformed heartbeat"),
            }),
        )
    }

    /// Stop receiving heartbeats.
    pub fn unsubscribe_heartbeat(&self) -> bool {
        self.feeds.unsubscribe(Feed::Heartbeat)
    }
}
