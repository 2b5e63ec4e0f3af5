//! Feed subscriptions.
//!
//! The server publishes heartbeats, new blocks and new unconfirmed
//! transactions on three separate endpoints. [`FeedManager`] keeps at most
//! one open link per feed and runs a pump task that hands every message to
//! the handler registered with it.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::transport::{Connector, Multipart};

/// Callback invoked with each raw feed message.
pub type FeedHandler = Box<dyn FnMut(Multipart) + Send>;

/// A one-way feed published by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feed {
    /// Liveness counter.
    Heartbeat,
    /// New blocks.
    Blocks,
    /// New unconfirmed transactions.
    Transactions,
}

impl fmt::Display for Feed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Feed::Heartbeat => "heartbeat",
            Feed::Blocks => "blocks",
            Feed::Transactions => "transactions",
        })
    }
}

/// Registry of open feed subscriptions, owned by one client.
pub struct FeedManager {
    connector: Arc<dyn Connector>,
    endpoints: HashMap<Feed, String>,
    active: Mutex<HashMap<Feed, JoinHandle<()>>>,
}

impl FeedManager {
    /// Create an empty registry using the feed endpoints in `config`.
    pub fn new(connector: Arc<dyn Connector>, config: &ClientConfig) -> Self {
        let endpoints = HashMap::from([
            (Feed::Heartbeat, config.heartbeat_endpoint.clone()),
            (Feed::Blocks, config.block_endpoint.clone()),
            (Feed::Transactions, config.transaction_endpoint.clone()),
        ]);
        Self { connector, endpoints, active: Mutex::new(HashMap::new()) }
    }

    /// Endpoint the feed is read from.
    pub fn endpoint(&self, feed: Feed) -> &str {
        self.endpoints.get(&feed).map(String::as_str).unwrap_or_default()
    }

    /// Open `feed` and deliver its messages to `handler`.
    ///
    /// # Returns
    /// `Ok(true)` when a link was opened. `Ok(false)` when the feed was
    /// already open; the new handler is dropped and the existing one keeps
    /// receiving.
    pub fn subscribe(&self, feed: Feed, mut handler: FeedHandler) -> Result<bool, ClientError> {
        let mut active = self
            .active
            .lock()
            .map_err(|_| ClientError::Transport("lock poisoned".into()))?;

        if let Some(pump) = active.get(&feed) {
            if !pump.is_finished() {
                warn!(feed = %feed, "already subscribed, ignoring");
                return Ok(false);
            }
            debug!(feed = %feed, "replacing closed subscription");
        }

        let endpoint = self.endpoint(feed);
        let mut link = self.connector.subscribe(endpoint)?;
        let pump = tokio::spawn(async move {
            while let Some(parts) = link.inbound.recv().await {
                handler(parts);
            }
            debug!(feed = %feed, "feed link closed");
        });
        active.insert(feed, pump);

        info!(feed = %feed, endpoint = endpoint, "subscribed");
        Ok(true)
    }

    /// Close `feed`. Returns false, with a warning, when it was not open.
    pub fn unsubscribe(&self, feed: Feed) -> bool {
        let removed = match self.active.lock() {
            Ok(mut active) => active.remove(&feed),
            Err(_) => None,
        };
        match removed {
            Some(pump) => {
                pump.abort();
                info!(feed = %feed, "unsubscribed");
                true
            }
            None => {
                warn!(feed = %feed, "not subscribed");
                false
            }
        }
    }

    /// Whether a live subscription exists for `feed`.
    pub fn is_subscribed(&self, feed: Feed) -> bool {
        self.active
            .lock()
            .map(|active| active.get(&feed).is_some_and(|pump| !pump.is_finished()))
            .unwrap_or(false)
    }
}

impl Drop for FeedManager {
    fn drop(&mut self) {
        if let Ok(active) = self.active.get_mut() {
            for (_, pump) in active.drain() {
                pump.abort();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MemoryConnector;
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn manager(connector: &MemoryConnector) -> FeedManager {
        FeedManager::new(Arc::new(connector.clone()), &ClientConfig::default())
    }

    #[tokio::test]
    async fn test_subscribe_delivers_messages() {
        let connector = MemoryConnector::new();
        let feeds = manager(&connector);
        let (tx, mut rx) = mpsc::unbounded_channel();

        assert!(feeds.subscribe(Feed::Transactions, Box::new(move |m| {
            let _ = tx.send(m);
        })).unwrap());

        let publisher = connector.publisher(feeds.endpoint(Feed::Transactions));
        assert_eq!(publisher.publish(vec![vec![0xab]]), 1);
        assert_eq!(rx.recv().await.unwrap(), vec![vec![0xab]]);
    }

    #[tokio::test]
    async fn test_second_subscribe_is_ignored() {
        let connector = MemoryConnector::new();
        let feeds = manager(&connector);
        assert!(feeds.subscribe(Feed::Blocks, Box::new(|_| {})).unwrap());
        assert!(!feeds.subscribe(Feed::Blocks, Box::new(|_| {})).unwrap());

        let publisher = connector.publisher(feeds.endpoint(Feed::Blocks));
        assert_eq!(publisher.subscriber_count(), 1);
    }

    #[tokio::test]
    async fn test_unsubscribe_closes_link() {
        let connector = MemoryConnector::new();
        let feeds = manager(&connector);
        feeds.subscribe(Feed::Heartbeat, Box::new(|_| {})).unwrap();
        assert!(feeds.is_subscribed(Feed::Heartbeat));

        assert!(feeds.unsubscribe(Feed::Heartbeat));
        assert!(!feeds.is_subscribed(Feed::Heartbeat));

        // The aborted pump drops its link shortly after.
        let publisher = connector.publisher(feeds.endpoint(Feed::Heartbeat));
        for _ in 0..50 {
            if publisher.subscriber_count() == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(publisher.publish(vec![vec![1, 0, 0, 0]]), 0);
    }

    #[tokio::test]
    async fn test_unsubscribe_twice() {
        let connector = MemoryConnector::new();
        let feeds = manager(&connector);
        assert!(!feeds.unsubscribe(Feed::Blocks));
        feeds.subscribe(Feed::Blocks, Box::new(|_| {})).unwrap();
        assert!(feeds.unsubscribe(Feed::Blocks));
        assert!(!feeds.unsubscribe(Feed::Blocks));
    }
}
