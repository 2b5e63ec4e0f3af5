//! In-process transport.
//!
//! `MemoryConnector` keeps a registry of routers and publishers keyed by
//! endpoint name. A server side binds a [`MemoryRouter`] and accepts one
//! [`MemoryPeer`] per client connection; feeds are driven through a
//! [`MemoryPublisher`] that fans each message out to every live subscriber.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tracing::debug;

use super::{Connector, DealerLink, FeedLink, Multipart};
use crate::error::ClientError;

#[derive(Default)]
struct Registry {
    routers: HashMap<String, mpsc::UnboundedSender<MemoryPeer>>,
    feeds: HashMap<String, Vec<mpsc::UnboundedSender<Multipart>>>,
}

/// A [`Connector`] whose endpoints live in this process.
#[derive(Clone, Default)]
pub struct MemoryConnector {
    registry: Arc<Mutex<Registry>>,
}

impl MemoryConnector {
    /// Create an empty connector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Listen for request/response connections on `endpoint`.
    ///
    /// Binding an endpoint twice replaces the earlier router.
    pub fn bind(&self, endpoint: &str) -> Result<MemoryRouter, ClientError> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.registry
            .lock()
            .map_err(|_| ClientError::Transport("lock poisoned".into()))?
            .routers
            .insert(endpoint.to_string(), tx);
        Ok(MemoryRouter { accept: rx })
    }

    /// A handle for publishing on `endpoint`.
    pub fn publisher(&self, endpoint: &str) -> MemoryPublisher {
        MemoryPublisher { registry: Arc::clone(&self.registry), endpoint: endpoint.to_string() }
    }
}

impl Connector for MemoryConnector {
    fn connect(&self, endpoint: &str) -> Result<DealerLink, ClientError> {
        let registry = self
            .registry
            .lock()
            .map_err(|_| ClientError::Transport("lock poisoned".into()))?;
        let router = registry
            .routers
            .get(endpoint)
            .ok_or_else(|| ClientError::Transport(format!("nothing bound at {}", endpoint)))?;

        let (to_server, from_client) = mpsc::unbounded_channel();
        let (to_client, from_server) = mpsc::unbounded_channel();
        router
            .send(MemoryPeer { inbound: from_client, outbound: to_client })
            .map_err(|_| ClientError::Transport(format!("router at {} is closed", endpoint)))?;

        debug!(endpoint = endpoint, "memory link connected");
        Ok(DealerLink { outbound: to_server, inbound: from_server })
    }

    fn subscribe(&self, endpoint: &str) -> Result<FeedLink, ClientError> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.registry
            .lock()
            .map_err(|_| ClientError::Transport("lock poisoned".into()))?
            .feeds
            .entry(endpoint.to_string())
            .or_default()
            .push(tx);
        Ok(FeedLink { inbound: rx })
    }
}

/// Server side of a bound endpoint.
pub struct MemoryRouter {
    accept: mpsc::UnboundedReceiver<MemoryPeer>,
}

impl MemoryRouter {
    /// Wait for the next client connection.
    pub async fn accept(&mut self) -> Option<MemoryPeer> {
        self.accept.recv().await
    }
}

/// Server side of one client connection. Dropping it disconnects the client.
pub struct MemoryPeer {
    inbound: mpsc::UnboundedReceiver<Multipart>,
    outbound: mpsc::UnboundedSender<Multipart>,
}

impl MemoryPeer {
    /// Next message sent by the client.
    pub async fn recv(&mut self) -> Option<Multipart> {
        self.inbound.recv().await
    }

    /// Send a message to the client. Returns false once the client is gone.
    pub fn send(&self, parts: Multipart) -> bool {
        self.outbound.send(parts).is_ok()
    }
}

/// Publishing handle for one feed endpoint.
#[derive(Clone)]
pub struct MemoryPublisher {
    registry: Arc<Mutex<Registry>>,
    endpoint: String,
}

impl MemoryPublisher {
    /// Deliver `parts` to every subscriber of the endpoint.
    ///
    /// Subscribers whose link was dropped are pruned. Returns how many
    /// subscribers received the message.
    pub fn publish(&self, parts: Multipart) -> usize {
        let Ok(mut registry) = self.registry.lock() else {
            return 0;
        };
        let Some(subscribers) = registry.feeds.get_mut(&self.endpoint) else {
            return 0;
        };
        subscribers.retain(|tx| tx.send(parts.clone()).is_ok());
        subscribers.len()
    }

    /// Number of subscribers that have not been dropped yet.
    pub fn subscriber_count(&self) -> usize {
        let Ok(registry) = self.registry.lock() else {
            return 0;
        };
        registry
            .feeds
            .get(&self.endpoint)
            .map(|subs| subs.iter().filter(|tx| !tx.is_closed()).count())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_requires_router() {
        let connector = MemoryConnector::new();
        assert!(matches!(
            connector.connect("mem://nowhere"),
            Err(ClientError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn test_request_reply_roundtrip() {
        let connector = MemoryConnector::new();
        let mut router = connector.bind("mem://api").unwrap();
        let mut link = connector.connect("mem://api").unwrap();
        let mut peer = router.accept().await.unwrap();

        link.outbound.send(vec![b"ping".to_vec()]).unwrap();
        assert_eq!(peer.recv().await.unwrap(), vec![b"ping".to_vec()]);

        assert!(peer.send(vec![b"pong".to_vec()]));
        assert_eq!(link.inbound.recv().await.unwrap(), vec![b"pong".to_vec()]);

        drop(peer);
        assert!(link.inbound.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_publish_fans_out_and_prunes() {
        let connector = MemoryConnector::new();
        let publisher = connector.publisher("mem://blocks");
        assert_eq!(publisher.publish(vec![vec![1]]), 0);

        let mut first = connector.subscribe("mem://blocks").unwrap();
        let second = connector.subscribe("mem://blocks").unwrap();
        assert_eq!(publisher.subscriber_count(), 2);

        drop(second);
        assert_eq!(publisher.subscriber_count(), 1);
        assert_eq!(publisher.publish(vec![vec![2]]), 1);
        assert_eq!(first.inbound.recv().await.unwrap(), vec![vec![2]]);
    }
}
