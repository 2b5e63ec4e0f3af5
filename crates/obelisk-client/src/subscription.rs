//! Address subscriptions.
//!
//! The server keeps an address subscription alive only while the client
//! renews it. Activity arrives on the request connection as
//! `address.update` pushes, which the dispatcher broadcasts to every
//! listener.

use std::time::Duration;

use obelisk_primitives::Address;
use obelisk_protocol::{AddressUpdate, Request};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::dispatcher::Dispatcher;
use crate::error::ClientError;

/// Send `address.subscribe`. Success is the absence of a server error.
pub async fn subscribe_address(
    dispatcher: &Dispatcher,
    address: &Address,
) -> Result<(), ClientError> {
    dispatcher.call(&Request::SubscribeAddress { address: *address }).await?;
    info!(address = %address, "address subscribed");
    Ok(())
}

/// Send `address.renew` to extend an existing subscription.
pub async fn renew_address(dispatcher: &Dispatcher, address: &Address) -> Result<(), ClientError> {
    dispatcher.call(&Request::RenewAddress { address: *address }).await?;
    debug!(address = %address, "address renewed");
    Ok(())
}

/// A live subscription to one address.
///
/// Renews itself on a fixed interval until dropped.
pub struct AddressWatch {
    address: Address,
    updates: broadcast::Receiver<AddressUpdate>,
    dispatcher: Dispatcher,
    renewal: JoinHandle<()>,
}

impl AddressWatch {
    /// Subscribe to `address` and start renewing every `renew_every`.
    pub async fn start(
        dispatcher: Dispatcher,
        address: Address,
        renew_every: Duration,
    ) -> Result<Self, ClientError> {
        // Listen before subscribing so that no update can slip past.
        let updates = dispatcher.address_updates();
        subscribe_address(&dispatcher, &address).await?;

        let renewer = dispatcher.clone();
        let renewal = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + renew_every, renew_every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match renew_address(&renewer, &address).await {
                    Ok(()) => {}
                    Err(ClientError::ConnectionLost) => {
                        warn!(address = %address, "connection lost, renewal stopped");
                        return;
                    }
                    Err(e) => warn!(address = %address, error = %e, "renewal failed"),
                }
            }
        });

        Ok(Self { address, updates, dispatcher, renewal })
    }

    /// The watched address.
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Next update for the watched address.
    ///
    /// Updates for other addresses are skipped. Returns `None` once the
    /// request connection is lost.
    pub async fn next(&mut self) -> Option<AddressUpdate> {
        let closed = self.dispatcher.closed();
        tokio::pin!(closed);
        loop {
            let received = tokio::select! {
                biased;
                received = self.updates.recv() => received,
                _ = &mut closed => return None,
            };
            match received {
                Ok(update) if update.address == self.address => return Some(update),
                Ok(_) => continue,
                Err(RecvError::Lagged(missed)) => {
                    warn!(address = %self.address, missed = missed, "address watch lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

impl Drop for AddressWatch {
    fn drop(&mut self) {
        self.renewal.abort();
    }
}
