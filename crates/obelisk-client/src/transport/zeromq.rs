//! ZeroMQ transport.
//!
//! Requests go over a DEALER socket, feeds over SUB sockets subscribed to
//! every topic. ZeroMQ sockets are not safe to share between threads, so
//! each socket is owned by a dedicated I/O thread that bridges it to the
//! tokio channels of a [`DealerLink`] or [`FeedLink`].

use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use tokio::sync::mpsc;
use tracing::{debug, error};

use super::{Connector, DealerLink, FeedLink, Multipart};
use crate::error::ClientError;

/// How often an idle feed thread checks whether its receiver was dropped.
/// Messages are delivered as soon as they arrive regardless.
const FEED_CLOSE_CHECK_MS: i64 = 250;

static OUTBOUND_QUEUE_ID: AtomicUsize = AtomicUsize::new(0);

/// A [`Connector`] backed by `libzmq`.
#[derive(Clone)]
pub struct ZmqConnector {
    context: zmq::Context,
}

impl ZmqConnector {
    /// Create a connector with its own ZeroMQ context.
    pub fn new() -> Self {
        Self { context: zmq::Context::new() }
    }
}

impl Default for ZmqConnector {
    fn default() -> Self {
        Self::new()
    }
}

fn transport_err(endpoint: &str, err: zmq::Error) -> ClientError {
    ClientError::Transport(format!("{}: {}", endpoint, err))
}

impl Connector for ZmqConnector {
    fn connect(&self, endpoint: &str) -> Result<DealerLink, ClientError> {
        let err = |e| transport_err(endpoint, e);
        let socket = self.context.socket(zmq::DEALER).map_err(err)?;
        socket.set_linger(0).map_err(err)?;
        socket.connect(endpoint).map_err(err)?;

        // Outbound frames reach the dealer thread through an inproc pair, so
        // the thread can block in one poll on both directions.
        let queue_addr = format!(
            "inproc://obelisk-outbound-{}",
            OUTBOUND_QUEUE_ID.fetch_add(1, Ordering::Relaxed)
        );
        let queue = self.context.socket(zmq::PAIR).map_err(err)?;
        queue.bind(&queue_addr).map_err(err)?;
        let feeder = self.context.socket(zmq::PAIR).map_err(err)?;
        feeder.connect(&queue_addr).map_err(err)?;

        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (in_tx, in_rx) = mpsc::unbounded_channel();
        let name = endpoint.to_string();
        thread::Builder::new()
            .name("obelisk-dealer".into())
            .spawn(move || dealer_loop(socket, queue, in_tx, name))
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        let name = endpoint.to_string();
        thread::Builder::new()
            .name("obelisk-outbound".into())
            .spawn(move || outbound_loop(feeder, out_rx, name))
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        debug!(endpoint = endpoint, "dealer connected");
        Ok(DealerLink { outbound: out_tx, inbound: in_rx })
    }

    fn subscribe(&self, endpoint: &str) -> Result<FeedLink, ClientError> {
        let err = |e| transport_err(endpoint, e);
        let socket = self.context.socket(zmq::SUB).map_err(err)?;
        socket.set_linger(0).map_err(err)?;
        socket.set_subscribe(b"").map_err(err)?;
        socket.connect(endpoint).map_err(err)?;

        let (tx, rx) = mpsc::unbounded_channel();
        let name = endpoint.to_string();
        thread::Builder::new()
            .name("obelisk-feed".into())
            .spawn(move || feed_loop(socket, tx, name))
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        debug!(endpoint = endpoint, "feed subscribed");
        Ok(FeedLink { inbound: rx })
    }
}

/// A single empty part. Requests always carry three parts, so this never
/// collides with a real frame.
fn is_close_marker(parts: &Multipart) -> bool {
    matches!(parts.as_slice(), [only] if only.is_empty())
}

/// Moves frames from the client channel onto the inproc queue, then sends
/// the close marker once the client drops its sender.
fn outbound_loop(
    feeder: zmq::Socket,
    mut out_rx: mpsc::UnboundedReceiver<Multipart>,
    endpoint: String,
) {
    while let Some(parts) = out_rx.blocking_recv() {
        if let Err(e) = feeder.send_multipart(parts, 0) {
            error!(endpoint = %endpoint, error = %e, "outbound queue send failed");
            break;
        }
    }
    if let Err(e) = feeder.send(zmq::Message::new(), 0) {
        error!(endpoint = %endpoint, error = %e, "outbound queue close failed");
    }
}

/// Runs until the close marker arrives or the socket fails. Returning
/// drops `in_tx`, which the dispatcher sees as a lost connection.
fn dealer_loop(
    socket: zmq::Socket,
    queue: zmq::Socket,
    in_tx: mpsc::UnboundedSender<Multipart>,
    endpoint: String,
) {
    loop {
        let mut items = [socket.as_poll_item(zmq::POLLIN), queue.as_poll_item(zmq::POLLIN)];
        if let Err(e) = zmq::poll(&mut items, -1) {
            error!(endpoint = %endpoint, error = %e, "dealer poll failed");
            return;
        }

        if items[1].is_readable() {
            match queue.recv_multipart(0) {
                Ok(parts) if is_close_marker(&parts) => return,
                Ok(parts) => {
                    if let Err(e) = socket.send_multipart(parts, 0) {
                        error!(endpoint = %endpoint, error = %e, "dealer send failed");
                        return;
                    }
                }
                Err(e) => {
                    error!(endpoint = %endpoint, error = %e, "outbound queue receive failed");
                    return;
                }
            }
        }

        if items[0].is_readable() {
            match socket.recv_multipart(0) {
                Ok(parts) => {
                    if in_tx.send(parts).is_err() {
                        return;
                    }
                }
                Err(e) => {
                    error!(endpoint = %endpoint, error = %e, "dealer receive failed");
                    return;
                }
            }
        }
    }
}

fn feed_loop(socket: zmq::Socket, tx: mpsc::UnboundedSender<Multipart>, endpoint: String) {
    while !tx.is_closed() {
        match socket.poll(zmq::POLLIN, FEED_CLOSE_CHECK_MS) {
            Ok(0) => continue,
            Ok(_) => match socket.recv_multipart(0) {
                Ok(parts) => {
                    if tx.send(parts).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    error!(endpoint = %endpoint, error = %e, "feed receive failed");
                    break;
                }
            },
            Err(e) => {
                error!(endpoint = %endpoint, error = %e, "feed poll failed");
                break;
            }
        }
    }
    debug!(endpoint = %endpoint, "feed socket closed");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_close_marker() {
        assert!(is_close_marker(&vec![Vec::new()]));
        assert!(!is_close_marker(&Vec::new()));
        assert!(!is_close_marker(&vec![vec![0]]));
        let request = vec![b"blockchain.fetch_last_height".to_vec(), vec![0; 4], vec![]];
        assert!(!is_close_marker(&request));
    }

    #[tokio::test]
    async fn test_dealer_round_trip_over_inproc() {
        let connector = ZmqConnector::new();
        let router = connector.context.socket(zmq::ROUTER).unwrap();
        router.bind("inproc://obelisk-test-router").unwrap();
        let mut link = connector.connect("inproc://obelisk-test-router").unwrap();

        let request = vec![b"blockchain.fetch_last_height".to_vec(), vec![1, 0, 0, 0], vec![]];
        link.outbound.send(request.clone()).unwrap();

        let server = thread::spawn(move || {
            let mut frame = router.recv_multipart(0).unwrap();
            assert_eq!(&frame[1..], request.as_slice());
            frame[3] = 0u32.to_le_bytes().to_vec();
            router.send_multipart(frame, 0).unwrap();
        });

        let reply = link.inbound.recv().await.unwrap();
        assert_eq!(reply[0], b"blockchain.fetch_last_height".to_vec());
        assert_eq!(reply[2], vec![0, 0, 0, 0]);
        server.join().unwrap();

        drop(link.outbound);
        assert!(link.inbound.recv().await.is_none());
    }
}
