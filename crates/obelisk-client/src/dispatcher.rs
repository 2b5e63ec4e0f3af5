//! Request dispatcher.
//!
//! One task owns the request connection and the table of in-flight
//! requests. Callers hand it a command and get a oneshot receiver back; the
//! task frames and sends the request, matches each reply to its caller by
//! correlation id, and forwards `address.update` pushes to a broadcast
//! channel.
//!
//! Flow:
//! 1. `submit` queues the command on an unbounded channel (never blocks)
//! 2. The task picks an id that is not pending and records the reply sender
//! 3. The task sends `[name, id, payload]`
//! 4. An inbound `[name, id, body]` removes the entry, checks the status
//!    word and decodes the body with the pending command's decoder
//! 5. Connection loss completes every entry with `ConnectionLost`

use std::collections::HashMap;
use std::time::Duration;

use obelisk_protocol::command::ADDRESS_UPDATE;
use obelisk_protocol::{AddressUpdate, CommandKind, ObeliskError, ProtocolError, Request, Response};
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error, warn};

use crate::error::ClientError;
use crate::transport::{DealerLink, Multipart};

/// Address updates buffered per listener before it starts lagging.
pub const ADDRESS_UPDATE_CAPACITY: usize = 256;

type Reply = oneshot::Sender<Result<Response, ClientError>>;

struct Submit {
    kind: CommandKind,
    payload: Vec<u8>,
    reply: Reply,
}

struct Pending {
    kind: CommandKind,
    reply: Reply,
    deadline: Option<Instant>,
}

/// In-flight requests keyed by correlation id.
struct PendingTable {
    entries: HashMap<u32, Pending>,
    next_id: u32,
}

impl PendingTable {
    fn new(first_id: u32) -> Self {
        Self { entries: HashMap::new(), next_id: first_id }
    }

    /// Record a request under an id no other pending request holds.
    fn insert(&mut self, pending: Pending) -> u32 {
        let mut id = self.next_id;
        while self.entries.contains_key(&id) {
            id = id.wrapping_add(1);
        }
        self.next_id = id.wrapping_add(1);
        self.entries.insert(id, pending);
        id
    }

    fn take(&mut self, id: u32) -> Option<Pending> {
        self.entries.remove(&id)
    }

    fn next_deadline(&self) -> Option<Instant> {
        self.entries.values().filter_map(|p| p.deadline).min()
    }

    fn take_expired(&mut self, now: Instant) -> Vec<(u32, Pending)> {
        let expired: Vec<u32> = self
            .entries
            .iter()
            .filter(|(_, p)| p.deadline.is_some_and(|d| d <= now))
            .map(|(id, _)| *id)
            .collect();
        expired
            .into_iter()
            .filter_map(|id| self.entries.remove(&id).map(|p| (id, p)))
            .collect()
    }

    fn drain(&mut self) -> impl Iterator<Item = (u32, Pending)> + '_ {
        self.entries.drain()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Handle to the dispatcher task. Cloning shares the same connection.
#[derive(Clone)]
pub struct Dispatcher {
    submit: mpsc::UnboundedSender<Submit>,
    updates: broadcast::Sender<AddressUpdate>,
    alive: watch::Receiver<()>,
}

impl Dispatcher {
    /// Start the dispatcher task on the current tokio runtime.
    ///
    /// The task runs until every handle is dropped.
    pub fn spawn(link: DealerLink, request_timeout: Option<Duration>) -> Self {
        let (submit, submissions) = mpsc::unbounded_channel();
        let (updates, _) = broadcast::channel(ADDRESS_UPDATE_CAPACITY);
        let (alive_tx, alive) = watch::channel(());
        let task = DispatchTask {
            outbound: link.outbound,
            inbound: link.inbound,
            submissions,
            updates: updates.clone(),
            pending: PendingTable::new(rand::random()),
            request_timeout,
            alive: Some(alive_tx),
        };
        tokio::spawn(task.run());
        Self { submit, updates, alive }
    }

    /// Encode `request`, send it and wait for the decoded reply.
    ///
    /// Argument errors are returned before anything is sent.
    pub async fn call(&self, request: &Request) -> Result<Response, ClientError> {
        let payload = request.encode()?;
        self.submit(request.kind(), payload).await
    }

    /// Queue an already-encoded request.
    ///
    /// Returns immediately; the returned future resolves with the reply.
    pub fn submit(
        &self,
        kind: CommandKind,
        payload: Vec<u8>,
    ) -> impl std::future::Future<Output = Result<Response, ClientError>> {
        let (reply, rx) = oneshot::channel();
        // A closed channel drops `reply`, which resolves `rx` as lost.
        let _ = self.submit.send(Submit { kind, payload, reply });
        async move { rx.await.unwrap_or(Err(ClientError::ConnectionLost)) }
    }

    /// A new listener for `address.update` pushes.
    pub fn address_updates(&self) -> broadcast::Receiver<AddressUpdate> {
        self.updates.subscribe()
    }

    /// Whether the request connection is still up.
    pub fn is_connected(&self) -> bool {
        self.alive.has_changed().is_ok()
    }

    /// Resolves once the request connection is gone.
    pub fn closed(&self) -> impl std::future::Future<Output = ()> {
        let mut alive = self.alive.clone();
        async move { while alive.changed().await.is_ok() {} }
    }
}

struct DispatchTask {
    outbound: mpsc::UnboundedSender<Multipart>,
    inbound: mpsc::UnboundedReceiver<Multipart>,
    submissions: mpsc::UnboundedReceiver<Submit>,
    updates: broadcast::Sender<AddressUpdate>,
    pending: PendingTable,
    request_timeout: Option<Duration>,
    alive: Option<watch::Sender<()>>,
}

impl DispatchTask {
    async fn run(mut self) {
        loop {
            let deadline = self.pending.next_deadline();
            tokio::select! {
                submit = self.submissions.recv() => match submit {
                    Some(submit) => self.send(submit),
                    None => {
                        debug!(pending = self.pending.len(), "dispatcher handles dropped, closing");
                        return;
                    }
                },
                frame = self.inbound.recv() => match frame {
                    Some(parts) => self.route(parts),
                    None => break,
                },
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.expire();
                }
            }
        }

        error!(pending = self.pending.len(), "connection lost");
        self.alive.take();
        for (id, pending) in self.pending.drain() {
            debug!(id = id, command = %pending.kind, "failing pending request");
            let _ = pending.reply.send(Err(ClientError::ConnectionLost));
        }
        while let Some(submit) = self.submissions.recv().await {
            let _ = submit.reply.send(Err(ClientError::ConnectionLost));
        }
    }

    fn send(&mut self, submit: Submit) {
        let Submit { kind, payload, reply } = submit;
        let deadline = self.request_timeout.map(|t| Instant::now() + t);
        let bytes = payload.len();
        let id = self.pending.insert(Pending { kind, reply, deadline });

        let frame = vec![kind.name().as_bytes().to_vec(), id.to_le_bytes().to_vec(), payload];
        if self.outbound.send(frame).is_err() {
            if let Some(pending) = self.pending.take(id) {
                let _ = pending.reply.send(Err(ClientError::ConnectionLost));
            }
            return;
        }
        debug!(command = %kind, id = id, bytes = bytes, "C> request");
    }

    fn route(&mut self, parts: Multipart) {
        let [name, id, body] = parts.as_slice() else {
            warn!(parts = parts.len(), "dropping frame with unexpected part count");
            return;
        };
        let name = String::from_utf8_lossy(name);

        if name == ADDRESS_UPDATE {
            match AddressUpdate::decode(body) {
                Ok(update) => {
                    debug!(address = %update.address, height = ?update.height, "C< address.update");
                    if self.updates.send(update).is_err() {
                        debug!("address update with no listeners");
                    }
                }
                Err(e) => warn!(error = %e, "dropping malformed address update"),
            }
            return;
        }

        let Ok(id) = <[u8; 4]>::try_from(id.as_slice()).map(u32::from_le_bytes) else {
            warn!(command = %name, id_len = id.len(), "dropping frame with bad correlation id");
            return;
        };
        let Some(pending) = self.pending.take(id) else {
            warn!(command = %name, id = id, "reply for unknown correlation id");
            return;
        };
        match check_reply_name(&name, pending.kind) {
            ReplyName::Matches => {}
            ReplyName::Unknown => {
                warn!(
                    id = id,
                    expected = %pending.kind,
                    got = %name,
                    "reply names an unknown command"
                );
            }
            ReplyName::Other(kind) => {
                warn!(
                    id = id,
                    expected = %pending.kind,
                    got = %kind,
                    "reply name does not match request"
                );
            }
        }
        debug!(command = %pending.kind, id = id, bytes = body.len(), "C< reply");

        let result = decode_reply(pending.kind, body);
        if pending.reply.send(result).is_err() {
            debug!(id = id, "caller dropped before reply");
        }
    }

    fn expire(&mut self) {
        for (id, pending) in self.pending.take_expired(Instant::now()) {
            warn!(id = id, command = %pending.kind, "request timed out");
            let _ = pending.reply.send(Err(ClientError::Timeout));
        }
    }
}

/// How the name part of a reply relates to the request it answers.
#[derive(Debug, PartialEq, Eq)]
enum ReplyName {
    Matches,
    Unknown,
    Other(CommandKind),
}

/// The correlation id decides the decoder; the name is only checked.
fn check_reply_name(name: &str, expected: CommandKind) -> ReplyName {
    match CommandKind::from_name(name) {
        Some(kind) if kind == expected => ReplyName::Matches,
        Some(kind) => ReplyName::Other(kind),
        None => ReplyName::Unknown,
    }
}

/// Strip the status word and decode the rest.
fn decode_reply(kind: CommandKind, body: &[u8]) -> Result<Response, ClientError> {
    if body.len() < 4 {
        let reason = "reply shorter than its status word";
        return Err(ProtocolError::malformed(kind.name(), reason).into());
    }
    let (status, rest) = body.split_at(4);
    match u32::from_le_bytes([status[0], status[1], status[2], status[3]]) {
        0 => Ok(Response::decode(kind, rest)?),
        code => Err(ObeliskError::from_code(code).into()),
    }
}
