use crate::ports::ReplySink;
use std::time::Duration;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};
use tracing::{debug, trace};
use wiredns_domain::{
    DnsAddr, Message, Query, Record, Resource, ResponseCode, TransportError, WireError,
};

/// Outcome of a successful flush.
///
/// Truncation is advisory: the sender dropped trailing records to fit a
/// datagram and set TC, but the reply still went out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Complete,
    Truncated { sent: usize, dropped: usize },
}

impl Delivery {
    pub fn is_truncated(&self) -> bool {
        matches!(self, Delivery::Truncated { .. })
    }
}

/// Builds and transmits the reply to a single query.
///
/// Both [`send`](Self::send) and [`reply`](Self::reply) consume the writer,
/// so a query is answered at most once. The writer also carries the serving
/// context's cancellation: a flush in progress fails with
/// [`TransportError::Cancelled`] once it fires.
pub struct MessageWriter {
    reply: Message,
    limit: Option<usize>,
    remote: DnsAddr,
    sink: Option<Box<dyn ReplySink>>,
    shutdown: CancellationToken,
}

impl MessageWriter {
    pub fn new(query: &Query, sink: Box<dyn ReplySink>) -> Self {
        Self {
            reply: query.message.reply(),
            limit: query.max_reply_size(),
            remote: query.remote_addr,
            sink: Some(sink),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    /// Resolves when the server serving this query shuts down.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.shutdown.cancelled()
    }

    pub fn is_cancelled(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    pub fn remote_addr(&self) -> DnsAddr {
        self.remote
    }

    /// Reply size ceiling, `None` on stream transports.
    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// The reply as built so far.
    pub fn pending(&self) -> &Message {
        &self.reply
    }

    pub fn answer(&mut self, name: &str, ttl: Duration, record: impl Into<Record>) -> &mut Self {
        self.reply.answers.push(Resource::new(name, ttl, record));
        self
    }

    pub fn authority(&mut self, name: &str, ttl: Duration, record: impl Into<Record>) -> &mut Self {
        self.reply.authorities.push(Resource::new(name, ttl, record));
        self
    }

    pub fn additional(
        &mut self,
        name: &str,
        ttl: Duration,
        record: impl Into<Record>,
    ) -> &mut Self {
        self.reply.additionals.push(Resource::new(name, ttl, record));
        self
    }

    /// Appends a prebuilt record to the answer section, keeping its class.
    pub fn push_answer(&mut self, resource: Resource) -> &mut Self {
        self.reply.answers.push(resource);
        self
    }

    pub fn set_authoritative(&mut self, authoritative: bool) -> &mut Self {
        self.reply.authoritative = authoritative;
        self
    }

    pub fn set_recursion_available(&mut self, available: bool) -> &mut Self {
        self.reply.recursion_available = available;
        self
    }

    pub fn set_response_code(&mut self, code: ResponseCode) -> &mut Self {
        self.reply.response_code = code;
        self
    }

    /// Transmits the accumulated reply.
    pub async fn reply(mut self) -> Result<Delivery, TransportError> {
        let message = std::mem::take(&mut self.reply);
        self.flush(&message).await
    }

    /// Transmits `message` instead of the accumulated reply. The transport's
    /// size ceiling still applies.
    pub async fn send(mut self, message: Message) -> Result<Delivery, TransportError> {
        self.flush(&message).await
    }

    async fn flush(&mut self, message: &Message) -> Result<Delivery, TransportError> {
        let Some(mut sink) = self.sink.take() else {
            return Err(TransportError::Closed {
                server: self.remote.to_string(),
            });
        };

        if self.shutdown.is_cancelled() {
            return Err(TransportError::Cancelled);
        }

        let wire = message.to_wire(self.limit)?;
        let delivery = delivery_of(message, &wire)?;
        let size = wire.len();

        tokio::select! {
            _ = self.shutdown.cancelled() => return Err(TransportError::Cancelled),
            sent = sink.send_bytes(wire) => sent?,
        }

        match delivery {
            Delivery::Complete => {
                trace!(client = %self.remote, id = message.id, size, "Reply sent");
            }
            Delivery::Truncated { sent, dropped } => {
                debug!(
                    client = %self.remote,
                    id = message.id,
                    size,
                    sent,
                    dropped,
                    "Reply truncated to fit transport"
                );
            }
        }
        Ok(delivery)
    }
}

impl Drop for MessageWriter {
    fn drop(&mut self) {
        if self.sink.is_some() {
            debug!(
                client = %self.remote,
                id = self.reply.id,
                "Query dropped without a reply"
            );
        }
    }
}

fn delivery_of(message: &Message, wire: &[u8]) -> Result<Delivery, WireError> {
    let header = wire
        .get(6..12)
        .ok_or_else(|| WireError::MalformedHeader("encoded header too short".to_string()))?;
    let sent = header
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]) as usize)
        .sum::<usize>();
    let dropped = message.resource_count().saturating_sub(sent);

    if dropped == 0 {
        Ok(Delivery::Complete)
    } else {
        Ok(Delivery::Truncated { sent, dropped })
    }
}
