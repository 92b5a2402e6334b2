use super::dns_addr::DnsAddr;
use super::message::Message;
use std::ops::Deref;

/// Classic DNS-over-UDP payload ceiling (RFC 1035 §2.3.4).
pub const MAX_UDP_MESSAGE_SIZE: usize = 512;

/// Largest message a 2-byte length prefix can describe.
pub const MAX_STREAM_MESSAGE_SIZE: usize = u16::MAX as usize;

/// An inbound request together with the tagged address of its sender.
///
/// On the client side the same type describes an outbound exchange, with
/// `remote_addr` naming the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub message: Message,
    pub remote_addr: DnsAddr,
}

impl Query {
    pub fn new(message: Message, remote_addr: DnsAddr) -> Self {
        Self {
            message,
            remote_addr,
        }
    }

    /// Reply size ceiling imposed by the transport the query arrived on.
    pub fn max_reply_size(&self) -> Option<usize> {
        self.remote_addr.max_message_size()
    }
}

impl Deref for Query {
    type Target = Message;

    fn deref(&self) -> &Message {
        &self.message
    }
}
