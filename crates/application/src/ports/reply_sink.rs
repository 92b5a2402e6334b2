use async_trait::async_trait;
use wiredns_domain::TransportError;

/// Outbound half of whatever carried a query in: a datagram socket bound to
/// the sender, or the write half of a stream connection.
///
/// Implementations receive a fully encoded message and add any framing the
/// transport needs.
#[async_trait]
pub trait ReplySink: Send {
    async fn send_bytes(&mut self, wire: Vec<u8>) -> Result<(), TransportError>;
}
