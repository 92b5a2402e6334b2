use super::{guarded, Connection};
use std::fmt::Display;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use wiredns_domain::{DnsAddr, Message, TransportError, WireError, MAX_STREAM_MESSAGE_SIZE};

/// A dialed stream connection: plain TCP or TLS over TCP. Every message is
/// framed with a 2-byte big-endian length (RFC 1035 §4.2.2).
pub struct StreamConnection<S> {
    stream: S,
    remote: DnsAddr,
    peer: SocketAddr,
    timeout: Duration,
    shutdown: CancellationToken,
}

impl<S> StreamConnection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    pub(crate) fn new(
        stream: S,
        remote: DnsAddr,
        peer: SocketAddr,
        timeout: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            stream,
            remote,
            peer,
            timeout,
            shutdown,
        }
    }

    pub fn remote_addr(&self) -> DnsAddr {
        self.remote
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    pub async fn send(&mut self, message: &Message) -> Result<(), TransportError> {
        let wire = message.to_wire(None)?;
        let remote = self.remote;
        let stream = &mut self.stream;

        guarded(&self.shutdown, self.timeout, &remote, async {
            send_with_length_prefix(stream, &wire, &remote).await
        })
        .await?;

        debug!(server = %remote, message_len = wire.len(), "Stream query sent");
        Ok(())
    }

    pub async fn recv(&mut self) -> Result<Message, TransportError> {
        let remote = self.remote;
        let stream = &mut self.stream;

        let frame = guarded(&self.shutdown, self.timeout, &remote, async {
            read_with_length_prefix(stream, &remote).await
        })
        .await?;

        debug!(server = %remote, response_len = frame.len(), "Stream response received");
        Ok(Message::from_wire(&frame)?)
    }
}

pub(super) async fn dial(
    target: &DnsAddr,
    connect_to: SocketAddr,
    timeout: Duration,
    shutdown: &CancellationToken,
) -> Result<Connection, TransportError> {
    let stream = connect(target, connect_to, timeout, shutdown).await?;
    Ok(Connection::Tcp(StreamConnection::new(
        stream,
        *target,
        connect_to,
        timeout,
        shutdown.clone(),
    )))
}

/// TCP connect with `TCP_NODELAY`, shared by the TCP and TLS dialers.
pub(super) async fn connect(
    target: &DnsAddr,
    connect_to: SocketAddr,
    timeout: Duration,
    shutdown: &CancellationToken,
) -> Result<TcpStream, TransportError> {
    let stream = guarded(shutdown, timeout, target, async {
        TcpStream::connect(connect_to)
            .await
            .map_err(|e| TransportError::Dial {
                server: target.to_string(),
                reason: e.to_string(),
            })
    })
    .await?;

    stream.set_nodelay(true).map_err(|e| TransportError::Dial {
        server: target.to_string(),
        reason: format!("failed to set TCP_NODELAY: {}", e),
    })?;

    Ok(stream)
}

pub(crate) async fn send_with_length_prefix<S>(
    stream: &mut S,
    message_bytes: &[u8],
    server: &impl Display,
) -> Result<(), TransportError>
where
    S: AsyncWrite + Unpin,
{
    let length = u16::try_from(message_bytes.len()).map_err(|_| {
        TransportError::Wire(WireError::MessageTooLarge {
            size: message_bytes.len(),
            limit: MAX_STREAM_MESSAGE_SIZE,
        })
    })?;

    stream
        .write_all(&length.to_be_bytes())
        .await
        .map_err(|e| TransportError::io(server, e))?;
    stream
        .write_all(message_bytes)
        .await
        .map_err(|e| TransportError::io(server, e))?;
    stream
        .flush()
        .await
        .map_err(|e| TransportError::io(server, e))?;

    Ok(())
}

pub(crate) async fn read_with_length_prefix<S>(
    stream: &mut S,
    server: &impl Display,
) -> Result<Vec<u8>, TransportError>
where
    S: AsyncRead + Unpin,
{
    let mut len_buf = [0u8; 2];
    stream
        .read_exact(&mut len_buf)
        .await
        .map_err(|e| TransportError::io(server, e))?;

    let message_len = u16::from_be_bytes(len_buf) as usize;

    let mut message = vec![0u8; message_len];
    stream
        .read_exact(&mut message)
        .await
        .map_err(|e| TransportError::io(server, e))?;

    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_length_prefix_frames_message() {
        let (mut client, mut server) = tokio::io::duplex(1024);

        send_with_length_prefix(&mut client, b"hello", &"test").await.unwrap();

        let mut raw = [0u8; 7];
        server.read_exact(&mut raw).await.unwrap();
        assert_eq!(raw, [0, 5, b'h', b'e', b'l', b'l', b'o']);
    }

    #[tokio::test]
    async fn test_read_length_prefix_reports_early_close() {
        let (mut client, mut server) = tokio::io::duplex(1024);
        client.write_all(&[0, 10, 1, 2, 3]).await.unwrap();
        drop(client);

        let err = read_with_length_prefix(&mut server, &"test").await.unwrap_err();
        assert!(matches!(err, TransportError::Closed { .. }));
    }

    #[tokio::test]
    async fn test_oversized_frame_is_rejected() {
        let (mut client, _server) = tokio::io::duplex(16);
        let payload = vec![0u8; MAX_STREAM_MESSAGE_SIZE + 1];

        let err = send_with_length_prefix(&mut client, &payload, &"test")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TransportError::Wire(WireError::MessageTooLarge { .. })
        ));
    }
}
