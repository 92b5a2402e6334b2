//! UDP transport (RFC 1035 §4.2.1)
//!
//! Messages travel unframed, one per datagram. Outbound messages are capped at
//! 512 bytes; inbound datagrams are read into a 4096-byte buffer.

use super::{guarded, Connection};
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use wiredns_domain::{DnsAddr, Message, TransportError, WireError, MAX_UDP_MESSAGE_SIZE};

/// Receive buffer size; large enough for EDNS-sized answers from other servers.
pub(crate) const MAX_UDP_RECV_SIZE: usize = 4096;

/// A UDP socket connected to a single peer.
pub struct UdpConnection {
    socket: UdpSocket,
    remote: DnsAddr,
    peer: SocketAddr,
    timeout: Duration,
    shutdown: CancellationToken,
}

impl UdpConnection {
    pub fn remote_addr(&self) -> DnsAddr {
        self.remote
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    pub async fn send(&mut self, message: &Message) -> Result<(), TransportError> {
        let wire = message.to_wire(None)?;
        if wire.len() > MAX_UDP_MESSAGE_SIZE {
            return Err(WireError::MessageTooLarge {
                size: wire.len(),
                limit: MAX_UDP_MESSAGE_SIZE,
            }
            .into());
        }

        let remote = self.remote;
        let socket = &self.socket;
        let bytes_sent = guarded(&self.shutdown, self.timeout, &remote, async {
            socket
                .send(&wire)
                .await
                .map_err(|e| TransportError::io(remote, e))
        })
        .await?;

        debug!(server = %remote, bytes_sent, "UDP query sent");
        Ok(())
    }

    pub async fn recv(&mut self) -> Result<Message, TransportError> {
        let mut buf = vec![0u8; MAX_UDP_RECV_SIZE];
        let remote = self.remote;
        let socket = &self.socket;

        let len = guarded(&self.shutdown, self.timeout, &remote, async {
            socket
                .recv(&mut buf)
                .await
                .map_err(|e| TransportError::io(remote, e))
        })
        .await?;

        debug!(server = %remote, response_len = len, "UDP response received");
        Ok(Message::from_wire(&buf[..len])?)
    }
}

pub(super) async fn dial(
    target: &DnsAddr,
    connect_to: SocketAddr,
    timeout: Duration,
    shutdown: &CancellationToken,
) -> Result<Connection, TransportError> {
    // Ephemeral port in the peer's address family
    let bind_addr = if connect_to.is_ipv4() {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0))
    } else {
        SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0))
    };

    let dial_err = |e: std::io::Error| TransportError::Dial {
        server: target.to_string(),
        reason: e.to_string(),
    };

    let socket = UdpSocket::bind(bind_addr).await.map_err(dial_err)?;
    guarded(shutdown, timeout, target, async {
        socket.connect(connect_to).await.map_err(dial_err)
    })
    .await?;

    Ok(Connection::Udp(UdpConnection {
        socket,
        remote: *target,
        peer: connect_to,
        timeout,
        shutdown: shutdown.clone(),
    }))
}
