use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::SocketAddr;
use tokio::net::{TcpListener, UdpSocket};
use wiredns_domain::TransportError;

const LISTEN_BACKLOG: i32 = 1024;

pub fn create_udp_socket(socket_addr: SocketAddr) -> Result<UdpSocket, TransportError> {
    build_udp_socket(socket_addr).map_err(|e| listener_error(socket_addr, e))
}

pub fn create_tcp_listener(socket_addr: SocketAddr) -> Result<TcpListener, TransportError> {
    build_tcp_listener(socket_addr).map_err(|e| listener_error(socket_addr, e))
}

fn build_udp_socket(socket_addr: SocketAddr) -> io::Result<UdpSocket> {
    let socket = Socket::new(domain_of(socket_addr), Type::DGRAM, Some(Protocol::UDP))?;
    if socket_addr.is_ipv6() {
        socket.set_only_v6(false)?;
    }
    socket.set_reuse_address(true)?;
    socket.set_recv_buffer_size(512 * 1024)?;
    socket.set_send_buffer_size(512 * 1024)?;
    socket.bind(&socket_addr.into())?;
    socket.set_nonblocking(true)?;
    let std_socket: std::net::UdpSocket = socket.into();
    UdpSocket::from_std(std_socket)
}

fn build_tcp_listener(socket_addr: SocketAddr) -> io::Result<TcpListener> {
    let socket = Socket::new(domain_of(socket_addr), Type::STREAM, Some(Protocol::TCP))?;
    if socket_addr.is_ipv6() {
        socket.set_only_v6(false)?;
    }
    socket.set_reuse_address(true)?;
    socket.bind(&socket_addr.into())?;
    socket.listen(LISTEN_BACKLOG)?;
    socket.set_nonblocking(true)?;
    let std_listener: std::net::TcpListener = socket.into();
    TcpListener::from_std(std_listener)
}

fn domain_of(socket_addr: SocketAddr) -> Domain {
    if socket_addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    }
}

fn listener_error(socket_addr: SocketAddr, err: io::Error) -> TransportError {
    TransportError::Listener {
        addr: socket_addr.to_string(),
        reason: err.to_string(),
    }
}

/// Accept/receive errors that affect one peer, not the listening socket.
pub(crate) fn is_transient(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionRefused
            | io::ErrorKind::Interrupted
            | io::ErrorKind::WouldBlock
            | io::ErrorKind::TimedOut
    ) || is_fd_exhaustion(err)
}

#[cfg(unix)]
fn is_fd_exhaustion(err: &io::Error) -> bool {
    // EMFILE / ENFILE
    matches!(err.raw_os_error(), Some(23) | Some(24))
}

#[cfg(not(unix))]
fn is_fd_exhaustion(_err: &io::Error) -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_tcp_and_udp_share_a_port() {
        let tcp = create_tcp_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = tcp.local_addr().unwrap();

        let udp = create_udp_socket(addr).unwrap();
        assert_eq!(udp.local_addr().unwrap(), addr);
    }

    #[test]
    fn test_reset_is_transient() {
        let err = io::Error::from(io::ErrorKind::ConnectionReset);
        assert!(is_transient(&err));
        assert!(!is_transient(&io::Error::from(io::ErrorKind::PermissionDenied)));
    }
}
