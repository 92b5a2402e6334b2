use crate::query::MAX_UDP_MESSAGE_SIZE;
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

/// An endpoint tagged with the transport family used to reach it.
///
/// Dialing and reply-size limits are decided by the tag alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DnsAddr {
    Udp(SocketAddr),
    Tcp(SocketAddr),
    Tls(SocketAddr),
}

impl DnsAddr {
    pub fn socket_addr(&self) -> SocketAddr {
        match self {
            DnsAddr::Udp(addr) | DnsAddr::Tcp(addr) | DnsAddr::Tls(addr) => *addr,
        }
    }

    pub fn protocol_name(&self) -> &'static str {
        match self {
            DnsAddr::Udp(_) => "UDP",
            DnsAddr::Tcp(_) => "TCP",
            DnsAddr::Tls(_) => "TLS",
        }
    }

    /// Whether messages on this transport are length-prefixed.
    pub fn is_stream(&self) -> bool {
        !matches!(self, DnsAddr::Udp(_))
    }

    /// `Some(512)` for datagrams, `None` for streams.
    pub fn max_message_size(&self) -> Option<usize> {
        match self {
            DnsAddr::Udp(_) => Some(MAX_UDP_MESSAGE_SIZE),
            DnsAddr::Tcp(_) | DnsAddr::Tls(_) => None,
        }
    }

    /// Same transport family, different endpoint.
    pub fn with_socket_addr(&self, addr: SocketAddr) -> Self {
        match self {
            DnsAddr::Udp(_) => DnsAddr::Udp(addr),
            DnsAddr::Tcp(_) => DnsAddr::Tcp(addr),
            DnsAddr::Tls(_) => DnsAddr::Tls(addr),
        }
    }
}

impl FromStr for DnsAddr {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(addr_str) = s.strip_prefix("udp://") {
            let addr = addr_str
                .parse::<SocketAddr>()
                .map_err(|_| format!("Invalid UDP address '{}'", addr_str))?;
            return Ok(DnsAddr::Udp(addr));
        }
        if let Some(addr_str) = s.strip_prefix("tcp://") {
            let addr = addr_str
                .parse::<SocketAddr>()
                .map_err(|_| format!("Invalid TCP address '{}'", addr_str))?;
            return Ok(DnsAddr::Tcp(addr));
        }
        if let Some(addr_str) = s.strip_prefix("tls://") {
            let addr = addr_str
                .parse::<SocketAddr>()
                .map_err(|_| format!("Invalid TLS address '{}'", addr_str))?;
            return Ok(DnsAddr::Tls(addr));
        }
        if let Ok(addr) = s.parse::<SocketAddr>() {
            return Ok(DnsAddr::Udp(addr));
        }
        Err(format!(
            "Invalid DNS endpoint format: '{}'. Expected: udp://IP:PORT, tcp://IP:PORT, tls://IP:PORT, or IP:PORT",
            s
        ))
    }
}

impl fmt::Display for DnsAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DnsAddr::Udp(addr) => write!(f, "udp://{}", addr),
            DnsAddr::Tcp(addr) => write!(f, "tcp://{}", addr),
            DnsAddr::Tls(addr) => write!(f, "tls://{}", addr),
        }
    }
}
