pub mod tcp;
pub mod tls;
pub mod udp;

use async_trait::async_trait;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use wiredns_domain::{DnsAddr, Message, TransportConfig, TransportError};

pub use tcp::StreamConnection;
pub use udp::UdpConnection;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Chooses the socket address actually dialed for a target.
///
/// The connection still reports the original target as its remote address,
/// and TLS name checks are made against the target.
#[async_trait]
pub trait Proxy: Send + Sync {
    async fn dial_addr(&self, target: &DnsAddr) -> Result<SocketAddr, TransportError>;
}

#[async_trait]
impl<F> Proxy for F
where
    F: Fn(&DnsAddr) -> Result<SocketAddr, TransportError> + Send + Sync,
{
    async fn dial_addr(&self, target: &DnsAddr) -> Result<SocketAddr, TransportError> {
        self(target)
    }
}

/// Dials connections by transport tag.
#[derive(Clone)]
pub struct Transport {
    tls_config: Option<Arc<rustls::ClientConfig>>,
    tls_server_name: Option<String>,
    proxy: Option<Arc<dyn Proxy>>,
    timeout: Duration,
    shutdown: CancellationToken,
}

impl Transport {
    pub fn new() -> Self {
        Self {
            tls_config: None,
            tls_server_name: None,
            proxy: None,
            timeout: DEFAULT_TIMEOUT,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn from_config(config: &TransportConfig) -> Result<Self, TransportError> {
        let mut transport = Self::new().with_timeout(config.timeout());
        if let Some(ref ca_path) = config.tls_ca_path {
            transport = transport.with_tls_config(tls::client_config_from_pem(ca_path)?);
        }
        if let Some(ref name) = config.tls_server_name {
            transport = transport.with_tls_server_name(name.clone());
        }
        Ok(transport)
    }

    /// Client TLS settings, including trusted roots. Defaults to the webpki roots.
    pub fn with_tls_config(mut self, config: Arc<rustls::ClientConfig>) -> Self {
        self.tls_config = Some(config);
        self
    }

    pub fn with_tls_server_name(mut self, name: impl Into<String>) -> Self {
        self.tls_server_name = Some(name.into());
        self
    }

    pub fn with_proxy(mut self, proxy: impl Proxy + 'static) -> Self {
        self.proxy = Some(Arc::new(proxy));
        self
    }

    /// Deadline for each dial, handshake, send and receive.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn dial(&self, target: &DnsAddr) -> Result<Connection, TransportError> {
        if self.shutdown.is_cancelled() {
            return Err(TransportError::Cancelled);
        }

        let connect_to = match self.proxy {
            Some(ref proxy) => {
                let addr = proxy.dial_addr(target).await?;
                debug!(target = %target, proxy = %addr, "Dialing through proxy");
                addr
            }
            None => target.socket_addr(),
        };

        match target {
            DnsAddr::Udp(_) => udp::dial(target, connect_to, self.timeout, &self.shutdown).await,
            DnsAddr::Tcp(_) => tcp::dial(target, connect_to, self.timeout, &self.shutdown).await,
            DnsAddr::Tls(_) => {
                let config = self
                    .tls_config
                    .clone()
                    .unwrap_or_else(tls::default_client_config);
                tls::dial(
                    target,
                    connect_to,
                    config,
                    self.tls_server_name.as_deref(),
                    self.timeout,
                    &self.shutdown,
                )
                .await
            }
        }
    }
}

impl Default for Transport {
    fn default() -> Self {
        Self::new()
    }
}

/// An open exchange channel to one peer. Owned by a single task.
pub enum Connection {
    Udp(UdpConnection),
    Tcp(StreamConnection<TcpStream>),
    Tls(Box<StreamConnection<tokio_rustls::client::TlsStream<TcpStream>>>),
}

impl Connection {
    pub async fn send(&mut self, message: &Message) -> Result<(), TransportError> {
        match self {
            Self::Udp(c) => c.send(message).await,
            Self::Tcp(c) => c.send(message).await,
            Self::Tls(c) => c.send(message).await,
        }
    }

    pub async fn recv(&mut self) -> Result<Message, TransportError> {
        match self {
            Self::Udp(c) => c.recv().await,
            Self::Tcp(c) => c.recv().await,
            Self::Tls(c) => c.recv().await,
        }
    }

    /// The tagged target this connection was dialed for.
    pub fn remote_addr(&self) -> DnsAddr {
        match self {
            Self::Udp(c) => c.remote_addr(),
            Self::Tcp(c) => c.remote_addr(),
            Self::Tls(c) => c.remote_addr(),
        }
    }

    /// The socket's actual peer; differs from the target when proxied.
    pub fn peer_addr(&self) -> SocketAddr {
        match self {
            Self::Udp(c) => c.peer_addr(),
            Self::Tcp(c) => c.peer_addr(),
            Self::Tls(c) => c.peer_addr(),
        }
    }

    pub fn protocol_name(&self) -> &'static str {
        self.remote_addr().protocol_name()
    }
}

/// Runs `fut` under a deadline, giving up early if `shutdown` fires.
pub(crate) async fn guarded<T, F>(
    shutdown: &CancellationToken,
    timeout: Duration,
    server: &DnsAddr,
    fut: F,
) -> Result<T, TransportError>
where
    F: Future<Output = Result<T, TransportError>>,
{
    tokio::select! {
        _ = shutdown.cancelled() => Err(TransportError::Cancelled),
        result = tokio::time::timeout(timeout, fut) => match result {
            Ok(inner) => inner,
            Err(_) => Err(TransportError::Timeout {
                server: server.to_string(),
            }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_guarded_times_out() {
        let token = CancellationToken::new();
        let target: DnsAddr = "udp://127.0.0.1:53".parse().unwrap();

        let result: Result<(), _> = guarded(
            &token,
            Duration::from_millis(10),
            &target,
            std::future::pending(),
        )
        .await;

        assert!(matches!(result, Err(TransportError::Timeout { .. })));
    }

    #[tokio::test]
    async fn test_guarded_observes_cancellation() {
        let token = CancellationToken::new();
        token.cancel();
        let target: DnsAddr = "udp://127.0.0.1:53".parse().unwrap();

        let result: Result<(), _> =
            guarded(&token, Duration::from_secs(60), &target, std::future::pending()).await;

        assert!(matches!(result, Err(TransportError::Cancelled)));
    }

    #[tokio::test]
    async fn test_dial_after_cancellation_fails_fast() {
        let token = CancellationToken::new();
        token.cancel();
        let transport = Transport::new().with_cancellation(token);

        let result = transport.dial(&"tcp://127.0.0.1:9".parse().unwrap()).await;
        assert!(matches!(result, Err(TransportError::Cancelled)));
    }
}
