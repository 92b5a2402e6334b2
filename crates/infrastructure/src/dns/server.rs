use super::listener::{create_tcp_listener, create_udp_socket, is_transient};
use super::transport::tcp::{read_with_length_prefix, send_with_length_prefix};
use super::transport::{guarded, tls};
use super::transport::udp::MAX_UDP_RECV_SIZE;
use async_trait::async_trait;
use futures::future::{self, BoxFuture, FutureExt};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, WriteHalf};
use tokio::net::{TcpListener, UdpSocket};
use tokio::sync::Mutex;
use tokio_rustls::TlsAcceptor;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use wiredns_application::{Handler, MessageWriter, ReplySink};
use wiredns_domain::{DnsAddr, Message, Query, ServerConfig, TransportError};

/// Serves DNS over UDP, TCP and TLS, dispatching every query to one handler.
pub struct DnsServer {
    config: ServerConfig,
    handler: Arc<dyn Handler>,
    tls_config: Option<Arc<rustls::ServerConfig>>,
    shutdown: CancellationToken,
}

/// What each per-connection and per-datagram task needs.
#[derive(Clone)]
struct ConnectionContext {
    handler: Arc<dyn Handler>,
    idle_timeout: Duration,
    shutdown: CancellationToken,
}

impl DnsServer {
    pub fn new(config: ServerConfig, handler: Arc<dyn Handler>) -> Self {
        Self {
            config,
            handler,
            tls_config: None,
            shutdown: CancellationToken::new(),
        }
    }

    /// Builds a server, loading TLS material when the config names it.
    pub fn from_config(
        config: ServerConfig,
        handler: Arc<dyn Handler>,
    ) -> Result<Self, TransportError> {
        let tls_config = match (&config.tls_cert_path, &config.tls_key_path) {
            (Some(cert), Some(key)) => Some(tls::server_config_from_pem(cert, key)?),
            _ => None,
        };
        let mut server = Self::new(config, handler);
        server.tls_config = tls_config;
        Ok(server)
    }

    pub fn with_tls(mut self, tls_config: Arc<rustls::ServerConfig>) -> Self {
        self.tls_config = Some(tls_config);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    fn context(&self) -> ConnectionContext {
        ConnectionContext {
            handler: self.handler.clone(),
            idle_timeout: self.config.tcp_idle_timeout(),
            shutdown: self.shutdown.clone(),
        }
    }

    /// Binds the configured addresses and serves until a loop fails or the
    /// server is cancelled.
    pub async fn listen_and_serve(&self) -> Result<(), TransportError> {
        let listener_err = |reason: String| TransportError::Listener {
            addr: self.config.bind_address.clone(),
            reason,
        };

        let dns_addr = self.config.dns_addr().map_err(listener_err)?;
        let tcp_listener = create_tcp_listener(dns_addr)?;
        let udp_socket = create_udp_socket(dns_addr)?;

        let mut loops: Vec<BoxFuture<'_, Result<(), TransportError>>> = vec![
            self.serve_tcp(tcp_listener).boxed(),
            self.serve_udp(udp_socket).boxed(),
        ];

        if self.tls_config.is_some() {
            let tls_addr = self.config.tls_addr().map_err(listener_err)?;
            let tls_listener = create_tcp_listener(tls_addr)?;
            loops.push(self.serve_tls(tls_listener).boxed());
        }

        info!(
            bind_address = %dns_addr,
            tls = self.tls_config.is_some(),
            "DNS server ready"
        );

        let (result, _, _) = future::select_all(loops).await;
        result
    }

    pub async fn serve_tcp(&self, listener: TcpListener) -> Result<(), TransportError> {
        let local = local_addr_of(&listener)?;
        info!(addr = %local, "Serving DNS over TCP");

        loop {
            let (stream, peer) = match self.accept(&listener, local).await? {
                Some(accepted) => accepted,
                None => continue,
            };
            if let Err(e) = stream.set_nodelay(true) {
                debug!(client = %peer, error = %e, "Failed to set TCP_NODELAY");
            }

            let ctx = self.context();
            tokio::spawn(async move {
                serve_stream(stream, DnsAddr::Tcp(peer), ctx).await;
            });
        }
    }

    pub async fn serve_tls(&self, listener: TcpListener) -> Result<(), TransportError> {
        let tls_config = self
            .tls_config
            .clone()
            .ok_or_else(|| TransportError::Tls("no server certificate configured".to_string()))?;
        let acceptor = TlsAcceptor::from(tls_config);
        let local = local_addr_of(&listener)?;
        info!(addr = %local, "Serving DNS over TLS");

        loop {
            let (stream, peer) = match self.accept(&listener, local).await? {
                Some(accepted) => accepted,
                None => continue,
            };
            if let Err(e) = stream.set_nodelay(true) {
                debug!(client = %peer, error = %e, "Failed to set TCP_NODELAY");
            }

            let acceptor = acceptor.clone();
            let ctx = self.context();
            tokio::spawn(async move {
                let remote = DnsAddr::Tls(peer);
                let handshake = tokio::select! {
                    _ = ctx.shutdown.cancelled() => return,
                    result = tokio::time::timeout(ctx.idle_timeout, acceptor.accept(stream)) => result,
                };
                match handshake {
                    Ok(Ok(tls_stream)) => serve_stream(tls_stream, remote, ctx).await,
                    Ok(Err(e)) => debug!(client = %remote, error = %e, "TLS handshake failed"),
                    Err(_) => debug!(client = %remote, "TLS handshake timed out"),
                }
            });
        }
    }

    pub async fn serve_udp(&self, socket: UdpSocket) -> Result<(), TransportError> {
        let local = socket.local_addr().map_err(|e| TransportError::Listener {
            addr: "udp".to_string(),
            reason: e.to_string(),
        })?;
        info!(addr = %local, "Serving DNS over UDP");

        let socket = Arc::new(socket);
        let mut recv_buf = [0u8; MAX_UDP_RECV_SIZE];

        loop {
            let received = tokio::select! {
                _ = self.shutdown.cancelled() => return Err(TransportError::Cancelled),
                received = socket.recv_from(&mut recv_buf) => received,
            };

            let (len, from) = match received {
                Ok(pair) => pair,
                Err(e) if is_transient(&e) => {
                    debug!(addr = %local, error = %e, "Transient UDP receive error");
                    continue;
                }
                Err(e) => {
                    return Err(TransportError::Listener {
                        addr: local.to_string(),
                        reason: e.to_string(),
                    })
                }
            };

            let packet = recv_buf[..len].to_vec();
            let socket = socket.clone();
            let handler = self.handler.clone();
            let shutdown = self.shutdown.clone();
            tokio::spawn(async move {
                serve_datagram(packet, from, socket, handler, shutdown).await;
            });
        }
    }

    /// Accepts one connection. `Ok(None)` means a transient error was skipped.
    async fn accept(
        &self,
        listener: &TcpListener,
        local: SocketAddr,
    ) -> Result<Option<(tokio::net::TcpStream, SocketAddr)>, TransportError> {
        let accepted = tokio::select! {
            _ = self.shutdown.cancelled() => return Err(TransportError::Cancelled),
            accepted = listener.accept() => accepted,
        };

        match accepted {
            Ok(pair) => Ok(Some(pair)),
            Err(e) if is_transient(&e) => {
                warn!(addr = %local, error = %e, "Transient accept error");
                Ok(None)
            }
            Err(e) => Err(TransportError::Listener {
                addr: local.to_string(),
                reason: e.to_string(),
            }),
        }
    }
}

fn local_addr_of(listener: &TcpListener) -> Result<SocketAddr, TransportError> {
    listener.local_addr().map_err(|e| TransportError::Listener {
        addr: "tcp".to_string(),
        reason: e.to_string(),
    })
}

/// Reads framed queries off one stream connection in arrival order, handing
/// each to the handler before reading the next.
async fn serve_stream<S>(stream: S, remote: DnsAddr, ctx: ConnectionContext)
where
    S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
{
    let (mut reader, writer) = tokio::io::split(stream);
    let writer = Arc::new(Mutex::new(writer));
    debug!(client = %remote, "Stream connection opened");

    loop {
        let read = tokio::select! {
            _ = ctx.shutdown.cancelled() => break,
            read = tokio::time::timeout(ctx.idle_timeout, read_with_length_prefix(&mut reader, &remote)) => read,
        };

        let frame = match read {
            Ok(Ok(frame)) => frame,
            Ok(Err(TransportError::Closed { .. })) => break,
            Ok(Err(e)) => {
                debug!(client = %remote, error = %e, "Stream read failed");
                break;
            }
            Err(_) => {
                debug!(client = %remote, "Idle stream connection closed");
                break;
            }
        };

        let message = match Message::from_wire(&frame) {
            Ok(message) => message,
            Err(e) => {
                debug!(client = %remote, error = %e, "Malformed frame, closing connection");
                break;
            }
        };

        if message.response {
            debug!(client = %remote, id = message.id, "Ignoring response on server connection");
            continue;
        }

        let query = Query::new(message, remote);
        let sink = StreamSink {
            writer: writer.clone(),
            remote,
            write_timeout: ctx.idle_timeout,
            shutdown: ctx.shutdown.clone(),
        };
        let message_writer = MessageWriter::new(&query, Box::new(sink))
            .with_cancellation(ctx.shutdown.clone());

        tokio::select! {
            _ = ctx.shutdown.cancelled() => break,
            _ = ctx.handler.serve_dns(message_writer, query) => {}
        }
    }

    debug!(client = %remote, "Stream connection closed");
}

async fn serve_datagram(
    packet: Vec<u8>,
    from: SocketAddr,
    socket: Arc<UdpSocket>,
    handler: Arc<dyn Handler>,
    shutdown: CancellationToken,
) {
    let remote = DnsAddr::Udp(from);

    let message = match Message::from_wire(&packet) {
        Ok(message) => message,
        Err(e) => {
            debug!(client = %remote, error = %e, "Dropping malformed datagram");
            return;
        }
    };

    if message.response {
        debug!(client = %remote, id = message.id, "Dropping response datagram");
        return;
    }

    let query = Query::new(message, remote);
    let sink = DatagramSink { socket, peer: from };
    let writer = MessageWriter::new(&query, Box::new(sink)).with_cancellation(shutdown.clone());

    tokio::select! {
        _ = shutdown.cancelled() => {}
        _ = handler.serve_dns(writer, query) => {}
    }
}

/// Replies to one datagram sender through the shared server socket.
struct DatagramSink {
    socket: Arc<UdpSocket>,
    peer: SocketAddr,
}

#[async_trait]
impl ReplySink for DatagramSink {
    async fn send_bytes(&mut self, wire: Vec<u8>) -> Result<(), TransportError> {
        self.socket
            .send_to(&wire, self.peer)
            .await
            .map_err(|e| TransportError::io(DnsAddr::Udp(self.peer), e))?;
        Ok(())
    }
}

/// Writes length-prefixed replies to a stream connection. The lock is held
/// for the whole frame, and a peer that stops reading gets `write_timeout`
/// before the write fails.
struct StreamSink<S> {
    writer: Arc<Mutex<WriteHalf<S>>>,
    remote: DnsAddr,
    write_timeout: Duration,
    shutdown: CancellationToken,
}

#[async_trait]
impl<S> ReplySink for StreamSink<S>
where
    S: AsyncRead + AsyncWrite + Send + Unpin,
{
    async fn send_bytes(&mut self, wire: Vec<u8>) -> Result<(), TransportError> {
        let remote = self.remote;
        let writer = self.writer.clone();
        guarded(&self.shutdown, self.write_timeout, &remote, async move {
            let mut writer = writer.lock().await;
            send_with_length_prefix(&mut *writer, &wire, &remote).await
        })
        .await
    }
}
