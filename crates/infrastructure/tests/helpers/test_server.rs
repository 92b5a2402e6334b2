use std::net::SocketAddr;
use std::sync::{Arc, Once};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use wiredns_application::Handler;
use wiredns_domain::{DnsAddr, Message, Query, Question, RecordType, ServerConfig, TransportError};
use wiredns_infrastructure::dns::{create_udp_socket, DnsServer};

static TRACING: Once = Once::new();

pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub fn query(id: u16, name: &str, record_type: RecordType, remote: DnsAddr) -> Query {
    Query::new(Message::query(id, Question::new(name, record_type)), remote)
}

/// A port that was free a moment ago, for tests that bind by configuration.
pub async fn free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

/// A server on loopback with TCP and UDP sharing one port, and an optional
/// TLS listener. Cancelled on drop.
pub struct TestServer {
    pub addr: SocketAddr,
    pub tls_addr: Option<SocketAddr>,
    shutdown: CancellationToken,
    tasks: Vec<JoinHandle<Result<(), TransportError>>>,
}

impl TestServer {
    pub async fn start(handler: Arc<dyn Handler>) -> Self {
        Self::start_with(handler, None).await
    }

    pub async fn start_tls(handler: Arc<dyn Handler>, tls: Arc<rustls::ServerConfig>) -> Self {
        Self::start_with(handler, Some(tls)).await
    }

    async fn start_with(
        handler: Arc<dyn Handler>,
        tls: Option<Arc<rustls::ServerConfig>>,
    ) -> Self {
        init_tracing();
        let shutdown = CancellationToken::new();

        let config = ServerConfig {
            bind_address: "127.0.0.1".to_string(),
            ..ServerConfig::default()
        };
        let mut server = DnsServer::new(config, handler).with_cancellation(shutdown.clone());
        if let Some(tls) = tls.clone() {
            server = server.with_tls(tls);
        }
        let server = Arc::new(server);

        let (tcp_listener, udp_socket) = bind_pair().await;
        let addr = tcp_listener.local_addr().unwrap();

        let mut tasks = Vec::new();
        let s = server.clone();
        tasks.push(tokio::spawn(async move { s.serve_tcp(tcp_listener).await }));
        let s = server.clone();
        tasks.push(tokio::spawn(async move { s.serve_udp(udp_socket).await }));

        let mut tls_addr = None;
        if tls.is_some() {
            let tls_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            tls_addr = Some(tls_listener.local_addr().unwrap());
            let s = server.clone();
            tasks.push(tokio::spawn(async move { s.serve_tls(tls_listener).await }));
        }

        Self {
            addr,
            tls_addr,
            shutdown,
            tasks,
        }
    }

    pub fn udp(&self) -> DnsAddr {
        DnsAddr::Udp(self.addr)
    }

    pub fn tcp(&self) -> DnsAddr {
        DnsAddr::Tcp(self.addr)
    }

    pub fn tls(&self) -> DnsAddr {
        DnsAddr::Tls(self.tls_addr.expect("server started without TLS"))
    }

    /// Cancels the server and returns what each serve loop ended with.
    pub async fn shutdown(mut self) -> Vec<Result<(), TransportError>> {
        self.shutdown.cancel();
        let mut results = Vec::new();
        for task in self.tasks.drain(..) {
            results.push(task.await.unwrap());
        }
        results
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn bind_pair() -> (TcpListener, tokio::net::UdpSocket) {
    for _ in 0..16 {
        let tcp_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = tcp_listener.local_addr().unwrap();
        if let Ok(udp_socket) = create_udp_socket(addr) {
            return (tcp_listener, udp_socket);
        }
    }
    panic!("no port free for both TCP and UDP");
}
