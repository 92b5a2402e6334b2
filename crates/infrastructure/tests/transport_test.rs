mod helpers;

use helpers::{query, DevPki, TestServer};
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;
use wiredns_application::{AnswerTable, Handler};
use wiredns_domain::{
    DnsAddr, Message, Question, RecordType, Resource, ServerConfig, TransportConfig,
    TransportError, WireError,
};
use wiredns_infrastructure::{Client, DnsServer, Transport};

fn address_record(last_octet: u8) -> Resource {
    Resource::new(
        "dns-server.dev.",
        Duration::from_secs(60),
        Ipv4Addr::new(10, 0, 0, last_octet),
    )
}

fn answer_table() -> Arc<dyn Handler> {
    let question = Question::new("dns-server.dev.", RecordType::A);
    Arc::new(
        AnswerTable::new()
            .with(question.clone(), address_record(1))
            .with(question, address_record(2)),
    )
}

fn tls_transport(pki: &DevPki) -> Transport {
    Transport::new()
        .with_tls_config(pki.client_config())
        .with_tls_server_name("dns-server.dev")
        .with_timeout(Duration::from_secs(2))
}

// ── udp / tcp / tls ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_tls_exchange_matches_plain_tcp() {
    let pki = DevPki::generate();
    let server = TestServer::start_tls(answer_table(), pki.server_config()).await;
    let client = Client::new(tls_transport(&pki));

    let over_tcp = client
        .exchange(&query(1, "dns-server.dev", RecordType::A, server.tcp()))
        .await
        .unwrap();
    let over_tls = client
        .exchange(&query(1, "dns-server.dev", RecordType::A, server.tls()))
        .await
        .unwrap();

    assert_eq!(over_tcp.answers.len(), 2);
    assert_eq!(over_tcp, over_tls);
}

#[tokio::test]
async fn test_connection_reports_target_and_peer() {
    let server = TestServer::start(answer_table()).await;
    let transport = Transport::new().with_timeout(Duration::from_secs(2));

    for target in [server.udp(), server.tcp()] {
        let mut conn = transport.dial(&target).await.unwrap();
        assert_eq!(conn.remote_addr(), target);
        assert_eq!(conn.peer_addr(), server.addr);

        conn.send(&Message::query(2, Question::new("dns-server.dev", RecordType::A)))
            .await
            .unwrap();
        let reply = conn.recv().await.unwrap();
        assert_eq!(reply.id, 2);
        assert_eq!(reply.answers.len(), 2);
    }
}

#[tokio::test]
async fn test_tls_server_name_mismatch_fails_handshake() {
    let pki = DevPki::generate();
    let server = TestServer::start_tls(answer_table(), pki.server_config()).await;
    let transport = Transport::new()
        .with_tls_config(pki.client_config())
        .with_tls_server_name("other.dev")
        .with_timeout(Duration::from_secs(2));

    let result = transport.dial(&server.tls()).await;

    assert!(matches!(result, Err(TransportError::Handshake { .. })));
}

#[tokio::test]
async fn test_tls_untrusted_chain_fails_handshake() {
    let pki = DevPki::generate();
    let server = TestServer::start_tls(answer_table(), pki.server_config()).await;
    let transport = Transport::new()
        .with_tls_server_name("dns-server.dev")
        .with_timeout(Duration::from_secs(2));

    let result = transport.dial(&server.tls()).await;

    assert!(matches!(result, Err(TransportError::Handshake { .. })));
}

#[tokio::test]
async fn test_tls_material_loaded_from_pem_files() {
    let pki = DevPki::generate();
    let chain = DevPki::write_pem(&format!("{}{}", pki.leaf_pem, pki.ca_pem));
    let key = DevPki::write_pem(&pki.leaf_key_pem);
    let ca = DevPki::write_pem(&pki.ca_pem);

    let config = ServerConfig {
        bind_address: "127.0.0.1".to_string(),
        tls_cert_path: Some(chain.path().to_string_lossy().into_owned()),
        tls_key_path: Some(key.path().to_string_lossy().into_owned()),
        ..ServerConfig::default()
    };
    let shutdown = CancellationToken::new();
    let server = Arc::new(
        DnsServer::from_config(config, answer_table())
            .unwrap()
            .with_cancellation(shutdown.clone()),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let serving = server.clone();
    tokio::spawn(async move { serving.serve_tls(listener).await });

    let transport = Transport::from_config(&TransportConfig {
        timeout_secs: 2,
        tls_server_name: Some("dns-server.dev".to_string()),
        tls_ca_path: Some(ca.path().to_string_lossy().into_owned()),
    })
    .unwrap();

    let response = Client::new(transport)
        .exchange(&query(3, "dns-server.dev", RecordType::A, DnsAddr::Tls(addr)))
        .await
        .unwrap();

    assert_eq!(response.answers.len(), 2);
    shutdown.cancel();
}

// ── proxy ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_proxy_redirects_every_dial() {
    let pki = DevPki::generate();
    let server = TestServer::start_tls(answer_table(), pki.server_config()).await;
    let plain = server.addr;
    let tls = server.tls_addr.unwrap();

    let transport = tls_transport(&pki).with_proxy(
        move |target: &DnsAddr| -> Result<SocketAddr, TransportError> {
            match target {
                DnsAddr::Tls(_) => Ok(tls),
                DnsAddr::Udp(_) | DnsAddr::Tcp(_) => Ok(plain),
            }
        },
    );

    let targets: [DnsAddr; 3] = [
        "udp://192.0.2.1:53".parse().unwrap(),
        "tcp://192.0.2.2:53".parse().unwrap(),
        "tls://192.0.2.3:853".parse().unwrap(),
    ];
    for target in targets {
        let mut conn = transport.dial(&target).await.unwrap();
        assert_eq!(conn.remote_addr(), target);
        let expected = if matches!(target, DnsAddr::Tls(_)) {
            tls
        } else {
            plain
        };
        assert_eq!(conn.peer_addr(), expected);

        conn.send(&Message::query(4, Question::new("dns-server.dev", RecordType::A)))
            .await
            .unwrap();
        assert_eq!(conn.recv().await.unwrap().answers.len(), 2);
    }
}

#[tokio::test]
async fn test_proxy_error_fails_dial() {
    let transport = Transport::new().with_proxy(
        |target: &DnsAddr| -> Result<SocketAddr, TransportError> {
            Err(TransportError::Dial {
                server: target.to_string(),
                reason: "no route".to_string(),
            })
        },
    );

    let result = transport.dial(&"tcp://192.0.2.1:53".parse().unwrap()).await;

    assert!(matches!(result, Err(TransportError::Dial { .. })));
}

// ── failures ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_udp_send_rejects_oversized_message() {
    let silent = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let target = DnsAddr::Udp(silent.local_addr().unwrap());
    let mut conn = Transport::new().dial(&target).await.unwrap();

    let mut message = Message::query(5, Question::new("big.local", RecordType::A));
    for i in 0..40 {
        message.answers.push(Resource::new(
            &format!("host-{}.big.local.", i),
            Duration::from_secs(60),
            Ipv4Addr::new(10, 0, 0, i as u8),
        ));
    }

    let err = conn.send(&message).await.unwrap_err();
    assert!(matches!(
        err,
        TransportError::Wire(WireError::MessageTooLarge { limit: 512, .. })
    ));
}

#[tokio::test]
async fn test_recv_times_out_on_silent_peer() {
    let silent = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let target = DnsAddr::Udp(silent.local_addr().unwrap());
    let transport = Transport::new().with_timeout(Duration::from_millis(100));
    let mut conn = transport.dial(&target).await.unwrap();

    let err = conn.recv().await.unwrap_err();

    assert!(matches!(err, TransportError::Timeout { .. }));
}

#[tokio::test]
async fn test_recv_unblocks_on_cancellation() {
    let silent = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let target = DnsAddr::Udp(silent.local_addr().unwrap());
    let token = CancellationToken::new();
    let transport = Transport::new()
        .with_timeout(Duration::from_secs(30))
        .with_cancellation(token.clone());
    let mut conn = transport.dial(&target).await.unwrap();

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        token.cancel();
    });
    let err = conn.recv().await.unwrap_err();
    canceller.await.unwrap();

    assert!(matches!(err, TransportError::Cancelled));
}

#[tokio::test]
async fn test_refused_tcp_dial_fails() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let result = Transport::new().dial(&DnsAddr::Tcp(addr)).await;

    assert!(matches!(result, Err(TransportError::Dial { .. })));
}

#[tokio::test]
async fn test_client_rejects_mismatched_response_id() {
    let fake = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let addr = fake.local_addr().unwrap();
    tokio::spawn(async move {
        let mut buf = [0u8; 512];
        let (len, from) = fake.recv_from(&mut buf).await.unwrap();
        let request = Message::from_wire(&buf[..len]).unwrap();
        let mut reply = request.reply();
        reply.id = request.id.wrapping_add(1);
        fake.send_to(&reply.to_wire(None).unwrap(), from).await.unwrap();
    });

    let client = Client::new(Transport::new().with_timeout(Duration::from_secs(2)));
    let err = client
        .exchange(&query(6, "test.local", RecordType::A, DnsAddr::Udp(addr)))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        TransportError::IdMismatch {
            expected: 6,
            got: 7
        }
    ));
}
