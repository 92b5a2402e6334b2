use std::net::SocketAddr;
use wiredns_domain::{DnsAddr, Message, Query, MAX_UDP_MESSAGE_SIZE};

#[test]
fn test_parse_udp() {
    let addr: DnsAddr = "udp://127.0.0.1:53".parse().unwrap();
    assert!(matches!(addr, DnsAddr::Udp(_)));
}

#[test]
fn test_parse_udp_default() {
    let addr: DnsAddr = "8.8.8.8:53".parse().unwrap();
    assert!(matches!(addr, DnsAddr::Udp(_)));
}

#[test]
fn test_parse_tcp() {
    let addr: DnsAddr = "tcp://8.8.8.8:53".parse().unwrap();
    assert!(matches!(addr, DnsAddr::Tcp(_)));
}

#[test]
fn test_parse_tls_ipv6() {
    let addr: DnsAddr = "tls://[::1]:853".parse().unwrap();
    assert_eq!(addr, DnsAddr::Tls("[::1]:853".parse().unwrap()));
}

#[test]
fn test_parse_invalid() {
    assert!("tls://dns.google:853".parse::<DnsAddr>().is_err());
    assert!("quic://1.1.1.1:853".parse::<DnsAddr>().is_err());
}

#[test]
fn test_display_round_trip() {
    for s in ["udp://1.1.1.1:53", "tcp://1.1.1.1:53", "tls://1.1.1.1:853"] {
        let addr: DnsAddr = s.parse().unwrap();
        assert_eq!(addr.to_string(), s);
    }
}

#[test]
fn test_max_message_size_by_tag() {
    let sock: SocketAddr = "127.0.0.1:5353".parse().unwrap();
    assert_eq!(
        DnsAddr::Udp(sock).max_message_size(),
        Some(MAX_UDP_MESSAGE_SIZE)
    );
    assert_eq!(DnsAddr::Tcp(sock).max_message_size(), None);
    assert_eq!(DnsAddr::Tls(sock).max_message_size(), None);
}

#[test]
fn test_with_socket_addr_keeps_tag() {
    let a: SocketAddr = "127.0.0.1:1".parse().unwrap();
    let b: SocketAddr = "127.0.0.1:2".parse().unwrap();
    assert_eq!(DnsAddr::Tls(a).with_socket_addr(b), DnsAddr::Tls(b));
    assert_eq!(DnsAddr::Udp(a).with_socket_addr(b), DnsAddr::Udp(b));
}

#[test]
fn test_query_reply_limit_follows_remote_addr() {
    let sock: SocketAddr = "10.0.0.1:40000".parse().unwrap();
    let udp = Query::new(Message::default(), DnsAddr::Udp(sock));
    let tcp = Query::new(Message::default(), DnsAddr::Tcp(sock));
    assert_eq!(udp.max_reply_size(), Some(512));
    assert_eq!(tcp.max_reply_size(), None);
}
