//! WireDNS Infrastructure Layer
//!
//! Socket-level transports (UDP, TCP, TLS), the serving loops and the
//! single-exchange client.
pub mod dns;

pub use dns::{Client, Connection, DnsServer, Proxy, Transport};
