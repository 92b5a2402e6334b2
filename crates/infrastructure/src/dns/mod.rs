pub mod client;
pub mod listener;
pub mod server;
pub mod transport;

pub use client::Client;
pub use listener::{create_tcp_listener, create_udp_socket};
pub use server::DnsServer;
pub use transport::{Connection, Proxy, Transport};
