//! WireDNS Domain Layer
//!
//! Message model, wire codec, tagged transport addresses, errors and
//! configuration. No I/O happens here.
pub mod config;
pub mod dns_addr;
pub mod dns_record;
pub mod errors;
pub mod message;
pub mod query;
pub mod question;
pub mod resource;
pub mod wire;

pub use config::{Config, ConfigError, LocalDnsRecord, ServerConfig, TransportConfig};
pub use dns_addr::DnsAddr;
pub use dns_record::{Record, RecordClass, RecordData, RecordType};
pub use errors::{TransportError, WireError};
pub use message::{Message, OpCode, ResponseCode};
pub use query::{Query, MAX_STREAM_MESSAGE_SIZE, MAX_UDP_MESSAGE_SIZE};
pub use question::Question;
pub use resource::Resource;
