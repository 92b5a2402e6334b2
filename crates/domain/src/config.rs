pub mod errors;
pub mod local_records;
pub mod root;
pub mod server;
pub mod transport;

pub use errors::ConfigError;
pub use local_records::LocalDnsRecord;
pub use root::Config;
pub use server::ServerConfig;
pub use transport::TransportConfig;
