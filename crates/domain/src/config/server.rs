use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Port for both UDP and TCP listeners.
    #[serde(default = "default_dns_port")]
    pub dns_port: u16,

    /// DNS-over-TLS port; only used when certificate and key are configured.
    #[serde(default = "default_tls_port")]
    pub tls_port: u16,

    #[serde(default)]
    pub tls_cert_path: Option<String>,

    #[serde(default)]
    pub tls_key_path: Option<String>,

    /// Idle stream connections are closed after this many seconds.
    #[serde(default = "default_tcp_idle_timeout")]
    pub tcp_idle_timeout_secs: u64,
}

impl ServerConfig {
    pub fn dns_addr(&self) -> Result<SocketAddr, String> {
        self.socket_addr(self.dns_port)
    }

    pub fn tls_addr(&self) -> Result<SocketAddr, String> {
        self.socket_addr(self.tls_port)
    }

    pub fn tls_enabled(&self) -> bool {
        self.tls_cert_path.is_some() && self.tls_key_path.is_some()
    }

    pub fn tcp_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.tcp_idle_timeout_secs)
    }

    fn socket_addr(&self, port: u16) -> Result<SocketAddr, String> {
        let ip: IpAddr = self
            .bind_address
            .parse()
            .map_err(|e| format!("Invalid bind address '{}': {}", self.bind_address, e))?;
        Ok(SocketAddr::new(ip, port))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            dns_port: default_dns_port(),
            tls_port: default_tls_port(),
            tls_cert_path: None,
            tls_key_path: None,
            tcp_idle_timeout_secs: default_tcp_idle_timeout(),
        }
    }
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_dns_port() -> u16 {
    53
}

fn default_tls_port() -> u16 {
    853
}

fn default_tcp_idle_timeout() -> u64 {
    10
}
