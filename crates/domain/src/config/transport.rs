use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TransportConfig {
    /// Deadline applied to each dial, handshake, send and receive.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Name the server certificate must match on TLS dials.
    #[serde(default)]
    pub tls_server_name: Option<String>,

    /// PEM bundle of trusted roots; the webpki roots are used when unset.
    #[serde(default)]
    pub tls_ca_path: Option<String>,
}

impl TransportConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            tls_server_name: None,
            tls_ca_path: None,
        }
    }
}

fn default_timeout() -> u64 {
    5
}
