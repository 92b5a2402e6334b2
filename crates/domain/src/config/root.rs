use serde::{Deserialize, Serialize};

use super::errors::ConfigError;
use super::local_records::LocalDnsRecord;
use super::server::ServerConfig;
use super::transport::TransportConfig;

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub transport: TransportConfig,

    /// Domain appended to local records that carry none.
    #[serde(default)]
    pub local_domain: Option<String>,

    #[serde(default)]
    pub local_records: Vec<LocalDnsRecord>,
}

impl Config {
    /// Load configuration from file or use defaults
    ///
    /// Priority order:
    /// 1. Explicitly provided path
    /// 2. wiredns.toml in current directory
    /// 3. Default configuration
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let config = if let Some(path) = path {
            Self::from_file(path)?
        } else if std::path::Path::new("wiredns.toml").exists() {
            Self::from_file("wiredns.toml")?
        } else {
            Self::default()
        };

        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_string(), e.to_string()))?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server
            .dns_addr()
            .map_err(ConfigError::Validation)?;

        if self.server.tls_cert_path.is_some() != self.server.tls_key_path.is_some() {
            return Err(ConfigError::Validation(
                "tls_cert_path and tls_key_path must be set together".to_string(),
            ));
        }

        if self.server.tcp_idle_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "TCP idle timeout cannot be 0".to_string(),
            ));
        }

        if self.transport.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "Transport timeout cannot be 0".to_string(),
            ));
        }

        for record in &self.local_records {
            record
                .to_resource(&self.local_domain)
                .map_err(ConfigError::Validation)?;
        }

        Ok(())
    }
}
