//! DNS-over-TLS (RFC 7858)
//!
//! Client side: a TCP connection wrapped in a rustls client session, framed
//! exactly like plain TCP. Without configured roots the shared webpki store
//! is used.
//!
//! Server side: certificate chain and private key from DER or PEM files.

use super::tcp::{self, StreamConnection};
use super::{guarded, Connection};
use rustls::pki_types::{CertificateDer, PrivateKeyDer, ServerName};
use std::fs::File;
use std::io::BufReader;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use wiredns_domain::{DnsAddr, TransportError};

/// Shared client config trusting the webpki roots, built once.
static SHARED_TLS_CONFIG: LazyLock<Arc<rustls::ClientConfig>> = LazyLock::new(|| {
    let mut root_store = rustls::RootCertStore::empty();
    root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    let config = rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    Arc::new(config)
});

pub fn default_client_config() -> Arc<rustls::ClientConfig> {
    SHARED_TLS_CONFIG.clone()
}

/// Client config trusting exactly `roots`.
pub fn client_config(
    roots: impl IntoIterator<Item = CertificateDer<'static>>,
) -> Result<Arc<rustls::ClientConfig>, TransportError> {
    let mut root_store = rustls::RootCertStore::empty();
    for cert in roots {
        root_store
            .add(cert)
            .map_err(|e| TransportError::Tls(format!("invalid root certificate: {}", e)))?;
    }
    if root_store.is_empty() {
        return Err(TransportError::Tls("no trusted roots supplied".to_string()));
    }

    let config = rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();
    Ok(Arc::new(config))
}

pub fn client_config_from_pem(
    ca_path: impl AsRef<Path>,
) -> Result<Arc<rustls::ClientConfig>, TransportError> {
    client_config(load_certs(ca_path.as_ref())?)
}

pub fn server_config(
    chain: Vec<CertificateDer<'static>>,
    key: PrivateKeyDer<'static>,
) -> Result<Arc<rustls::ServerConfig>, TransportError> {
    if chain.is_empty() {
        return Err(TransportError::Tls("empty certificate chain".to_string()));
    }

    let config = rustls::ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(chain, key)
        .map_err(|e| TransportError::Tls(format!("invalid certificate or key: {}", e)))?;
    Ok(Arc::new(config))
}

pub fn server_config_from_pem(
    cert_path: impl AsRef<Path>,
    key_path: impl AsRef<Path>,
) -> Result<Arc<rustls::ServerConfig>, TransportError> {
    let chain = load_certs(cert_path.as_ref())?;
    let key = load_private_key(key_path.as_ref())?;
    server_config(chain, key)
}

fn open(path: &Path) -> Result<BufReader<File>, TransportError> {
    File::open(path).map(BufReader::new).map_err(|e| {
        TransportError::Tls(format!("failed to open {}: {}", path.display(), e))
    })
}

fn load_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>, TransportError> {
    let mut reader = open(path)?;
    let certs = rustls_pemfile::certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| {
            TransportError::Tls(format!("failed to parse {}: {}", path.display(), e))
        })?;

    if certs.is_empty() {
        return Err(TransportError::Tls(format!(
            "no certificates found in {}",
            path.display()
        )));
    }
    Ok(certs)
}

fn load_private_key(path: &Path) -> Result<PrivateKeyDer<'static>, TransportError> {
    let mut reader = open(path)?;
    rustls_pemfile::private_key(&mut reader)
        .map_err(|e| TransportError::Tls(format!("failed to parse {}: {}", path.display(), e)))?
        .ok_or_else(|| TransportError::Tls(format!("no private key found in {}", path.display())))
}

/// Name the server certificate is checked against: the configured name, or
/// the target's IP address.
fn server_name(
    target: &DnsAddr,
    configured: Option<&str>,
) -> Result<ServerName<'static>, TransportError> {
    match configured {
        Some(name) => ServerName::try_from(name.to_string()).map_err(|e| {
            TransportError::Tls(format!("invalid TLS server name '{}': {}", name, e))
        }),
        None => Ok(ServerName::from(target.socket_addr().ip())),
    }
}

pub(super) async fn dial(
    target: &DnsAddr,
    connect_to: SocketAddr,
    config: Arc<rustls::ClientConfig>,
    configured_name: Option<&str>,
    timeout: Duration,
    shutdown: &CancellationToken,
) -> Result<Connection, TransportError> {
    let server_name = server_name(target, configured_name)?;
    let connector = tokio_rustls::TlsConnector::from(config);

    let tcp_stream = tcp::connect(target, connect_to, timeout, shutdown).await?;

    let tls_stream = guarded(shutdown, timeout, target, async {
        connector
            .connect(server_name, tcp_stream)
            .await
            .map_err(|e| TransportError::Handshake {
                server: target.to_string(),
                reason: e.to_string(),
            })
    })
    .await?;

    debug!(server = %target, peer = %connect_to, "TLS connection established");
    Ok(Connection::Tls(Box::new(StreamConnection::new(
        tls_stream,
        *target,
        connect_to,
        timeout,
        shutdown.clone(),
    ))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_name_falls_back_to_ip() {
        let target: DnsAddr = "tls://127.0.0.1:853".parse().unwrap();
        let name = server_name(&target, None).unwrap();
        assert!(matches!(name, ServerName::IpAddress(_)));
    }

    #[test]
    fn test_server_name_uses_configured_name() {
        let target: DnsAddr = "tls://127.0.0.1:853".parse().unwrap();
        let name = server_name(&target, Some("dns-server.dev")).unwrap();
        assert!(matches!(name, ServerName::DnsName(_)));
    }

    #[test]
    fn test_client_config_requires_roots() {
        let err = client_config(Vec::new()).unwrap_err();
        assert!(matches!(err, TransportError::Tls(_)));
    }

    #[test]
    fn test_missing_pem_file_is_reported() {
        let err = server_config_from_pem("/nonexistent/cert.pem", "/nonexistent/key.pem")
            .unwrap_err();
        assert!(matches!(err, TransportError::Tls(_)));
    }
}
