use rcgen::{
    BasicConstraints, CertificateParams, DnType, IsCa, KeyPair, KeyUsagePurpose,
};
use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;

/// A `ca.dev` root and a `dns-server.dev` leaf it signed.
pub struct DevPki {
    pub ca_der: CertificateDer<'static>,
    pub ca_pem: String,
    pub leaf_der: CertificateDer<'static>,
    pub leaf_pem: String,
    pub leaf_key_der: Vec<u8>,
    pub leaf_key_pem: String,
}

impl DevPki {
    pub fn generate() -> Self {
        let ca_key = KeyPair::generate().unwrap();
        let mut ca_params = CertificateParams::new(Vec::<String>::new()).unwrap();
        ca_params.distinguished_name.push(DnType::CommonName, "ca.dev");
        ca_params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        ca_params.key_usages = vec![
            KeyUsagePurpose::KeyCertSign,
            KeyUsagePurpose::CrlSign,
            KeyUsagePurpose::DigitalSignature,
        ];
        let ca_cert = ca_params.self_signed(&ca_key).unwrap();

        let leaf_key = KeyPair::generate().unwrap();
        let mut leaf_params =
            CertificateParams::new(vec!["dns-server.dev".to_string()]).unwrap();
        leaf_params
            .distinguished_name
            .push(DnType::CommonName, "dns-server.dev");
        let leaf_cert = leaf_params
            .signed_by(&leaf_key, &ca_cert, &ca_key)
            .unwrap();

        Self {
            ca_der: ca_cert.der().clone(),
            ca_pem: ca_cert.pem(),
            leaf_der: leaf_cert.der().clone(),
            leaf_pem: leaf_cert.pem(),
            leaf_key_der: leaf_key.serialize_der(),
            leaf_key_pem: leaf_key.serialize_pem(),
        }
    }

    /// Server chain: the leaf followed by the CA.
    pub fn server_chain(&self) -> Vec<CertificateDer<'static>> {
        vec![self.leaf_der.clone(), self.ca_der.clone()]
    }

    pub fn server_key(&self) -> PrivateKeyDer<'static> {
        PrivatePkcs8KeyDer::from(self.leaf_key_der.clone()).into()
    }

    pub fn server_config(&self) -> Arc<rustls::ServerConfig> {
        wiredns_infrastructure::dns::transport::tls::server_config(
            self.server_chain(),
            self.server_key(),
        )
        .unwrap()
    }

    pub fn client_config(&self) -> Arc<rustls::ClientConfig> {
        wiredns_infrastructure::dns::transport::tls::client_config(vec![self.ca_der.clone()])
            .unwrap()
    }

    pub fn write_pem(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }
}
