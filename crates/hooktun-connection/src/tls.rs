//! TLS trust construction for the relay connection
//!
//! The client always presents a certificate. Server verification depends on
//! the manifest: with a root CA file the relay must chain to it; without one
//! verification is skipped entirely, which self-signed relay deployments rely
//! on. There is no fallback to system roots.

use rustls::pki_types::{CertificateDer, PrivateKeyDer, ServerName};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// TLS configuration errors
#[derive(Debug, Error)]
pub enum TlsError {
    #[error("failed to load key pair: {0}")]
    KeyPair(String),

    #[error("failed to read root CA {path:?}: {source}")]
    RootCaRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no valid certificates in root CA {0:?}")]
    EmptyRootCa(PathBuf),

    #[error("invalid server address {addr:?}: {reason}")]
    ServerAddress { addr: String, reason: &'static str },

    #[error("invalid server name {0:?}")]
    ServerName(String),
}

/// Provider of the client certificate chain and private key
pub trait CertificateSource {
    fn key_pair(
        &self,
    ) -> Result<(Vec<CertificateDer<'static>>, PrivateKeyDer<'static>), TlsError>;

    /// Leaf certificate presented to the relay
    fn certificate(&self) -> Result<CertificateDer<'static>, TlsError> {
        let (chain, _) = self.key_pair()?;
        chain
            .into_iter()
            .next()
            .ok_or_else(|| TlsError::KeyPair("no certificate found".to_string()))
    }
}

/// PEM-encoded credentials, inline or on disk
#[derive(Debug, Clone)]
pub enum PemCredentials {
    Inline { cert: String, key: String },
    Files { cert: PathBuf, key: PathBuf },
}

impl PemCredentials {
    pub fn from_pem(cert: impl Into<String>, key: impl Into<String>) -> Self {
        PemCredentials::Inline {
            cert: cert.into(),
            key: key.into(),
        }
    }

    pub fn from_files(cert: impl Into<PathBuf>, key: impl Into<PathBuf>) -> Self {
        PemCredentials::Files {
            cert: cert.into(),
            key: key.into(),
        }
    }

    fn read(&self) -> Result<(Vec<u8>, Vec<u8>), TlsError> {
        match self {
            PemCredentials::Inline { cert, key } => {
                Ok((cert.as_bytes().to_vec(), key.as_bytes().to_vec()))
            }
            PemCredentials::Files { cert, key } => {
                let read = |path: &Path| {
                    std::fs::read(path)
                        .map_err(|e| TlsError::KeyPair(format!("{}: {}", path.display(), e)))
                };
                Ok((read(cert)?, read(key)?))
            }
        }
    }
}

impl CertificateSource for PemCredentials {
    fn key_pair(
        &self,
    ) -> Result<(Vec<CertificateDer<'static>>, PrivateKeyDer<'static>), TlsError> {
        let (cert_pem, key_pem) = self.read()?;

        let certs = rustls_pemfile::certs(&mut cert_pem.as_slice())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| TlsError::KeyPair(format!("failed to parse certs: {}", e)))?;
        if certs.is_empty() {
            return Err(TlsError::KeyPair("no certificate found".to_string()));
        }

        let key = rustls_pemfile::private_key(&mut key_pem.as_slice())
            .map_err(|e| TlsError::KeyPair(format!("failed to parse key: {}", e)))?
            .ok_or_else(|| TlsError::KeyPair("no private key found".to_string()))?;

        Ok((certs, key))
    }
}

/// Client TLS configuration for the relay connection
#[derive(Debug, Clone)]
pub struct TlsClientConfig {
    /// Name the relay certificate is verified against
    pub server_name: ServerName<'static>,
    /// True when no root CA was configured
    pub insecure_skip_verify: bool,
    config: Arc<rustls::ClientConfig>,
}

impl TlsClientConfig {
    pub fn client_config(&self) -> Arc<rustls::ClientConfig> {
        self.config.clone()
    }

    /// Build a tokio-rustls connector for this configuration
    pub fn connector(&self) -> tokio_rustls::TlsConnector {
        tokio_rustls::TlsConnector::from(self.config.clone())
    }
}

/// Build the client TLS configuration
pub fn build_tls_config(
    server_addr: &str,
    root_ca: Option<&Path>,
    source: &dyn CertificateSource,
) -> Result<TlsClientConfig, TlsError> {
    ensure_crypto_provider();

    let (certs, key) = source.key_pair()?;

    let roots = match root_ca {
        Some(path) => Some(load_root_ca(path)?),
        None => None,
    };

    let (host, _port) = split_host_port(server_addr)?;
    let server_name = ServerName::try_from(host)
        .map(|name| name.to_owned())
        .map_err(|_| TlsError::ServerName(host.to_string()))?;

    let builder = rustls::ClientConfig::builder();
    let insecure_skip_verify = roots.is_none();
    let config = match roots {
        Some(roots) => builder
            .with_root_certificates(roots)
            .with_client_auth_cert(certs, key),
        None => {
            warn!("No root CA configured, relay certificate will not be verified");
            builder
                .dangerous()
                .with_custom_certificate_verifier(SkipVerification::new())
                .with_client_auth_cert(certs, key)
        }
    }
    .map_err(|e| TlsError::KeyPair(e.to_string()))?;

    debug!(
        "TLS configured for {} (verify server: {})",
        host, !insecure_skip_verify
    );

    Ok(TlsClientConfig {
        server_name,
        insecure_skip_verify,
        config: Arc::new(config),
    })
}

fn load_root_ca(path: &Path) -> Result<rustls::RootCertStore, TlsError> {
    let pem = std::fs::read(path).map_err(|source| TlsError::RootCaRead {
        path: path.to_path_buf(),
        source,
    })?;

    // Unparsable blocks are skipped; only an empty pool is fatal
    let mut reader = pem.as_slice();
    let certs = rustls_pemfile::certs(&mut reader).filter_map(Result::ok);

    let mut roots = rustls::RootCertStore::empty();
    let (added, ignored) = roots.add_parsable_certificates(certs);
    if added == 0 {
        return Err(TlsError::EmptyRootCa(path.to_path_buf()));
    }
    debug!(
        "Loaded {} root certificates from {:?} ({} ignored)",
        added, path, ignored
    );

    Ok(roots)
}

/// Split `host:port` or `[v6]:port` into its parts
fn split_host_port(addr: &str) -> Result<(&str, &str), TlsError> {
    let invalid = |reason| TlsError::ServerAddress {
        addr: addr.to_string(),
        reason,
    };

    if let Some(rest) = addr.strip_prefix('[') {
        let (host, tail) = rest.split_once(']').ok_or_else(|| invalid("missing ']'"))?;
        let port = tail
            .strip_prefix(':')
            .ok_or_else(|| invalid("missing port in address"))?;
        return Ok((host, port));
    }

    let (host, port) = addr
        .rsplit_once(':')
        .ok_or_else(|| invalid("missing port in address"))?;
    if host.contains(':') {
        return Err(invalid("too many colons in address"));
    }
    Ok((host, port))
}

// Initialize rustls crypto provider
static CRYPTO_PROVIDER_INIT: std::sync::Once = std::sync::Once::new();

fn ensure_crypto_provider() {
    CRYPTO_PROVIDER_INIT.call_once(|| {
        if rustls::crypto::ring::default_provider()
            .install_default()
            .is_err()
        {
            tracing::debug!("Rustls crypto provider already installed");
        }
    });
}

// Certificate verifier that skips verification (INSECURE)
#[derive(Debug)]
struct SkipVerification;

impl SkipVerification {
    fn new() -> Arc<Self> {
        Arc::new(Self)
    }
}

impl rustls::client::danger::ServerCertVerifier for SkipVerification {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: rustls::pki_types::UnixTime,
    ) -> Result<rustls::client::danger::ServerCertVerified, rustls::Error> {
        Ok(rustls::client::danger::ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<rustls::SignatureScheme> {
        use rustls::SignatureScheme;
        vec![
            SignatureScheme::RSA_PKCS1_SHA256,
            SignatureScheme::RSA_PKCS1_SHA384,
            SignatureScheme::RSA_PKCS1_SHA512,
            SignatureScheme::ECDSA_NISTP256_SHA256,
            SignatureScheme::ECDSA_NISTP384_SHA384,
            SignatureScheme::ECDSA_NISTP521_SHA512,
            SignatureScheme::RSA_PSS_SHA256,
            SignatureScheme::RSA_PSS_SHA384,
            SignatureScheme::RSA_PSS_SHA512,
            SignatureScheme::ED25519,
            SignatureScheme::ED448,
        ]
    }
}
