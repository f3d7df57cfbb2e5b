//! Tunnel manifest: loading, synthesis and subset resolution
//!
//! A manifest is built once per run, either from a YAML file or from the
//! quick start flags. Resolving the tunnels to start produces a new
//! manifest and consumes the input.

use crate::backoff::BackoffSettings;
use hooktun_connection::{
    build_tls_config, BackoffPolicy, CertificateSource, PemCredentials, TlsClientConfig, TlsError,
};
use hooktun_proto::{TunnelDefinition, TunnelProtocol, TunnelRequest};
use hooktun_router::{AddressError, RoutingTable};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Manifest file used when `--config` is not given
pub const DEFAULT_CONFIG_PATH: &str = "tunnel.yml";

/// Relay used by quick start
pub const QUICK_START_RELAY: &str = "tunnel.arumiot.com:5223";

/// Name of the single tunnel quick start synthesizes
pub const QUICK_START_TUNNEL: &str = "webui";

/// Manifest could not be loaded
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse manifest: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("{0}")]
    Invalid(String),
}

/// Requested tunnel set cannot be started
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("no such tunnel {0:?}")]
    NoSuchTunnel(String),

    #[error("no tunnels")]
    NoTunnels,
}

/// Named tunnel definitions plus server-level settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Relay address, `host:port`
    #[serde(default)]
    pub server_addr: String,

    /// PEM bundle the relay certificate must chain to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_ca: Option<PathBuf>,

    /// Client certificate replacing the built-in one (requires `tls_key`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_crt: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_key: Option<PathBuf>,

    #[serde(default)]
    pub backoff: BackoffSettings,

    #[serde(default)]
    pub tunnels: BTreeMap<String, TunnelDefinition>,
}

impl Manifest {
    /// Load a manifest from a YAML file
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let content = std::fs::read_to_string(path).map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let manifest = Self::parse(&content)?;
        debug!(
            "Loaded {} tunnel(s) from {:?}",
            manifest.tunnels.len(),
            path
        );
        Ok(manifest)
    }

    /// Parse and validate a manifest from a YAML string
    pub fn parse(content: &str) -> Result<Self, ManifestError> {
        let mut manifest: Manifest = serde_yaml::from_str(content)?;

        for (name, tunnel) in manifest.tunnels.iter_mut() {
            tunnel.name = name.clone();
            normalize(tunnel);
        }

        manifest.validate()?;
        Ok(manifest)
    }

    /// Synthesize a single-tunnel manifest from quick start flags
    pub fn quick_start(protocol: TunnelProtocol, host: &str, port: u16) -> Self {
        let local_addr = format!("{}://localhost:{}", protocol.local_scheme(), port);
        let tunnel = TunnelDefinition::new(QUICK_START_TUNNEL, protocol, &local_addr).with_host(host);

        Self {
            server_addr: QUICK_START_RELAY.to_string(),
            root_ca: None,
            tls_crt: None,
            tls_key: None,
            backoff: BackoffSettings::default(),
            tunnels: BTreeMap::from([(QUICK_START_TUNNEL.to_string(), tunnel)]),
        }
    }

    fn validate(&self) -> Result<(), ManifestError> {
        if self.server_addr.is_empty() {
            return Err(ManifestError::Invalid("server_addr: missing".to_string()));
        }

        if self.tls_crt.is_some() != self.tls_key.is_some() {
            return Err(ManifestError::Invalid(
                "tls_crt and tls_key must be set together".to_string(),
            ));
        }

        for (name, tunnel) in &self.tunnels {
            let missing = |field: &str| {
                ManifestError::Invalid(format!("tunnel {:?}: {} missing", name, field))
            };

            if tunnel.local_addr.is_empty() {
                return Err(missing("addr"));
            }
            match tunnel.protocol {
                TunnelProtocol::Http | TunnelProtocol::Sni => {
                    if tunnel.host.is_empty() {
                        return Err(missing("host"));
                    }
                }
                TunnelProtocol::Tcp | TunnelProtocol::Tcp4 | TunnelProtocol::Tcp6 => {
                    if tunnel.remote_addr.is_empty() {
                        return Err(missing("remote_addr"));
                    }
                }
            }
        }

        Ok(())
    }

    /// Tunnel names in ascending order
    pub fn tunnel_names(&self) -> Vec<String> {
        // BTreeMap keys are already ordered
        self.tunnels.keys().cloned().collect()
    }

    /// Keep only the named tunnels
    ///
    /// Fails on the first unknown name; nothing is selected in that case.
    pub fn select(self, names: &[String]) -> Result<Self, ValidationError> {
        let mut tunnels = BTreeMap::new();
        for name in names {
            let tunnel = self
                .tunnels
                .get(name)
                .ok_or_else(|| ValidationError::NoSuchTunnel(name.clone()))?;
            tunnels.insert(name.clone(), tunnel.clone());
        }

        Ok(Self { tunnels, ..self })
    }

    /// Fail when there is nothing to start
    pub fn ensure_tunnels(&self) -> Result<(), ValidationError> {
        if self.tunnels.is_empty() {
            return Err(ValidationError::NoTunnels);
        }
        Ok(())
    }

    /// Root CA path, treating an empty value as unset
    pub fn root_ca_path(&self) -> Option<&Path> {
        self.root_ca
            .as_deref()
            .filter(|path| !path.as_os_str().is_empty())
    }

    /// Client credentials configured in the manifest, if any
    pub fn credentials(&self) -> Option<PemCredentials> {
        match (&self.tls_crt, &self.tls_key) {
            (Some(crt), Some(key)) => Some(PemCredentials::from_files(crt, key)),
            _ => None,
        }
    }

    pub fn backoff_policy(&self) -> BackoffPolicy {
        BackoffPolicy::from(&self.backoff)
    }

    pub fn tls_config(&self, source: &dyn CertificateSource) -> Result<TlsClientConfig, TlsError> {
        build_tls_config(&self.server_addr, self.root_ca_path(), source)
    }

    pub fn routing_table(&self) -> Result<RoutingTable, AddressError> {
        RoutingTable::compile(&self.tunnels)
    }

    /// Registration requests for every tunnel, keyed by name
    pub fn tunnel_requests(&self) -> BTreeMap<String, TunnelRequest> {
        self.tunnels
            .iter()
            .map(|(name, tunnel)| (name.clone(), tunnel.request()))
            .collect()
    }
}

/// Fill in the shorthand forms accepted in manifest files
fn normalize(tunnel: &mut TunnelDefinition) {
    if tunnel.local_addr.is_empty() {
        return;
    }
    match tunnel.protocol {
        TunnelProtocol::Http if !tunnel.local_addr.contains("://") => {
            tunnel.local_addr = format!("http://{}", tunnel.local_addr);
        }
        TunnelProtocol::Tcp | TunnelProtocol::Tcp4 | TunnelProtocol::Tcp6 | TunnelProtocol::Sni
            if tunnel.local_addr.starts_with(':') =>
        {
            tunnel.local_addr = format!("127.0.0.1{}", tunnel.local_addr);
        }
        _ => {}
    }
}
