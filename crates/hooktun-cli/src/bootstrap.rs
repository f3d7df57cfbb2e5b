//! Bootstrap pipeline
//!
//! Turns a parsed invocation into either something to print or the
//! artifacts handed to the tunnel runtime. Nothing here touches the network.

use crate::command::{Command, Invocation};
use hooktun_client::{ClientArtifacts, Manifest, ManifestError, ValidationError};
use hooktun_connection::{CertificateSource, PemCredentials, RuntimeError, TlsError};
use hooktun_proto::ClientId;
use hooktun_router::AddressError;
use thiserror::Error;
use tracing::{debug, info};

const CLIENT_CERT: &str = include_str!("../certs/client.crt");
const CLIENT_KEY: &str = include_str!("../certs/client.key");

/// Key pair compiled into the binary, used when the manifest names none
pub fn builtin_credentials() -> PemCredentials {
    PemCredentials::from_pem(CLIENT_CERT, CLIENT_KEY)
}

/// What the binary should do once bootstrap succeeds
#[derive(Debug)]
pub enum Outcome {
    Version,
    Id(ClientId),
    List(Vec<String>),
    Launch(Box<ClientArtifacts>),
}

/// Fatal bootstrap errors
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("configuration error: {0}")]
    Config(#[from] ManifestError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Address(#[from] AddressError),

    #[error("failed to configure tls: {0}")]
    Tls(#[from] TlsError),

    #[error(transparent)]
    Identity(TlsError),

    #[error("failed to start tunnels: {0}")]
    Runtime(#[from] RuntimeError),
}

impl BootstrapError {
    pub fn exit_code(&self) -> i32 {
        1
    }
}

/// Run the bootstrap pipeline for one invocation
///
/// `builtin` supplies the client key pair unless the manifest names its own.
pub fn resolve(
    invocation: &Invocation,
    builtin: &dyn CertificateSource,
) -> Result<Outcome, BootstrapError> {
    // The parser only leaves the command unset alongside --version
    let command = match invocation.command {
        Some(command) if !invocation.show_version => command,
        _ => return Ok(Outcome::Version),
    };

    let manifest = if command.uses_config_file() {
        debug!("Loading manifest from {:?}", invocation.config_path);
        Manifest::load(&invocation.config_path)?
    } else {
        Manifest::quick_start(invocation.protocol, &invocation.host, invocation.port)
    };

    let manifest_credentials = manifest.credentials();
    let credentials: &dyn CertificateSource = match &manifest_credentials {
        Some(credentials) => credentials,
        None => builtin,
    };

    let manifest = match command {
        Command::Id => {
            let certificate = credentials.certificate().map_err(BootstrapError::Identity)?;
            return Ok(Outcome::Id(ClientId::from_certificate(&certificate)));
        }
        Command::List => {
            manifest.ensure_tunnels()?;
            return Ok(Outcome::List(manifest.tunnel_names()));
        }
        Command::Start => manifest.select(&invocation.args)?,
        Command::StartAll | Command::QuickStart => manifest,
    };
    manifest.ensure_tunnels()?;

    let tls = manifest.tls_config(credentials)?;
    let backoff = manifest.backoff_policy();
    let routes = manifest.routing_table()?;

    match serde_yaml::to_string(&manifest) {
        Ok(dump) => debug!("Resolved manifest:\n{}", dump),
        Err(e) => debug!("Failed to render manifest: {}", e),
    }
    info!(
        "Starting {} tunnel(s) via {}",
        manifest.tunnels.len(),
        manifest.server_addr
    );

    Ok(Outcome::Launch(Box::new(ClientArtifacts {
        server_addr: manifest.server_addr.clone(),
        tls,
        backoff,
        routes,
        tunnels: manifest.tunnel_requests(),
    })))
}
