//! Handoff between the bootstrap pipeline and the tunnel runtime

use crate::reconnect::BackoffPolicy;
use crate::tls::TlsClientConfig;
use async_trait::async_trait;
use hooktun_proto::TunnelRequest;
use hooktun_router::RoutingTable;
use std::collections::BTreeMap;
use thiserror::Error;

/// Everything the runtime needs to run the client
///
/// Built once during bootstrap and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct ClientArtifacts {
    pub server_addr: String,
    pub tls: TlsClientConfig,
    pub backoff: BackoffPolicy,
    pub routes: RoutingTable,
    /// Registration requests keyed by tunnel name
    pub tunnels: BTreeMap<String, TunnelRequest>,
}

/// Runtime errors
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("TLS handshake with {addr} failed: {source}")]
    Handshake {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("gave up connecting to {addr} after {attempts} attempts: {last_error}")]
    GaveUp {
        addr: String,
        attempts: usize,
        last_error: String,
    },
}

/// Entry point of the tunnel runtime
///
/// `start` takes ownership of the artifacts and only returns when the
/// runtime stops for good.
#[async_trait]
pub trait TunnelRuntime: Send + Sync {
    async fn start(&self, artifacts: ClientArtifacts) -> Result<(), RuntimeError>;
}
