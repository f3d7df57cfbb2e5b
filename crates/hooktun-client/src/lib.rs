//! Tunnel client manifest
//!
//! Loads or synthesizes the set of named tunnels for one client run,
//! resolves the subset to start, and derives the connection artifacts
//! (backoff policy, TLS configuration, routing table) from it.

pub mod backoff;
pub mod duration;
pub mod manifest;

pub use backoff::BackoffSettings;
pub use manifest::{
    Manifest, ManifestError, ValidationError, DEFAULT_CONFIG_PATH, QUICK_START_RELAY,
    QUICK_START_TUNNEL,
};

pub use hooktun_connection::{BackoffPolicy, ClientArtifacts, TlsClientConfig};
pub use hooktun_proto::{TunnelDefinition, TunnelProtocol};
pub use hooktun_router::RoutingTable;
