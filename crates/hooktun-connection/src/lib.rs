//! Connection artifacts for the tunnel client
//!
//! Everything the client needs to reach its relay: the reconnection
//! backoff policy, the TLS client configuration with its trust anchors,
//! and the handoff seam to the runtime that drives the connection.

pub mod connector;
pub mod reconnect;
pub mod runtime;
pub mod tls;

pub use connector::RelayConnector;
pub use reconnect::{Backoff, BackoffPolicy, ReconnectError};
pub use runtime::{ClientArtifacts, RuntimeError, TunnelRuntime};
pub use tls::{build_tls_config, CertificateSource, PemCredentials, TlsClientConfig, TlsError};
