//! Relay connector runtime
//!
//! Dials the relay over TCP, completes the TLS handshake with the compiled
//! configuration and keeps the session until the relay closes it, then
//! reconnects following the backoff policy.

use crate::reconnect::Backoff;
use crate::runtime::{ClientArtifacts, RuntimeError, TunnelRuntime};
use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tracing::{debug, info, warn};

/// Runtime that maintains the TLS session to the relay
#[derive(Debug, Default)]
pub struct RelayConnector;

impl RelayConnector {
    pub fn new() -> Self {
        Self
    }

    async fn connect(artifacts: &ClientArtifacts) -> Result<TlsStream<TcpStream>, RuntimeError> {
        let addr = &artifacts.server_addr;

        let tcp = TcpStream::connect(addr)
            .await
            .map_err(|source| RuntimeError::Connect {
                addr: addr.clone(),
                source,
            })?;

        artifacts
            .tls
            .connector()
            .connect(artifacts.tls.server_name.clone(), tcp)
            .await
            .map_err(|source| RuntimeError::Handshake {
                addr: addr.clone(),
                source,
            })
    }

    /// Hold the session open until the relay closes it
    async fn hold(mut stream: TlsStream<TcpStream>) -> std::io::Result<()> {
        let mut buf = vec![0u8; 4096];
        loop {
            let n = stream.read(&mut buf).await?;
            if n == 0 {
                return Ok(());
            }
            debug!("Received {} bytes from relay", n);
        }
    }

    async fn retry(
        backoff: &mut Backoff,
        artifacts: &ClientArtifacts,
        last_error: String,
    ) -> Result<(), RuntimeError> {
        backoff.wait().await.map_err(|_| RuntimeError::GaveUp {
            addr: artifacts.server_addr.clone(),
            attempts: backoff.attempt(),
            last_error,
        })
    }
}

#[async_trait]
impl TunnelRuntime for RelayConnector {
    async fn start(&self, artifacts: ClientArtifacts) -> Result<(), RuntimeError> {
        info!(
            "Connecting to relay {} with {} tunnel(s), {} route(s)",
            artifacts.server_addr,
            artifacts.tunnels.len(),
            artifacts.routes.len()
        );
        for (name, request) in &artifacts.tunnels {
            debug!("Tunnel {}: {:?}", name, request);
        }

        let mut backoff = artifacts.backoff.start();
        loop {
            match Self::connect(&artifacts).await {
                Ok(stream) => {
                    info!("Connected to relay {}", artifacts.server_addr);
                    backoff.reset();

                    let reason = match Self::hold(stream).await {
                        Ok(()) => "connection closed by relay".to_string(),
                        Err(e) => e.to_string(),
                    };
                    warn!("Disconnected from relay: {}", reason);
                    Self::retry(&mut backoff, &artifacts, reason).await?;
                }
                Err(e) => {
                    warn!("{}", e);
                    Self::retry(&mut backoff, &artifacts, e.to_string()).await?;
                }
            }
        }
    }
}
