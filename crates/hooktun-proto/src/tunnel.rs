//! Tunnel definitions as written in the manifest

use crate::protocol::{TunnelProtocol, TunnelRequest};
use serde::{Deserialize, Serialize};

/// A named tunnel: a public identity mapped to a local service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TunnelDefinition {
    /// Manifest key, filled in by the loader
    #[serde(skip)]
    pub name: String,

    #[serde(rename = "proto")]
    pub protocol: TunnelProtocol,

    /// Public host name (HTTP and SNI)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub host: String,

    /// Local dial target, e.g. `http://localhost:3000` or `127.0.0.1:22`
    #[serde(rename = "addr", default)]
    pub local_addr: String,

    /// Public address on the relay (TCP variants)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub remote_addr: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<String>,
}

impl TunnelDefinition {
    pub fn new(name: &str, protocol: TunnelProtocol, local_addr: &str) -> Self {
        Self {
            name: name.to_string(),
            protocol,
            host: String::new(),
            local_addr: local_addr.to_string(),
            remote_addr: String::new(),
            auth: None,
        }
    }

    pub fn with_host(mut self, host: &str) -> Self {
        self.host = host.to_string();
        self
    }

    pub fn with_remote_addr(mut self, remote_addr: &str) -> Self {
        self.remote_addr = remote_addr.to_string();
        self
    }

    pub fn with_auth(mut self, auth: &str) -> Self {
        self.auth = Some(auth.to_string());
        self
    }

    /// Registration request announced to the relay for this tunnel
    pub fn request(&self) -> TunnelRequest {
        TunnelRequest {
            protocol: self.protocol,
            host: self.host.clone(),
            auth: self.auth.clone(),
            addr: self.remote_addr.clone(),
        }
    }
}
