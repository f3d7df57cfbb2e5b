//! Tunnel protocol types

use serde::{Deserialize, Serialize};

/// Wire protocol of a single tunnel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TunnelProtocol {
    /// HTTP with host-based routing
    Http,
    /// Raw TCP, any address family
    Tcp,
    /// Raw TCP over IPv4 only
    Tcp4,
    /// Raw TCP over IPv6 only
    Tcp6,
    /// TLS passthrough routed by Server Name Indication
    Sni,
}

impl TunnelProtocol {
    /// Returns whether this protocol is routed by remote address
    pub fn is_tcp(&self) -> bool {
        matches!(
            self,
            TunnelProtocol::Tcp | TunnelProtocol::Tcp4 | TunnelProtocol::Tcp6
        )
    }

    /// URL scheme used when synthesizing a local dial target
    pub fn local_scheme(&self) -> &'static str {
        match self {
            TunnelProtocol::Tcp => "tcp",
            _ => "http",
        }
    }
}

impl std::fmt::Display for TunnelProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TunnelProtocol::Http => write!(f, "http"),
            TunnelProtocol::Tcp => write!(f, "tcp"),
            TunnelProtocol::Tcp4 => write!(f, "tcp4"),
            TunnelProtocol::Tcp6 => write!(f, "tcp6"),
            TunnelProtocol::Sni => write!(f, "sni"),
        }
    }
}

/// Error returned when a protocol name is not recognized
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownProtocol(pub String);

impl std::fmt::Display for UnknownProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown tunnel protocol: {}", self.0)
    }
}

impl std::error::Error for UnknownProtocol {}

impl std::str::FromStr for TunnelProtocol {
    type Err = UnknownProtocol;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "http" => Ok(TunnelProtocol::Http),
            "tcp" => Ok(TunnelProtocol::Tcp),
            "tcp4" => Ok(TunnelProtocol::Tcp4),
            "tcp6" => Ok(TunnelProtocol::Tcp6),
            "sni" => Ok(TunnelProtocol::Sni),
            other => Err(UnknownProtocol(other.to_string())),
        }
    }
}

/// Registration request announcing one tunnel to the relay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TunnelRequest {
    pub protocol: TunnelProtocol,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub host: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<String>,
    /// Public address the relay should listen on (TCP variants)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub addr: String,
}
