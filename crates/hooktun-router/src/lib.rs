//! Routing tables for tunnel protocols
//!
//! Compiles the manifest's tunnel definitions into per-protocol lookup
//! tables: HTTP by host header, raw TCP by relay address, TLS by SNI.
//! The proxy engine consumes a table read-only for the connection lifetime.

pub mod table;

pub use table::{AddressError, RoutingTable};

/// Route key for identifying inbound connections
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RouteKey {
    /// HTTP routing by host header
    HttpHost(String),
    /// TCP routing by public relay address
    TcpAddr(String),
    /// TLS routing by SNI hostname
    SniHost(String),
}

impl std::fmt::Display for RouteKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RouteKey::HttpHost(host) => write!(f, "http:{}", host),
            RouteKey::TcpAddr(addr) => write!(f, "tcp:{}", addr),
            RouteKey::SniHost(host) => write!(f, "sni:{}", host),
        }
    }
}
