//! Routing table compilation and lookup

use crate::RouteKey;
use hooktun_proto::{TunnelDefinition, TunnelProtocol};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;
use tracing::{debug, trace, warn};
use url::Url;

/// Malformed local address for an HTTP tunnel
#[derive(Debug, Error)]
#[error("invalid tunnel address {addr:?} for tunnel {tunnel:?}: {source}")]
pub struct AddressError {
    pub tunnel: String,
    pub addr: String,
    #[source]
    pub source: url::ParseError,
}

/// Compiled, protocol-partitioned routes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoutingTable {
    http: HashMap<String, Url>,
    tcp: HashMap<String, String>,
    sni: HashMap<String, String>,
}

impl RoutingTable {
    /// Compile tunnel definitions into routing tables
    ///
    /// Definitions are visited in name order. When two definitions produce
    /// the same key the later name wins, so the winner is stable across runs.
    pub fn compile(tunnels: &BTreeMap<String, TunnelDefinition>) -> Result<Self, AddressError> {
        let mut table = RoutingTable::default();
        let mut owners: HashMap<RouteKey, &str> = HashMap::new();

        for (name, tunnel) in tunnels {
            let key = match tunnel.protocol {
                TunnelProtocol::Http => {
                    let url = Url::parse(&tunnel.local_addr).map_err(|source| AddressError {
                        tunnel: name.clone(),
                        addr: tunnel.local_addr.clone(),
                        source,
                    })?;
                    table.http.insert(tunnel.host.clone(), url);
                    RouteKey::HttpHost(tunnel.host.clone())
                }
                TunnelProtocol::Tcp | TunnelProtocol::Tcp4 | TunnelProtocol::Tcp6 => {
                    table
                        .tcp
                        .insert(tunnel.remote_addr.clone(), tunnel.local_addr.clone());
                    RouteKey::TcpAddr(tunnel.remote_addr.clone())
                }
                TunnelProtocol::Sni => {
                    table
                        .sni
                        .insert(tunnel.host.clone(), tunnel.local_addr.clone());
                    RouteKey::SniHost(tunnel.host.clone())
                }
            };

            debug!("Route {} -> {} (tunnel {})", key, tunnel.local_addr, name);
            if let Some(previous) = owners.insert(key.clone(), name) {
                warn!(
                    "Tunnel {} overrides route {} of tunnel {}",
                    name, key, previous
                );
            }
        }

        Ok(table)
    }

    /// Upstream URL for an HTTP host header (port suffix ignored)
    pub fn http_upstream(&self, host: &str) -> Option<&Url> {
        let normalized = Self::normalize_host(host);
        trace!("Looking up HTTP route for host: {}", normalized);
        self.http.get(normalized)
    }

    /// Local address for a TCP connection accepted on `remote_addr`
    pub fn tcp_upstream(&self, remote_addr: &str) -> Option<&str> {
        trace!("Looking up TCP route for {}", remote_addr);
        self.tcp.get(remote_addr).map(String::as_str)
    }

    /// Local address for a TLS connection with the given SNI
    pub fn sni_upstream(&self, host: &str) -> Option<&str> {
        trace!("Looking up SNI route for {}", host);
        self.sni.get(host).map(String::as_str)
    }

    /// Resolve any route key to its upstream target
    pub fn lookup(&self, key: &RouteKey) -> Option<String> {
        match key {
            RouteKey::HttpHost(host) => self.http_upstream(host).map(Url::to_string),
            RouteKey::TcpAddr(addr) => self.tcp_upstream(addr).map(str::to_string),
            RouteKey::SniHost(host) => self.sni_upstream(host).map(str::to_string),
        }
    }

    pub fn http_routes(&self) -> &HashMap<String, Url> {
        &self.http
    }

    pub fn tcp_routes(&self) -> &HashMap<String, String> {
        &self.tcp
    }

    pub fn sni_routes(&self) -> &HashMap<String, String> {
        &self.sni
    }

    /// Total number of routes across all protocols
    pub fn len(&self) -> usize {
        self.http.len() + self.tcp.len() + self.sni.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Normalize host header (remove port if present)
    ///
    /// Bracketed IPv6 literals keep their brackets: `[::1]:8080` -> `[::1]`.
    fn normalize_host(host: &str) -> &str {
        if host.starts_with('[') {
            return match host.find(']') {
                Some(end) => &host[..=end],
                None => host,
            };
        }
        match host.rsplit_once(':') {
            Some((name, _port)) if !name.contains(':') => name,
            _ => host,
        }
    }
}
