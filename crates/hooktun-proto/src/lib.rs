//! Tunnel Protocol Definitions
//!
//! Shared vocabulary between the client bootstrap and the relay: tunnel
//! protocols, tunnel definitions and the registration requests derived from
//! them, and the client identity derived from its certificate.

pub mod id;
pub mod protocol;
pub mod tunnel;

pub use id::ClientId;
pub use protocol::{TunnelProtocol, TunnelRequest, UnknownProtocol};
pub use tunnel::TunnelDefinition;
