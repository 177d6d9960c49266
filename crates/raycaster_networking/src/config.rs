//! Peer list configuration.
//!
//! ```toml
//! listen_port = 7000
//! peers = ["192.168.1.20:7000", "192.168.1.21:7000"]
//! ```
//!
//! The order of `peers` is the order sends go out in. The number of peers is
//! also the capacity of the position table.

use std::net::{SocketAddr, ToSocketAddrs};

use serde::{Deserialize, Serialize};

use crate::error::{NetError, NetResult};
use crate::DEFAULT_LISTEN_PORT;

/// Local listening port plus the remote peers to send to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NetworkConfig {
    /// UDP port to receive positions on.
    pub listen_port: u16,
    /// Remote peers as `host:port`.
    pub peers: Vec<String>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            listen_port: DEFAULT_LISTEN_PORT,
            peers: Vec::new(),
        }
    }
}

impl NetworkConfig {
    /// Number of remote peers, which is also the position table capacity.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.peers.len()
    }

    /// Checks the configuration can run a session.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::InvalidConfig`] if no peer is configured.
    pub fn validate(&self) -> NetResult<()> {
        if self.peers.is_empty() {
            return Err(NetError::InvalidConfig("at least one peer is required".to_string()));
        }
        Ok(())
    }

    /// Resolves every peer, keeping configuration order.
    ///
    /// Host names resolve to their first address.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Resolve`] for the first peer that does not resolve.
    pub fn resolve_peers(&self) -> NetResult<Vec<SocketAddr>> {
        self.peers.iter().map(|peer| resolve(peer)).collect()
    }
}

fn resolve(address: &str) -> NetResult<SocketAddr> {
    let mut addrs = address.to_socket_addrs().map_err(|source| NetError::Resolve {
        address: address.to_string(),
        source,
    })?;
    addrs
        .next()
        .ok_or_else(|| NetError::InvalidConfig(format!("peer `{address}` resolved to no address")))
}
