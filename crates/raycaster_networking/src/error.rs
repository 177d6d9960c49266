//! # Networking Error Types
//!
//! Only setup can fail. Once sockets are open, send and receive problems are
//! logged and counted, never returned.

use std::io;
use std::net::SocketAddr;

use thiserror::Error;

/// Errors raised while setting up the peer network.
#[derive(Error, Debug)]
pub enum NetError {
    /// The listening port could not be bound (in use, permission denied).
    #[error("failed to bind UDP port {port}: {source}")]
    Bind {
        /// Port that was requested.
        port: u16,
        /// OS error.
        source: io::Error,
    },

    /// No outbound socket could be opened towards a peer.
    #[error("failed to open UDP socket towards {remote}: {source}")]
    Connect {
        /// Peer address.
        remote: SocketAddr,
        /// OS error.
        source: io::Error,
    },

    /// A configured peer address did not resolve.
    #[error("cannot resolve peer address `{address}`: {source}")]
    Resolve {
        /// Address as written in the configuration.
        address: String,
        /// Resolver error.
        source: io::Error,
    },

    /// Configuration is structurally wrong.
    #[error("invalid network configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for networking setup.
pub type NetResult<T> = Result<T, NetError>;
