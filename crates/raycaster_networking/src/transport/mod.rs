//! # Transport Layer
//!
//! Plain UDP, one socket in, one socket out per peer.
//!
//! ## Design
//!
//! - No connection state: nothing to reconnect, nothing to back off
//! - No reliability layer: a lost position is superseded by the next one
//! - Sockets are owned values, closed on drop on every exit path

mod receiver;
mod sender;

pub use receiver::{PositionReceiver, Reception};
pub use sender::{PeerFanout, PositionSender, SenderStats};

/// Receive-side statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TransportStats {
    /// Datagrams received, valid or not.
    pub packets_received: u64,
    /// Bytes received.
    pub bytes_received: u64,
    /// Datagrams dropped for having the wrong size.
    pub malformed: u64,
    /// Receive errors other than timeouts.
    pub recv_errors: u64,
}
