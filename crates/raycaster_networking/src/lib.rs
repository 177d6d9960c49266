//! # RAYCASTER Networking
//!
//! Peer-to-peer exchange of player positions over plain UDP.
//!
//! ## Architecture
//!
//! ```text
//!  local player ──> PositionSender ──UDP──> ... remote peers
//!                   (one per peer)
//!
//!  remote peers ──UDP──> PositionReceiver ──> PeerRegistry ──> SharedPositionStore
//!                        (one socket)         (source → index)   (index → position)
//!                                                                       │
//!                                                         render thread reads
//! ```
//!
//! - **Protocol**: two native-endian `f64` per datagram, nothing else
//! - **Identity**: the UDP source endpoint is the peer
//! - **Delivery**: fire-and-forget, last applied sample wins
//!
//! ## Trust Model
//!
//! There is none. Every datagram of the right size from any source is
//! applied. Loss and reordering are tolerated: a lost update is superseded by
//! the next one, a late one may briefly show an older position.
//!
//! ## Example
//!
//! ```rust,ignore
//! use raycaster_networking::{PeerFanout, PositionReceiver, PositionSample, Reception, SharedPositionStore};
//!
//! let mut receiver = PositionReceiver::bind(7000)?;
//! let fanout = PeerFanout::connect_all(&peers)?;
//! let store = SharedPositionStore::new(peers.len());
//!
//! fanout.send_all(&PositionSample::new(22.0, 11.5));
//! if let Reception::Sample { from, sample } = receiver.receive() {
//!     store.apply_from(from, sample);
//! }
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod error;
pub mod peers;
pub mod protocol;
pub mod transport;

pub use config::NetworkConfig;
pub use error::{NetError, NetResult};
pub use peers::{PeerIdentity, PeerIndex, PeerRegistry, PositionsView, SharedPositionStore};
pub use protocol::{PositionCodec, PositionSample, PAYLOAD_SIZE};
pub use transport::{
    PeerFanout, PositionSender, PositionReceiver, Reception, SenderStats, TransportStats,
};

/// Receive buffer size. Anything larger than a position payload is rejected,
/// the extra room only lets us see that it was too long.
pub const MAX_DATAGRAM_SIZE: usize = 1200;

/// Listening port used when the configuration names none.
pub const DEFAULT_LISTEN_PORT: u16 = 7000;
