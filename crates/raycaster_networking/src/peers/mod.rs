//! # Peer Tracking
//!
//! Who is out there and where they stand.
//!
//! ## Design
//!
//! - Peers are not announced: a peer exists from its first datagram on
//! - Indices are small, dense and handed out in first-seen order
//! - Registration and position update happen under the SAME lock, so the
//!   render thread never sees an index without its position

mod registry;
mod store;

pub use registry::{PeerIdentity, PeerIndex, PeerRegistry};
pub use store::{PositionsView, SharedPositionStore};
