//! Source endpoint → peer index assignment.

use std::collections::HashMap;
use std::fmt;
use std::net::SocketAddr;

/// A remote peer, identified by the UDP endpoint its datagrams come from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PeerIdentity(pub SocketAddr);

impl fmt::Display for PeerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<SocketAddr> for PeerIdentity {
    fn from(addr: SocketAddr) -> Self {
        Self(addr)
    }
}

/// Slot of a peer in the position table, in `[0, capacity)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeerIndex(pub usize);

impl PeerIndex {
    /// Returns the raw slot number.
    #[inline]
    #[must_use]
    pub const fn get(self) -> usize {
        self.0
    }
}

/// Assigns stable indices to peers on first sighting.
///
/// Indices are handed out round-robin modulo `capacity`. If more distinct
/// peers show up than there are slots, the counter wraps and the newcomer
/// shares a slot with an earlier peer: both then write the same position.
///
/// Not synchronized. The owner must hold the same lock it uses for the
/// position update that follows registration.
#[derive(Debug)]
pub struct PeerRegistry {
    indices: HashMap<PeerIdentity, PeerIndex>,
    next: usize,
    capacity: usize,
}

impl PeerRegistry {
    /// Creates an empty registry with `capacity` slots.
    ///
    /// # Panics
    ///
    /// Panics if capacity is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "PeerRegistry capacity must be non-zero");
        Self {
            indices: HashMap::with_capacity(capacity),
            next: 0,
            capacity,
        }
    }

    /// Returns the index of `identity`, assigning the next one if unseen.
    pub fn register(&mut self, identity: PeerIdentity) -> PeerIndex {
        if let Some(&index) = self.indices.get(&identity) {
            return index;
        }

        let index = PeerIndex(self.next);
        self.next = (self.next + 1) % self.capacity;
        self.indices.insert(identity, index);

        if self.indices.len() > self.capacity {
            tracing::warn!(peer = %identity, index = index.0, "more peers than slots, index shared");
        } else {
            tracing::info!(peer = %identity, index = index.0, "peer registered");
        }
        index
    }

    /// Index of an already registered peer.
    #[inline]
    #[must_use]
    pub fn get(&self, identity: &PeerIdentity) -> Option<PeerIndex> {
        self.indices.get(identity).copied()
    }

    /// Number of distinct peers seen.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// True if no peer has been seen yet.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Number of slots.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}
