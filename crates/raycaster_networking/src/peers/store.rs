//! # Shared Position Store
//!
//! The only rendezvous between the receive task and the render thread.
//!
//! ```text
//! receive task:   lock ─ register ─ overwrite slot ─ unlock   (microseconds)
//! render thread:  lock ─ draw every peer sprite ───── unlock   (one frame's sprite pass)
//! ```
//!
//! The render side holds the lock for its whole sprite pass so every peer is
//! drawn from one consistent view. The receive side never holds it across a
//! socket call.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, MutexGuard};

use super::registry::{PeerIdentity, PeerIndex, PeerRegistry};
use crate::protocol::PositionSample;

/// Everything guarded by the store lock.
#[derive(Debug)]
struct PeerTable {
    registry: PeerRegistry,
    /// `None` until the first sample for that slot arrives.
    positions: Vec<Option<PositionSample>>,
}

/// Lock-guarded table of the latest known position of every peer.
#[derive(Debug)]
pub struct SharedPositionStore {
    table: Mutex<PeerTable>,
    /// Slot count, fixed at construction.
    capacity: usize,
    /// Samples applied since creation.
    updates: AtomicU64,
}

impl SharedPositionStore {
    /// Creates an empty store with one slot per expected peer.
    ///
    /// # Panics
    ///
    /// Panics if capacity is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            table: Mutex::new(PeerTable {
                registry: PeerRegistry::new(capacity),
                positions: vec![None; capacity],
            }),
            capacity,
            updates: AtomicU64::new(0),
        }
    }

    /// Number of slots.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Overwrites one slot. Returns false if the index is out of range.
    pub fn apply(&self, index: PeerIndex, sample: PositionSample) -> bool {
        let mut table = self.table.lock();
        let Some(slot) = table.positions.get_mut(index.0) else {
            return false;
        };
        *slot = Some(sample);
        drop(table);

        self.updates.fetch_add(1, Ordering::Relaxed);
        true
    }

    /// Registers the sender if new and stores its sample, under one lock.
    pub fn apply_from(&self, identity: PeerIdentity, sample: PositionSample) -> PeerIndex {
        let mut table = self.table.lock();
        let index = table.registry.register(identity);
        // Registry indices are always below capacity.
        table.positions[index.0] = Some(sample);
        drop(table);

        self.updates.fetch_add(1, Ordering::Relaxed);
        index
    }

    /// Latest position in one slot.
    #[must_use]
    pub fn get(&self, index: PeerIndex) -> Option<PositionSample> {
        self.table.lock().positions.get(index.0).copied().flatten()
    }

    /// Slot assigned to a peer, if it has been seen.
    #[must_use]
    pub fn index_of(&self, identity: &PeerIdentity) -> Option<PeerIndex> {
        self.table.lock().registry.get(identity)
    }

    /// Number of distinct peers seen so far.
    #[must_use]
    pub fn known_peers(&self) -> usize {
        self.table.lock().registry.len()
    }

    /// Total samples applied.
    #[inline]
    #[must_use]
    pub fn update_count(&self) -> u64 {
        self.updates.load(Ordering::Relaxed)
    }

    /// Locks the table for a consistent read of every slot.
    ///
    /// The receive task blocks on its next update while the view is alive,
    /// keep it for one frame's worth of sprite drawing at most.
    #[must_use]
    pub fn read(&self) -> PositionsView<'_> {
        PositionsView {
            table: self.table.lock(),
        }
    }
}

/// Consistent view of all peer positions, holding the store lock.
pub struct PositionsView<'a> {
    table: MutexGuard<'a, PeerTable>,
}

impl PositionsView<'_> {
    /// Latest position in one slot.
    #[inline]
    #[must_use]
    pub fn get(&self, index: PeerIndex) -> Option<PositionSample> {
        self.table.positions.get(index.0).copied().flatten()
    }

    /// Every slot, empty ones included.
    #[inline]
    #[must_use]
    pub fn slots(&self) -> &[Option<PositionSample>] {
        &self.table.positions
    }

    /// Occupied slots with their index.
    pub fn iter(&self) -> impl Iterator<Item = (PeerIndex, PositionSample)> + '_ {
        self.table
            .positions
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.map(|sample| (PeerIndex(i), sample)))
    }

    /// Number of slots.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.table.positions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use std::sync::Arc;
    use std::thread;

    fn peer(port: u16) -> PeerIdentity {
        PeerIdentity(SocketAddr::from(([127, 0, 0, 1], port)))
    }

    #[test]
    fn test_empty_store() {
        let store = SharedPositionStore::new(3);
        assert_eq!(store.capacity(), 3);
        assert_eq!(store.known_peers(), 0);

        // Capacity is readable while a render pass holds the view.
        let view = store.read();
        assert_eq!(store.capacity(), view.capacity());
        drop(view);

        assert_eq!(store.get(PeerIndex(0)), None);
        assert_eq!(store.read().iter().count(), 0);
    }

    #[test]
    fn test_apply_overwrites() {
        let store = SharedPositionStore::new(2);
        assert!(store.apply(PeerIndex(1), PositionSample::new(1.0, 2.0)));
        assert!(store.apply(PeerIndex(1), PositionSample::new(3.0, 4.0)));
        assert_eq!(store.get(PeerIndex(1)), Some(PositionSample::new(3.0, 4.0)));
        assert_eq!(store.get(PeerIndex(0)), None);
        assert_eq!(store.update_count(), 2);
    }

    #[test]
    fn test_apply_out_of_range() {
        let store = SharedPositionStore::new(2);
        assert!(!store.apply(PeerIndex(2), PositionSample::new(1.0, 1.0)));
        assert_eq!(store.update_count(), 0);
    }

    #[test]
    fn test_apply_from_registers() {
        let store = SharedPositionStore::new(2);
        let a = store.apply_from(peer(5000), PositionSample::new(1.0, 2.0));
        let b = store.apply_from(peer(5001), PositionSample::new(5.0, 6.0));
        let a_again = store.apply_from(peer(5000), PositionSample::new(3.0, 4.0));

        assert_eq!(a, PeerIndex(0));
        assert_eq!(b, PeerIndex(1));
        assert_eq!(a_again, a);
        assert_eq!(store.index_of(&peer(5001)), Some(b));

        let view = store.read();
        let all: Vec<_> = view.iter().collect();
        assert_eq!(
            all,
            vec![
                (PeerIndex(0), PositionSample::new(3.0, 4.0)),
                (PeerIndex(1), PositionSample::new(5.0, 6.0)),
            ]
        );
        assert_eq!(view.capacity(), 2);
    }

    #[test]
    fn test_view_is_consistent() {
        // Writers always store x == y; a reader holding the view must never
        // see a slot where they differ, nor slots that change under it.
        let store = Arc::new(SharedPositionStore::new(4));
        let writer = {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 0..20_000u32 {
                    let v = f64::from(i);
                    store.apply(PeerIndex((i % 4) as usize), PositionSample::new(v, v));
                }
            })
        };

        for _ in 0..500 {
            let view = store.read();
            let first: Vec<_> = view.slots().to_vec();
            for slot in view.slots().iter().flatten() {
                assert_eq!(slot.x, slot.y);
            }
            assert_eq!(view.slots(), first.as_slice());
        }
        writer.join().unwrap();
    }
}
