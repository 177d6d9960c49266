//! Background receive task.
//!
//! Owns the listening socket. Each datagram is applied to the store under
//! the store lock and the task goes straight back to the socket, so the lock
//! is never held across a receive call.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;
use raycaster_networking::{PositionReceiver, Reception, SharedPositionStore, TransportStats};

use crate::error::{SessionError, SessionResult};

/// Handle to the thread that feeds the position store.
pub struct ReceiverTask {
    running: Arc<AtomicBool>,
    stats: Arc<Mutex<TransportStats>>,
    handle: Option<JoinHandle<()>>,
    /// `None` when the socket blocks without timeout.
    poll: Option<Duration>,
}

impl ReceiverTask {
    /// Moves `receiver` onto a new thread that applies every valid sample
    /// to `store`.
    ///
    /// With `poll` set, each receive gives up after that long so the task
    /// can notice [`stop`](Self::stop). With `None` it blocks until the next
    /// datagram.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Socket`] if the timeout cannot be applied and
    /// [`SessionError::Spawn`] if the thread cannot be created.
    pub fn spawn(
        receiver: PositionReceiver,
        store: Arc<SharedPositionStore>,
        poll: Option<Duration>,
    ) -> SessionResult<Self> {
        receiver.set_nonblocking(false).map_err(SessionError::Socket)?;
        receiver.set_read_timeout(poll).map_err(SessionError::Socket)?;

        let running = Arc::new(AtomicBool::new(true));
        let stats = Arc::new(Mutex::new(TransportStats::default()));

        let task_running = Arc::clone(&running);
        let task_stats = Arc::clone(&stats);
        let handle = thread::Builder::new()
            .name("position-receiver".to_string())
            .spawn(move || Self::receive_loop(receiver, &store, &task_running, &task_stats))
            .map_err(|source| SessionError::Spawn {
                task: "receiver",
                source,
            })?;

        Ok(Self {
            running,
            stats,
            handle: Some(handle),
            poll,
        })
    }

    fn receive_loop(
        mut receiver: PositionReceiver,
        store: &SharedPositionStore,
        running: &AtomicBool,
        stats: &Mutex<TransportStats>,
    ) {
        tracing::debug!(local_addr = %receiver.local_addr(), "receiver task started");

        while running.load(Ordering::Acquire) {
            let reception = receiver.receive();

            // A datagram that lands after stop is dropped.
            if !running.load(Ordering::Acquire) {
                break;
            }
            if let Reception::Sample { from, sample } = reception {
                store.apply_from(from, sample);
            }
            *stats.lock() = *receiver.stats();
        }

        *stats.lock() = *receiver.stats();
        tracing::debug!("receiver task stopped");
    }

    /// Receive counters as of the last datagram.
    #[must_use]
    pub fn stats(&self) -> TransportStats {
        *self.stats.lock()
    }

    /// True until [`stop`](Self::stop) has been called.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Stops the task.
    ///
    /// With a poll interval this waits for the task to exit, at most about
    /// one interval. Without one the task may be parked in a receive that
    /// never returns: it is detached instead of joined and exits, without
    /// touching the store, on its next datagram or at process exit.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Release);

        let Some(handle) = self.handle.take() else {
            return;
        };
        if self.poll.is_some() {
            if handle.join().is_err() {
                tracing::error!("receiver task panicked");
            }
        } else {
            tracing::info!("receiver task blocks without timeout, detaching it");
        }
    }
}

impl Drop for ReceiverTask {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use raycaster_networking::{PeerIndex, PositionSample, PositionSender};
    use std::time::Instant;

    fn bind_loopback() -> PositionReceiver {
        PositionReceiver::bind_addr("127.0.0.1:0".parse().unwrap()).unwrap()
    }

    #[test]
    fn test_applies_incoming_samples() {
        let receiver = bind_loopback();
        let sender = PositionSender::connect(receiver.local_addr()).unwrap();
        let store = Arc::new(SharedPositionStore::new(1));
        let mut task =
            ReceiverTask::spawn(receiver, Arc::clone(&store), Some(Duration::from_millis(10)))
                .unwrap();

        sender.send(&PositionSample::new(4.0, 2.0));

        let deadline = Instant::now() + Duration::from_secs(5);
        while store.get(PeerIndex(0)).is_none() {
            assert!(Instant::now() < deadline, "sample never applied");
            thread::sleep(Duration::from_millis(1));
        }
        task.stop();

        assert_eq!(store.get(PeerIndex(0)), Some(PositionSample::new(4.0, 2.0)));
        assert_eq!(task.stats().packets_received, 1);
    }

    #[test]
    fn test_stop_is_bounded_by_poll() {
        let store = Arc::new(SharedPositionStore::new(1));
        let mut task =
            ReceiverTask::spawn(bind_loopback(), store, Some(Duration::from_millis(20))).unwrap();

        let start = Instant::now();
        task.stop();
        assert!(start.elapsed() < Duration::from_secs(1));
        assert!(!task.is_running());
        task.stop();
    }

    #[test]
    fn test_store_untouched_after_stop() {
        let receiver = bind_loopback();
        let sender = PositionSender::connect(receiver.local_addr()).unwrap();
        let store = Arc::new(SharedPositionStore::new(1));
        let mut task =
            ReceiverTask::spawn(receiver, Arc::clone(&store), Some(Duration::from_millis(10)))
                .unwrap();
        task.stop();

        sender.send(&PositionSample::new(1.0, 1.0));
        thread::sleep(Duration::from_millis(30));
        assert_eq!(store.update_count(), 0);
    }

    #[test]
    fn test_blocking_task_is_detached() {
        let store = Arc::new(SharedPositionStore::new(1));
        let mut task = ReceiverTask::spawn(bind_loopback(), store, None).unwrap();

        let start = Instant::now();
        task.stop();
        assert!(start.elapsed() < Duration::from_secs(1));
        assert!(!task.is_running());
    }
}
