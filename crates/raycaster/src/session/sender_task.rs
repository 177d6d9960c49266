//! # Event-Driven Sender
//!
//! ```text
//! frame loop                         sender task
//! ──────────                         ───────────
//! publish(p1) ─┐                     wait (dirty || stopping)
//! publish(p2)  ├─> latest = p3 ────> take latest, dirty = false
//! publish(p3) ─┘   dirty = true      unlock, send p3 to every peer
//! ```
//!
//! The frame loop never waits on the network: `publish` only takes the
//! signal lock long enough to store a sample. Changes published while the
//! task is busy are coalesced, only the newest one goes out.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::{Condvar, Mutex};
use raycaster_networking::{PeerFanout, PositionSample};

use crate::error::{SessionError, SessionResult};

/// Destination of outgoing positions.
pub trait PositionSink: Send + Sync + 'static {
    /// Sends one position. Returns how many peers it went out to.
    fn send_position(&self, sample: &PositionSample) -> usize;
}

impl PositionSink for PeerFanout {
    fn send_position(&self, sample: &PositionSample) -> usize {
        self.send_all(sample)
    }
}

#[derive(Default)]
struct SendState {
    latest: Option<PositionSample>,
    dirty: bool,
    stopping: bool,
}

#[derive(Default)]
struct SendSignal {
    state: Mutex<SendState>,
    changed: Condvar,
}

/// Background task that sends the local position when it changes.
pub struct SenderTask {
    signal: Arc<SendSignal>,
    sends: Arc<AtomicU64>,
    handle: Option<JoinHandle<()>>,
}

impl SenderTask {
    /// Starts the task.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Spawn`] if the thread cannot be created.
    pub fn spawn<S: PositionSink>(sink: Arc<S>) -> SessionResult<Self> {
        let signal = Arc::new(SendSignal::default());
        let sends = Arc::new(AtomicU64::new(0));

        let task_signal = Arc::clone(&signal);
        let task_sends = Arc::clone(&sends);
        let handle = thread::Builder::new()
            .name("position-sender".to_string())
            .spawn(move || Self::send_loop(&task_signal, &*sink, &task_sends))
            .map_err(|source| SessionError::Spawn {
                task: "sender",
                source,
            })?;

        Ok(Self {
            signal,
            sends,
            handle: Some(handle),
        })
    }

    fn send_loop<S: PositionSink>(signal: &SendSignal, sink: &S, sends: &AtomicU64) {
        tracing::debug!("sender task started");
        loop {
            let sample = {
                let mut state = signal.state.lock();
                while !state.dirty && !state.stopping {
                    signal.changed.wait(&mut state);
                }
                if state.stopping {
                    break;
                }
                state.dirty = false;
                state.latest
            };

            // Lock released: a slow send never blocks publish().
            if let Some(sample) = sample {
                sink.send_position(&sample);
                sends.fetch_add(1, Ordering::Relaxed);
            }
        }
        tracing::debug!("sender task stopped");
    }

    /// Hands the newest position to the task and wakes it.
    ///
    /// Ignored once the task is stopping.
    pub fn publish(&self, sample: PositionSample) {
        let mut state = self.signal.state.lock();
        if state.stopping {
            return;
        }
        state.latest = Some(sample);
        state.dirty = true;
        drop(state);
        self.signal.changed.notify_one();
    }

    /// Number of sends the task has made.
    #[must_use]
    pub fn sends(&self) -> u64 {
        self.sends.load(Ordering::Relaxed)
    }

    /// True until [`stop`](Self::stop) has joined the task.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Stops the task and waits for it. A change still pending is dropped.
    ///
    /// Bounded by one in-flight send. Safe to call more than once.
    pub fn stop(&mut self) {
        {
            let mut state = self.signal.state.lock();
            state.stopping = true;
            self.signal.changed.notify_all();
        }

        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("sender task panicked");
            }
        }
    }
}

impl Drop for SenderTask {
    fn drop(&mut self) {
        self.stop();
    }
}
