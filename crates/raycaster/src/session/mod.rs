//! # Peer Session
//!
//! One frame:
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │ 1. RECEIVE   (periodic + inline only) drain the socket          │
//! │ 2. RENDER    lock peer positions, draw into FRONT               │
//! │ 3. SWAP      FRONT <-> BACK                                      │
//! │ 4. PRESENT   hand BACK to the presenter                          │
//! │ 5. TIME      measure the frame, update FPS                       │
//! │ 6. INPUT     poll keys, move/turn the local player               │
//! │ 7. SEND      periodic: send now / event-driven: publish if moved │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Threads:
//!
//! - **frame loop**: the caller's thread, never waits on a socket
//! - **receiver task**: blocks on the listening socket, feeds the store
//! - **sender task** (event-driven only): waits for a position change
//!
//! ## Shutdown
//!
//! [`Session::shutdown`] (or drop) raises the stop signal, wakes every
//! waiting task and joins them before the sockets and the store go away.

mod config;
mod receiver_task;
mod sender_task;

pub use config::{PlayerConfig, ScreenConfig, SendStrategy, SessionConfig, SyncConfig};
pub use receiver_task::ReceiverTask;
pub use sender_task::{PositionSink, SenderTask};

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use raycaster_core::{FrameBuffer, FrameClock, FrameStats, Keys, LocalPlayerState, Walkable};
use raycaster_networking::{
    PeerFanout, PositionReceiver, PositionSample, SenderStats, SharedPositionStore, TransportStats,
};

use crate::collaborators::{InputSource, Presenter, Renderer};
use crate::error::{SessionError, SessionResult};

/// What the caller should do after a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameControl {
    /// Keep going.
    Continue,
    /// The player asked to leave.
    Quit,
}

/// Counters collected over a session's life.
#[derive(Clone, Copy, Debug, Default)]
pub struct SessionSummary {
    /// Frames completed.
    pub frames: u64,
    /// Frame timing.
    pub frame_stats: FrameStats,
    /// Outbound datagrams, summed over peers.
    pub sent: SenderStats,
    /// Inbound datagrams.
    pub received: TransportStats,
    /// Peer positions applied to the store.
    pub peer_updates: u64,
    /// Distinct peers heard from.
    pub known_peers: usize,
}

/// Where inbound positions are read.
enum Inbound {
    /// Background receive task.
    Task(ReceiverTask),
    /// Non-blocking socket drained by the frame loop.
    Inline(PositionReceiver),
}

/// When outbound positions are sent.
enum Outbound {
    /// From the frame loop, every frame.
    Periodic,
    /// From a background task, on change.
    EventDriven(SenderTask),
}

/// A running peer: local player, surface, peer positions and the network
/// tasks that keep them in sync.
pub struct Session {
    framebuffer: Arc<FrameBuffer>,
    store: Arc<SharedPositionStore>,
    fanout: Arc<PeerFanout>,
    player: LocalPlayerState,
    local_addr: SocketAddr,
    inbound: Inbound,
    outbound: Outbound,
    clock: FrameClock,
    frames: u64,
    /// Seconds since FPS was last logged.
    since_report: f64,
    stopped: bool,
}

impl Session {
    /// Binds the listening socket, connects to every peer and starts the
    /// background tasks.
    ///
    /// # Errors
    ///
    /// Fails if the configuration is invalid, a peer does not resolve, the
    /// port cannot be bound or a task cannot be spawned.
    pub fn start(config: &SessionConfig) -> SessionResult<Self> {
        config.validate()?;

        let peers = config.network.resolve_peers()?;
        let receiver = PositionReceiver::bind(config.network.listen_port)?;
        let local_addr = receiver.local_addr();
        let fanout = Arc::new(PeerFanout::connect_all(&peers)?);
        let store = Arc::new(SharedPositionStore::new(peers.len()));
        let framebuffer = FrameBuffer::new(config.screen.width, config.screen.height);
        let player = config.player.to_state();

        let sync = &config.session;
        let inbound = if sync.receives_inline() {
            receiver.set_nonblocking(true).map_err(SessionError::Socket)?;
            Inbound::Inline(receiver)
        } else {
            Inbound::Task(ReceiverTask::spawn(
                receiver,
                Arc::clone(&store),
                sync.receive_poll(),
            )?)
        };

        let outbound = match sync.strategy {
            SendStrategy::Periodic => Outbound::Periodic,
            SendStrategy::EventDriven => {
                let task = SenderTask::spawn(Arc::clone(&fanout))?;
                // Peers learn where we stand without waiting for a first move.
                task.publish(position_sample(&player));
                Outbound::EventDriven(task)
            }
        };

        tracing::info!(
            %local_addr,
            peers = peers.len(),
            strategy = ?sync.strategy,
            inline_receive = sync.receives_inline(),
            "session started"
        );

        Ok(Self {
            framebuffer,
            store,
            fanout,
            player,
            local_addr,
            inbound,
            outbound,
            clock: FrameClock::new(),
            frames: 0,
            since_report: 0.0,
            stopped: false,
        })
    }

    /// Runs one frame. See the module docs for the order of steps.
    pub fn frame<R, P, I, W>(
        &mut self,
        renderer: &mut R,
        presenter: &mut P,
        input: &mut I,
        map: &W,
    ) -> FrameControl
    where
        R: Renderer + ?Sized,
        P: Presenter + ?Sized,
        I: InputSource + ?Sized,
        W: Walkable + ?Sized,
    {
        if let Inbound::Inline(receiver) = &mut self.inbound {
            receiver.drain_into(&self.store, self.store.capacity());
        }

        {
            let peers = self.store.read();
            renderer.render(&self.framebuffer, &self.player, &peers);
        }
        self.framebuffer.swap();
        presenter.present(
            &self.framebuffer.back_buffer(),
            self.framebuffer.width(),
            self.framebuffer.height(),
        );

        let frame_time = self.clock.tick();
        self.frames += 1;
        self.report_fps(frame_time);

        let keys = input.poll();
        if keys.contains(Keys::ESC) {
            return FrameControl::Quit;
        }
        let moved = keys.steers() && self.player.apply_keys(keys, frame_time, map);

        match &self.outbound {
            Outbound::Periodic => {
                self.fanout.send_all(&position_sample(&self.player));
            }
            Outbound::EventDriven(task) => {
                if moved {
                    task.publish(position_sample(&self.player));
                }
            }
        }

        FrameControl::Continue
    }

    /// Runs frames until the player quits, `stop` is raised or `max_frames`
    /// frames have run. Returns the number of frames run by this call.
    pub fn run<R, P, I, W>(
        &mut self,
        renderer: &mut R,
        presenter: &mut P,
        input: &mut I,
        map: &W,
        stop: &AtomicBool,
        max_frames: Option<u64>,
    ) -> u64
    where
        R: Renderer + ?Sized,
        P: Presenter + ?Sized,
        I: InputSource + ?Sized,
        W: Walkable + ?Sized,
    {
        let mut frames = 0;
        while !stop.load(Ordering::Relaxed) && max_frames.map_or(true, |max| frames < max) {
            frames += 1;
            if self.frame(renderer, presenter, input, map) == FrameControl::Quit {
                tracing::info!(frame = self.frames, "quit requested");
                break;
            }
        }
        frames
    }

    fn report_fps(&mut self, frame_time: f64) {
        self.since_report += frame_time;
        if self.since_report >= FrameClock::FPS_WINDOW {
            self.since_report = 0.0;
            tracing::debug!(fps = self.clock.fps(), frame = self.frames, "frame rate");
        }
    }

    /// The local player.
    #[must_use]
    pub const fn player(&self) -> &LocalPlayerState {
        &self.player
    }

    /// The shared surface, for a presenter running on another thread.
    #[must_use]
    pub fn framebuffer(&self) -> Arc<FrameBuffer> {
        Arc::clone(&self.framebuffer)
    }

    /// Latest known peer positions.
    #[must_use]
    pub fn store(&self) -> &SharedPositionStore {
        &self.store
    }

    /// Address the session receives on.
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Frames run so far.
    #[must_use]
    pub const fn frames(&self) -> u64 {
        self.frames
    }

    /// Counters as of now.
    #[must_use]
    pub fn summary(&self) -> SessionSummary {
        let received = match &self.inbound {
            Inbound::Task(task) => task.stats(),
            Inbound::Inline(receiver) => *receiver.stats(),
        };
        SessionSummary {
            frames: self.frames,
            frame_stats: *self.clock.stats(),
            sent: self.fanout.stats(),
            received,
            peer_updates: self.store.update_count(),
            known_peers: self.store.known_peers(),
        }
    }

    /// Stops and joins the background tasks and returns the final counters.
    pub fn shutdown(mut self) -> SessionSummary {
        self.stop_tasks();
        self.summary()
    }

    fn stop_tasks(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;

        if let Outbound::EventDriven(task) = &mut self.outbound {
            task.stop();
        }
        if let Inbound::Task(task) = &mut self.inbound {
            task.stop();
        }

        tracing::info!(frames = self.frames, "session stopped");
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.stop_tasks();
    }
}

fn position_sample(player: &LocalPlayerState) -> PositionSample {
    let position = player.position();
    PositionSample::new(position.x, position.y)
}
