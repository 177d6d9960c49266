//! # RAYCASTER
//!
//! A peer in a small raycasting session: every peer renders its own view
//! and streams its position to every other peer over UDP.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                               Session                                │
//! │                                                                      │
//! │   InputSource ──> LocalPlayerState ──┬──> Renderer ──> FrameBuffer   │
//! │                                      │                    │ swap     │
//! │                                      │                    ▼          │
//! │                                      │                Presenter      │
//! │                                      ▼                               │
//! │             periodic: send every frame / event-driven: SenderTask    │
//! │                                      │                               │
//! └──────────────────────────────────────┼───────────────────────────────┘
//!                                        │ UDP, 16 bytes
//!                                        ▼
//!                       other peers ── ReceiverTask ──> SharedPositionStore
//! ```
//!
//! ## Crates
//!
//! - [`raycaster_core`]: frame buffer, player, input mask, frame timing
//! - [`raycaster_networking`]: codec, sockets, peer registry, position store
//! - this crate: the session that runs them together
//!
//! ## Example
//!
//! ```rust,ignore
//! use raycaster::{headless, FrameControl, Session, SessionConfig};
//!
//! let config = SessionConfig::from_file("peer.toml")?;
//! let mut session = Session::start(&config)?;
//! let mut renderer = headless::MinimapRenderer::default();
//! let mut presenter = headless::ChecksumPresenter::new();
//! let mut input = headless::ScriptedInput::circling();
//!
//! while session.frame(&mut renderer, &mut presenter, &mut input, &headless::ArenaMap::default())
//!     == FrameControl::Continue
//! {}
//! let summary = session.shutdown();
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod collaborators;
pub mod error;
pub mod session;

pub use collaborators::{headless, InputSource, Presenter, Renderer};
pub use error::{SessionError, SessionResult};
pub use session::{
    FrameControl, PlayerConfig, PositionSink, ReceiverTask, ScreenConfig, SendStrategy, SenderTask,
    Session, SessionConfig, SessionSummary, SyncConfig,
};

pub use raycaster_core as core;
pub use raycaster_networking as networking;
