//! Session configuration, loaded once at startup.
//!
//! ```toml
//! [screen]
//! width = 640
//! height = 480
//!
//! [network]
//! listen_port = 7000
//! peers = ["127.0.0.1:7001", "127.0.0.1:7002"]
//!
//! [session]
//! strategy = "event_driven"   # or "periodic"
//! inline_receive = false
//! receive_poll_ms = 100
//!
//! [player]
//! spawn = [22.0, 11.5]
//! direction = [-1.0, 0.0]
//! plane = [0.0, 0.66]
//! move_speed = 5.0
//! rot_speed = 3.0
//! ```
//!
//! Every section and field is optional.

use std::path::Path;
use std::time::Duration;

use raycaster_core::{LocalPlayerState, Vec2};
use raycaster_networking::NetworkConfig;
use serde::{Deserialize, Serialize};

use crate::error::{SessionError, SessionResult};

/// When the local position goes out to peers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SendStrategy {
    /// Every frame, from the frame loop, whether or not the player moved.
    Periodic,
    /// From a background task, only after the position changed. Changes
    /// that pile up before the task wakes go out as one send.
    #[default]
    EventDriven,
}

/// Output surface size in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScreenConfig {
    /// Width in pixels.
    pub width: usize,
    /// Height in pixels.
    pub height: usize,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
        }
    }
}

/// Send and receive policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncConfig {
    /// Send strategy.
    pub strategy: SendStrategy,
    /// Periodic only: drain the socket from the frame loop instead of
    /// running a receive task.
    pub inline_receive: bool,
    /// How often the receive task checks for shutdown, in milliseconds.
    /// Zero blocks on the socket forever; the task is then left behind at
    /// shutdown.
    pub receive_poll_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            strategy: SendStrategy::default(),
            inline_receive: false,
            receive_poll_ms: 100,
        }
    }
}

impl SyncConfig {
    /// Read timeout for the receive task, `None` for a fully blocking read.
    #[must_use]
    pub fn receive_poll(&self) -> Option<Duration> {
        (self.receive_poll_ms > 0).then(|| Duration::from_millis(self.receive_poll_ms))
    }

    /// True if the frame loop drains the socket itself.
    #[must_use]
    pub fn receives_inline(&self) -> bool {
        self.strategy == SendStrategy::Periodic && self.inline_receive
    }
}

/// Starting state of the local player.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlayerConfig {
    /// Spawn position in map cells.
    pub spawn: [f64; 2],
    /// Initial facing direction.
    pub direction: [f64; 2],
    /// Initial camera plane.
    pub plane: [f64; 2],
    /// Cells per second.
    pub move_speed: f64,
    /// Radians per second.
    pub rot_speed: f64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        let spawn = LocalPlayerState::SPAWN;
        let direction = LocalPlayerState::DIRECTION;
        let plane = LocalPlayerState::PLANE;
        Self {
            spawn: [spawn.x, spawn.y],
            direction: [direction.x, direction.y],
            plane: [plane.x, plane.y],
            move_speed: LocalPlayerState::MOVE_SPEED,
            rot_speed: LocalPlayerState::ROT_SPEED,
        }
    }
}

impl PlayerConfig {
    /// Builds the initial player state.
    #[must_use]
    pub fn to_state(&self) -> LocalPlayerState {
        LocalPlayerState::new(
            Vec2::from(self.spawn),
            Vec2::from(self.direction),
            Vec2::from(self.plane),
            self.move_speed,
            self.rot_speed,
        )
    }
}

/// Everything a peer needs to join a session.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Surface size.
    pub screen: ScreenConfig,
    /// Listening port and peer list.
    pub network: NetworkConfig,
    /// Send and receive policy.
    pub session: SyncConfig,
    /// Local player start.
    pub player: PlayerConfig,
}

impl SessionConfig {
    /// Parses a TOML document. Validation happens in
    /// [`Session::start`](crate::Session::start).
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::ConfigParse`] for malformed TOML or unknown
    /// keys.
    pub fn from_toml_str(text: &str) -> SessionResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Reads and parses a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Io`] if the file cannot be read, otherwise as
    /// [`from_toml_str`](Self::from_toml_str).
    pub fn from_file(path: impl AsRef<Path>) -> SessionResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SessionError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Checks the configuration can run a session.
    ///
    /// # Errors
    ///
    /// Fails on an empty peer list, a zero-sized or unaddressable screen or
    /// non-finite player values.
    pub fn validate(&self) -> SessionResult<()> {
        self.network.validate()?;

        let ScreenConfig { width, height } = self.screen;
        if width == 0 || height == 0 {
            return Err(SessionError::InvalidConfig(format!(
                "screen must be non-empty, got {width}x{height}"
            )));
        }
        if width.checked_mul(height).is_none() {
            return Err(SessionError::InvalidConfig(format!(
                "screen of {width}x{height} pixels is too large"
            )));
        }

        let player = &self.player;
        let all_finite = player
            .spawn
            .iter()
            .chain(&player.direction)
            .chain(&player.plane)
            .chain([&player.move_speed, &player.rot_speed])
            .all(|v| v.is_finite());
        if !all_finite {
            return Err(SessionError::InvalidConfig(
                "player values must be finite".to_string(),
            ));
        }

        if self.session.inline_receive && self.session.strategy != SendStrategy::Periodic {
            tracing::warn!("inline_receive only applies to the periodic strategy, ignoring it");
        }

        Ok(())
    }
}
