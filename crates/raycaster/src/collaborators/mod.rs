//! # Collaborator Seams
//!
//! The session drives the frame but owns none of the projection math, the
//! window or the input devices. They plug in through these traits:
//!
//! ```text
//! InputSource ──keys──> Session ──player + peers──> Renderer ──> front buffer
//!                          │
//!                        swap()
//!                          ▼
//!                     back buffer ──> Presenter
//! ```
//!
//! [`headless`] has implementations that need no window, used by the
//! `peer_node` binary and the tests.

pub mod headless;

use raycaster_core::{Color, FrameBuffer, Keys, LocalPlayerState};
use raycaster_networking::PositionsView;

/// Draws one frame into the front buffer.
pub trait Renderer {
    /// Renders the world as seen by `player`, plus every peer in `peers`.
    ///
    /// `peers` holds the position store lock: the receive task waits until
    /// this returns.
    fn render(&mut self, target: &FrameBuffer, player: &LocalPlayerState, peers: &PositionsView<'_>);
}

/// Shows the stable frame after a swap.
pub trait Presenter {
    /// Presents `frame`, `width * height` pixels in row-major order.
    fn present(&mut self, frame: &[Color], width: usize, height: usize);
}

/// Reports which keys are held.
pub trait InputSource {
    /// Polls the key state once per frame.
    fn poll(&mut self) -> Keys;
}
