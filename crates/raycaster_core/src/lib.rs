//! # RAYCASTER Core
//!
//! The pieces of the game that every frame touches, with no network code:
//!
//! - [`FrameBuffer`]: the double-buffered pixel surface. The render thread
//!   writes the front buffer, a presenter reads the back buffer.
//! - [`LocalPlayerState`]: position, facing and camera plane of the local
//!   player, mutated only through the move/turn entry points.
//! - [`Keys`]: the key mask an input collaborator hands to the frame loop.
//! - [`FrameClock`]: frame time measurement and FPS averaging.
//!
//! ## Example
//!
//! ```rust,ignore
//! use raycaster_core::FrameBuffer;
//!
//! let fb = FrameBuffer::new(640, 480);
//! fb.draw_vertical_span(10, 0, 479, 0x00FF_0000);
//! fb.swap();
//! let stable = fb.back_buffer();
//! assert_eq!(stable[10], 0x00FF_0000);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod framebuffer;
pub mod input;
pub mod player;
pub mod stats;

pub use framebuffer::{
    BackBufferGuard, Color, FrameBuffer, FrameWriter, Texture, TextureSampler, TexturedSpan,
};
pub use input::Keys;
pub use player::{LocalPlayerState, OpenField, Vec2, Walkable};
pub use stats::{FrameClock, FrameStats, RollingAverage};
