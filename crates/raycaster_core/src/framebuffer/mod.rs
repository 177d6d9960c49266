//! # Double-Buffered Frame Surface
//!
//! ## The Problem
//!
//! ```text
//! Render thread:    WRITE pixels for frame N
//! Presenter:        READ pixels to put on screen
//!
//! Without synchronization: presenter shows half of frame N, half of N-1
//! ```
//!
//! ## The Solution: Front/Back Swap
//!
//! ```text
//! Frame N:
//!   Renderer writes FRONT
//!   Presenter reads BACK (frame N-1, complete)
//!
//! swap():
//!   FRONT <-> BACK (vectors exchanged, nothing reallocated)
//!
//! Frame N+1:
//!   Renderer writes FRONT (old back, stale content, overwritten)
//!   Presenter reads BACK (frame N, complete)
//! ```
//!
//! Each side has its own lock, so writing the front never waits for a
//! presenter reading the back. Only `swap()` takes both.

mod double_buffer;
mod texture;

pub use double_buffer::{BackBufferGuard, Color, FrameBuffer, FrameWriter};
pub use texture::{Texture, TextureSampler, TexturedSpan, DARKEN_MASK};
